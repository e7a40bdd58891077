#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use testgen_ast::SymVarId;

/// Identity of a solver integer variable.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SolverVar {
    Sym(SymVarId),
    Named(String),
}

impl SolverVar {
    /// Deterministic name handed to the backend.
    pub fn name(&self) -> String {
        match self {
            SolverVar::Sym(id) => id.solver_name(),
            SolverVar::Named(n) => n.clone(),
        }
    }
}

impl fmt::Display for SolverVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sort {
    Int,
    Bool,
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sort::Int => "Int",
            Sort::Bool => "Bool",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Eq,
    Lt,
    Gt,
    And,
    Or,
    Not,
}

/// Quantifier-free integer arithmetic formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Formula {
    Int(i64),
    Bool(bool),
    Var(SolverVar),
    App(Op, Vec<Formula>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Formula {
    pub fn not(f: Formula) -> Formula {
        Formula::App(Op::Not, vec![f])
    }

    /// Right-nested conjunction; `true` when empty, the formula itself when single.
    pub fn conjoin(mut parts: Vec<Formula>) -> Formula {
        let Some(mut acc) = parts.pop() else {
            return Formula::Bool(true);
        };
        while let Some(f) = parts.pop() {
            acc = Formula::App(Op::And, vec![f, acc]);
        }
        acc
    }

    pub fn vars(&self) -> Vec<SolverVar> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut Vec<SolverVar>) {
        match self {
            Formula::Var(v) => {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            Formula::App(_, args) => {
                for a in args {
                    a.collect_vars(out);
                }
            }
            Formula::Int(_) | Formula::Bool(_) => {}
        }
    }

    /// Evaluates under `assignment`; unassigned variables read as 0.
    /// Returns `None` on ill-sorted applications.
    pub fn eval(&self, assignment: &BTreeMap<SolverVar, i64>) -> Option<Value> {
        match self {
            Formula::Int(n) => Some(Value::Int(*n)),
            Formula::Bool(b) => Some(Value::Bool(*b)),
            Formula::Var(v) => Some(Value::Int(assignment.get(v).copied().unwrap_or(0))),
            Formula::App(op, args) => {
                let vals = args
                    .iter()
                    .map(|a| a.eval(assignment))
                    .collect::<Option<Vec<_>>>()?;
                apply(*op, &vals)
            }
        }
    }
}

fn apply(op: Op, vals: &[Value]) -> Option<Value> {
    use Value::{Bool, Int};
    Some(match (op, vals) {
        (Op::Add, [Int(a), Int(b)]) => Int(a.wrapping_add(*b)),
        (Op::Sub, [Int(a), Int(b)]) => Int(a.wrapping_sub(*b)),
        (Op::Mul, [Int(a), Int(b)]) => Int(a.wrapping_mul(*b)),
        (Op::Eq, [a, b]) => Bool(a == b),
        (Op::Lt, [Int(a), Int(b)]) => Bool(a < b),
        (Op::Gt, [Int(a), Int(b)]) => Bool(a > b),
        (Op::And, [Bool(a), Bool(b)]) => Bool(*a && *b),
        (Op::Or, [Bool(a), Bool(b)]) => Bool(*a || *b),
        (Op::Not, [Bool(a)]) => Bool(!a),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x(n: u32) -> Formula {
        Formula::Var(SolverVar::Sym(SymVarId(n)))
    }

    #[test]
    fn conjoin_is_identity_for_one_and_true_for_none() {
        assert_eq!(Formula::conjoin(Vec::new()), Formula::Bool(true));
        assert_eq!(Formula::conjoin(vec![x(0)]), x(0));
        assert_eq!(
            Formula::conjoin(vec![Formula::Bool(true), Formula::Bool(false), x(1)]),
            Formula::App(
                Op::And,
                vec![Formula::Bool(true), Formula::App(Op::And, vec![Formula::Bool(false), x(1)])]
            )
        );
    }

    #[test]
    fn eval_reads_missing_vars_as_zero() {
        let f = Formula::App(Op::Eq, vec![Formula::App(Op::Add, vec![x(0), x(1)]), Formula::Int(4)]);
        let mut a = BTreeMap::new();
        a.insert(SolverVar::Sym(SymVarId(0)), 4);
        assert_eq!(f.eval(&a), Some(Value::Bool(true)));
        a.insert(SolverVar::Sym(SymVarId(1)), 1);
        assert_eq!(f.eval(&a), Some(Value::Bool(false)));
        assert_eq!(Formula::App(Op::Not, vec![Formula::Int(1)]).eval(&a), None);
    }

    #[test]
    fn vars_are_listed_once_in_first_seen_order() {
        let f = Formula::App(Op::Add, vec![x(2), Formula::App(Op::Mul, vec![x(0), x(2)])]);
        assert_eq!(
            f.vars(),
            vec![SolverVar::Sym(SymVarId(2)), SolverVar::Sym(SymVarId(0))]
        );
    }
}
