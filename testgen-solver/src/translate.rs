#![forbid(unsafe_code)]

use log::trace;
use testgen_ast::Expr;

use crate::formula::{Formula, Op, SolverVar, Sort};
use crate::rules::{self, ANY};
use crate::SolverError;

/// Maps expressions onto formulas, remembering every solver variable it
/// introduces in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct Translator {
    vars: Vec<SolverVar>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vars(&self) -> &[SolverVar] {
        &self.vars
    }

    pub fn translate(&mut self, expr: &Expr) -> Result<Formula, SolverError> {
        self.lower(expr).map(|(f, _)| f)
    }

    /// Translates one path-constraint entry. An integer-valued entry `n`
    /// stands for `n != 0`.
    pub fn translate_constraint(&mut self, expr: &Expr) -> Result<Formula, SolverError> {
        let (f, sort) = self.lower(expr)?;
        Ok(match sort {
            Sort::Bool => f,
            Sort::Int => Formula::not(Formula::App(Op::Eq, vec![f, Formula::Int(0)])),
        })
    }

    fn var(&mut self, v: SolverVar) -> (Formula, Sort) {
        if !self.vars.contains(&v) {
            trace!("solver: declare {v}");
            self.vars.push(v.clone());
        }
        (Formula::Var(v), Sort::Int)
    }

    fn lower(&mut self, expr: &Expr) -> Result<(Formula, Sort), SolverError> {
        match expr {
            Expr::Num(n) => Ok((Formula::Int(*n), Sort::Int)),
            Expr::Bool(b) => Ok((Formula::Bool(*b), Sort::Bool)),
            Expr::SymVar(id) => Ok(self.var(SolverVar::Sym(*id))),
            Expr::Var(name) => Ok(self.var(SolverVar::Named(name.clone()))),
            Expr::Call { name, args } if name == ANY => {
                for arg in args {
                    self.register(arg);
                }
                Ok((Formula::Bool(true), Sort::Bool))
            }
            Expr::Call { name, args } => {
                let rule = rules::lookup(name).ok_or_else(|| SolverError::Unsupported {
                    construct: format!("function `{name}`"),
                })?;
                if args.len() != rule.arity {
                    return Err(SolverError::Arity {
                        op: name.clone(),
                        expected: rule.arity,
                        found: args.len(),
                    });
                }
                let mut lowered = Vec::with_capacity(args.len());
                let mut first_sort = None;
                for arg in args {
                    let (f, sort) = self.lower(arg)?;
                    let expected = rule.signature.operand().or(first_sort).unwrap_or(sort);
                    if sort != expected {
                        return Err(SolverError::SortMismatch {
                            op: name.clone(),
                            expected,
                            found: sort,
                        });
                    }
                    first_sort.get_or_insert(sort);
                    lowered.push(f);
                }
                Ok((Formula::App(rule.op, lowered), rule.signature.result()))
            }
            Expr::Str(_) => Err(unsupported("string literal", expr)),
            Expr::Set(_) => Err(unsupported("set", expr)),
            Expr::Map(_) => Err(unsupported("map", expr)),
            Expr::Tuple(_) => Err(unsupported("tuple", expr)),
        }
    }

    /// Declares every variable below `expr` without constraining it.
    fn register(&mut self, expr: &Expr) {
        match expr {
            Expr::SymVar(id) => {
                self.var(SolverVar::Sym(*id));
            }
            Expr::Var(name) => {
                self.var(SolverVar::Named(name.clone()));
            }
            other => {
                for child in other.children() {
                    self.register(child);
                }
            }
        }
    }
}

fn unsupported(kind: &str, expr: &Expr) -> SolverError {
    SolverError::Unsupported {
        construct: format!("{kind} `{expr}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testgen_ast::SymVarId;

    fn sym(n: u32) -> Expr {
        Expr::SymVar(SymVarId(n))
    }

    #[test]
    fn the_same_symvar_maps_to_one_solver_variable() {
        let mut t = Translator::new();
        let a = t.translate(&sym(3)).expect("first");
        let b = t.translate(&sym(3)).expect("second");
        assert_eq!(a, b);
        assert_eq!(t.vars(), &[SolverVar::Sym(SymVarId(3))]);
    }

    #[test]
    fn builtins_follow_the_rule_table() {
        let mut t = Translator::new();
        let e = Expr::binary(
            "Or",
            Expr::binary("Lt", Expr::binary("Sub", sym(0), Expr::Num(1)), Expr::var("n")),
            Expr::call("Not", vec![Expr::binary("Eq", sym(1), sym(0))]),
        );
        let f = t.translate(&e).expect("translate");
        let x0 = Formula::Var(SolverVar::Sym(SymVarId(0)));
        let x1 = Formula::Var(SolverVar::Sym(SymVarId(1)));
        let n = Formula::Var(SolverVar::Named("n".into()));
        assert_eq!(
            f,
            Formula::App(
                Op::Or,
                vec![
                    Formula::App(Op::Lt, vec![Formula::App(Op::Sub, vec![x0.clone(), Formula::Int(1)]), n]),
                    Formula::not(Formula::App(Op::Eq, vec![x1, x0])),
                ]
            )
        );
        assert_eq!(t.vars().len(), 3);
    }

    #[test]
    fn unsupported_constructs_are_rejected() {
        let mut t = Translator::new();
        for e in [
            Expr::Str("s".into()),
            Expr::Set(Vec::new()),
            Expr::Tuple(vec![Expr::Num(1)]),
            Expr::Map(Vec::new()),
            Expr::call("Union", vec![sym(0), sym(1)]),
        ] {
            assert!(matches!(t.translate(&e), Err(SolverError::Unsupported { .. })), "{e}");
        }
    }

    #[test]
    fn arity_and_sorts_are_checked() {
        let mut t = Translator::new();
        let e = Expr::call("Add", vec![sym(0)]);
        assert!(matches!(t.translate(&e), Err(SolverError::Arity { expected: 2, found: 1, .. })));

        let e = Expr::binary("And", sym(0), Expr::Bool(true));
        assert!(matches!(
            t.translate(&e),
            Err(SolverError::SortMismatch { expected: Sort::Bool, found: Sort::Int, .. })
        ));

        let e = Expr::binary("Eq", Expr::Bool(true), Expr::Num(1));
        assert!(matches!(t.translate(&e), Err(SolverError::SortMismatch { .. })));
    }

    #[test]
    fn any_declares_without_constraining() {
        let mut t = Translator::new();
        let e = Expr::binary("And", Expr::binary("Lt", sym(0), Expr::Num(10)), Expr::call("Any", vec![sym(1)]));
        let f = t.translate_constraint(&e).expect("translate");
        assert_eq!(t.vars().len(), 2);
        assert!(matches!(f, Formula::App(Op::And, ref args) if args[1] == Formula::Bool(true)));
    }

    #[test]
    fn integer_constraints_mean_nonzero() {
        let mut t = Translator::new();
        let f = t.translate_constraint(&Expr::Num(1)).expect("translate");
        assert_eq!(f, Formula::not(Formula::App(Op::Eq, vec![Formula::Int(1), Formula::Int(0)])));
    }
}
