#![forbid(unsafe_code)]

use std::collections::HashMap;

use log::debug;
use z3::{
    Config, Context, SatResult, Solver,
    ast::{Ast, Bool, Int},
};

use crate::backend::{CheckResult, SmtBackend};
use crate::formula::{Formula, Op, SolverVar};
use crate::model::Model;
use crate::SolverError;

enum Value<'ctx> {
    Int(Int<'ctx>),
    Bool(Bool<'ctx>),
}

pub struct Z3Backend {
    ctx: &'static Context,
    solver: Solver<'static>,
    consts: HashMap<SolverVar, Int<'static>>,
}

impl Z3Backend {
    pub fn new() -> Self {
        let mut cfg = Config::new();
        cfg.set_model_generation(true);
        // Leaked so the solver and its terms can be held without a
        // self-referential struct.
        let ctx: &'static Context = Box::leak(Box::new(Context::new(&cfg)));
        Self {
            ctx,
            solver: Solver::new(ctx),
            consts: HashMap::new(),
        }
    }

    fn int_const(&mut self, var: &SolverVar) -> Int<'static> {
        let ctx = self.ctx;
        self.consts
            .entry(var.clone())
            .or_insert_with(|| Int::new_const(ctx, var.name()))
            .clone()
    }

    fn lower(&mut self, f: &Formula) -> Result<Value<'static>, SolverError> {
        Ok(match f {
            Formula::Int(n) => Value::Int(Int::from_i64(self.ctx, *n)),
            Formula::Bool(b) => Value::Bool(Bool::from_bool(self.ctx, *b)),
            Formula::Var(v) => Value::Int(self.int_const(v)),
            Formula::App(op, args) => {
                let args = args.iter().map(|a| self.lower(a)).collect::<Result<Vec<_>, _>>()?;
                self.apply(*op, args)?
            }
        })
    }

    fn apply(&self, op: Op, args: Vec<Value<'static>>) -> Result<Value<'static>, SolverError> {
        let ctx = self.ctx;
        Ok(match (op, args.as_slice()) {
            (Op::Add, [Value::Int(a), Value::Int(b)]) => Value::Int(Int::add(ctx, &[a, b])),
            (Op::Sub, [Value::Int(a), Value::Int(b)]) => Value::Int(Int::sub(ctx, &[a, b])),
            (Op::Mul, [Value::Int(a), Value::Int(b)]) => Value::Int(Int::mul(ctx, &[a, b])),
            (Op::Eq, [Value::Int(a), Value::Int(b)]) => Value::Bool(a._eq(b)),
            (Op::Eq, [Value::Bool(a), Value::Bool(b)]) => Value::Bool(a._eq(b)),
            (Op::Lt, [Value::Int(a), Value::Int(b)]) => Value::Bool(a.lt(b)),
            (Op::Gt, [Value::Int(a), Value::Int(b)]) => Value::Bool(a.gt(b)),
            (Op::And, [Value::Bool(a), Value::Bool(b)]) => Value::Bool(Bool::and(ctx, &[a, b])),
            (Op::Or, [Value::Bool(a), Value::Bool(b)]) => Value::Bool(Bool::or(ctx, &[a, b])),
            (Op::Not, [Value::Bool(a)]) => Value::Bool(a.not()),
            (op, _) => {
                return Err(SolverError::Backend {
                    backend: "z3",
                    message: format!("ill-sorted application of {op:?}"),
                });
            }
        })
    }
}

impl Default for Z3Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtBackend for Z3Backend {
    fn name(&self) -> &'static str {
        "z3"
    }

    fn reset(&mut self) {
        self.solver.reset();
    }

    fn assert(&mut self, formula: &Formula) -> Result<(), SolverError> {
        match self.lower(formula)? {
            Value::Bool(b) => {
                self.solver.assert(&b);
                Ok(())
            }
            Value::Int(_) => Err(SolverError::Backend {
                backend: "z3",
                message: "asserted formula is not boolean".to_string(),
            }),
        }
    }

    fn check_sat(&mut self) -> Result<CheckResult, SolverError> {
        let result = match self.solver.check() {
            SatResult::Sat => CheckResult::Sat,
            SatResult::Unsat => CheckResult::Unsat,
            SatResult::Unknown => CheckResult::Unknown(
                self.solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "no reason given".to_string()),
            ),
        };
        debug!("z3: {result:?}");
        Ok(result)
    }

    fn model(&mut self, vars: &[SolverVar]) -> Result<Model, SolverError> {
        let model = self.solver.get_model().ok_or_else(|| SolverError::Backend {
            backend: "z3",
            message: "no model available".to_string(),
        })?;
        let mut out = Model::new();
        for var in vars {
            let c = self.int_const(var);
            let value = model
                .eval(&c, true)
                .and_then(|v| v.as_i64())
                .ok_or_else(|| SolverError::NonInteger { var: var.name() })?;
            out.insert(var.clone(), value);
        }
        Ok(out)
    }
}
