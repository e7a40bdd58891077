#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use log::{debug, info};
use testgen_ast::{Expr, Program, Stmt, SymVarId};
use testgen_see::{Engine, ExecError, FunctionRegistry, Obligation, ValueEnv};
use testgen_solver::{Model, SolveOutcome, SolverBridge};

use crate::TesterError;

/// Input name to the concrete value it must take.
pub type Seeds = BTreeMap<String, i64>;

/// A concrete test case and what it was derived from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctc {
    pub program: Program,
    /// Concrete value of each `input()` statement, in program order.
    pub inputs: Vec<(String, i64)>,
    /// Path constraint the values satisfy, pins included.
    pub path_constraint: Vec<Expr>,
    pub obligations: Vec<Obligation>,
}

/// Drives symbolic execution and solving to concretize an ATC.
pub struct Tester<'r> {
    registry: &'r dyn FunctionRegistry,
    solver: SolverBridge,
    pin_retries: u32,
}

/// Default number of extra runs after a pin turns out to be unsatisfiable.
pub const DEFAULT_PIN_RETRIES: u32 = 32;

enum Attempt<'r> {
    Sat(Engine<'r>, Model),
    /// UNSAT once the listed symbols had been pinned to these values.
    Unsat {
        pins: Vec<(SymVarId, i64)>,
        constraints: usize,
    },
}

impl<'r> Tester<'r> {
    pub fn new(registry: &'r dyn FunctionRegistry, solver: SolverBridge) -> Self {
        Self {
            registry,
            solver,
            pin_retries: DEFAULT_PIN_RETRIES,
        }
    }

    pub fn with_pin_retries(mut self, retries: u32) -> Self {
        self.pin_retries = retries;
        self
    }

    /// Executes `atc` from `env`, solves its path constraint and replaces
    /// every `input()` with a literal from the model.
    ///
    /// A registry call whose arguments are still symbolic is resolved by
    /// solving the constraint collected so far and pinning the inputs it
    /// depends on. When a later constraint rules the pinned values out, the
    /// run starts over with that combination excluded, up to the configured
    /// number of retries ([`TesterError::PinConflict`] after that). UNSAT
    /// that no pin contributed to is [`TesterError::Infeasible`].
    pub fn generate_ctc(&mut self, atc: Program, seeds: &Seeds, env: ValueEnv) -> Result<Ctc, TesterError> {
        let mut excluded: Vec<Expr> = Vec::new();
        for attempt in 0..=self.pin_retries {
            match self.attempt(&atc, seeds, env.clone(), &excluded)? {
                Attempt::Sat(engine, model) => {
                    if attempt > 0 {
                        info!("ctc: pins resolved after {attempt} retries");
                    }
                    return Ok(concretize(atc, engine, &model));
                }
                Attempt::Unsat { pins, constraints } if pins.is_empty() => {
                    return Err(if excluded.is_empty() {
                        TesterError::Infeasible { constraints }
                    } else {
                        TesterError::PinConflict { attempts: attempt + 1 }
                    });
                }
                Attempt::Unsat { pins, .. } => {
                    debug!("ctc: pins {pins:?} lead to UNSAT, excluding them");
                    excluded.push(exclude(&pins));
                }
            }
        }
        Err(TesterError::PinConflict {
            attempts: self.pin_retries + 1,
        })
    }

    fn attempt(
        &mut self,
        atc: &Program,
        seeds: &Seeds,
        env: ValueEnv,
        excluded: &[Expr],
    ) -> Result<Attempt<'r>, TesterError> {
        let mut engine = Engine::new(self.registry).with_env(env);
        let mut pins: Vec<(SymVarId, i64)> = Vec::new();

        for stmt in &atc.stmts {
            match engine.step(stmt) {
                Ok(()) => {}
                Err(ExecError::NotReady { target, pending, .. }) => {
                    debug!("ctc: resolving {} inputs before `{target}`", pending.len());
                    let mut query = engine.path_constraint().to_vec();
                    query.extend_from_slice(excluded);
                    let SolveOutcome::Sat(model) = self.solver.solve(&query)? else {
                        return Ok(Attempt::Unsat {
                            pins,
                            constraints: engine.path_constraint().len(),
                        });
                    };
                    for id in &pending {
                        let value = model.get_sym(*id).unwrap_or(0);
                        engine.pin(*id, value);
                        pins.push((*id, value));
                    }
                    engine.step(stmt)?;
                }
                Err(e) => return Err(e.into()),
            }

            if let Some(target) = stmt.input_target() {
                let sym = match engine.lookup(target) {
                    Some(Expr::SymVar(id)) => Some(*id),
                    _ => None,
                };
                if let Some((id, value)) = sym.zip(seeds.get(target)) {
                    engine.pin(id, *value);
                }
            }
        }

        Ok(match self.solver.solve(engine.path_constraint())? {
            SolveOutcome::Sat(model) => Attempt::Sat(engine, model),
            SolveOutcome::Unsat => Attempt::Unsat {
                pins,
                constraints: engine.path_constraint().len(),
            },
        })
    }
}

/// `Not(And(X = v, ...))` over the given pins.
fn exclude(pins: &[(SymVarId, i64)]) -> Expr {
    let mut eqs = pins
        .iter()
        .rev()
        .map(|(id, v)| Expr::binary("Eq", Expr::SymVar(*id), Expr::Num(*v)));
    let last = eqs.next().unwrap_or(Expr::Bool(true));
    let all = eqs.fold(last, |acc, eq| Expr::binary("And", eq, acc));
    Expr::call("Not", vec![all])
}

fn concretize(atc: Program, engine: Engine<'_>, model: &Model) -> Ctc {
    let values: Vec<i64> = engine
        .inputs()
        .iter()
        .map(|(_, id)| model.get_sym(*id).unwrap_or(0))
        .collect();

    let mut next = values.iter();
    let mut inputs = Vec::with_capacity(values.len());
    let stmts = atc
        .stmts
        .into_iter()
        .map(|stmt| match stmt {
            Stmt::Assign { target, expr } if expr.is_input() => {
                let value = next.next().copied().unwrap_or(0);
                inputs.push((target.clone(), value));
                Stmt::assign(target, Expr::Num(value))
            }
            other => other,
        })
        .collect();

    info!("ctc: {} inputs concretized", inputs.len());
    let run = engine.into_execution();
    Ctc {
        program: Program::new(stmts),
        inputs,
        path_constraint: run.path_constraint,
        obligations: run.obligations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;
    use testgen_see::FnRegistry;
    use testgen_solver::BoundedBackend;

    fn bounded() -> SolverBridge {
        SolverBridge::new(Box::new(BoundedBackend::new(32, 100_000)))
    }

    #[test]
    fn inputs_become_literals_in_place() {
        let atc = Program::new(vec![
            Stmt::input("a"),
            Stmt::Assume(Expr::binary("Gt", Expr::var("a"), Expr::Num(2))),
            Stmt::Assert(Expr::Bool(true)),
        ]);
        let mut tester = Tester::new(&(), bounded());
        let ctc = tester.generate_ctc(atc, &Seeds::new(), ValueEnv::new()).expect("ctc");
        assert_eq!(ctc.program.stmts[0], Stmt::assign("a", Expr::Num(3)));
        assert_eq!(ctc.program.len(), 3);
        assert_eq!(ctc.inputs, vec![("a".to_string(), 3)]);
        assert_eq!(ctc.obligations.len(), 1);
    }

    #[test]
    fn unconstrained_inputs_default_to_zero() {
        let atc = Program::new(vec![Stmt::input("a"), Stmt::input("b")]);
        let mut tester = Tester::new(&(), bounded());
        let ctc = tester.generate_ctc(atc, &Seeds::new(), ValueEnv::new()).expect("ctc");
        assert_eq!(ctc.inputs, vec![("a".to_string(), 0), ("b".to_string(), 0)]);
    }

    #[test]
    fn seeds_pin_inputs() {
        let atc = Program::new(vec![
            Stmt::input("a"),
            Stmt::Assume(Expr::binary("Gt", Expr::var("a"), Expr::Num(0))),
        ]);
        let seeds: Seeds = [("a".to_string(), 17)].into_iter().collect();
        let mut tester = Tester::new(&(), bounded());
        let ctc = tester.generate_ctc(atc, &seeds, ValueEnv::new()).expect("ctc");
        assert_eq!(ctc.inputs, vec![("a".to_string(), 17)]);
    }

    #[test]
    fn contradicting_seed_is_infeasible() {
        let atc = Program::new(vec![
            Stmt::input("a"),
            Stmt::Assume(Expr::binary("Gt", Expr::var("a"), Expr::Num(0))),
        ]);
        let seeds: Seeds = [("a".to_string(), -4)].into_iter().collect();
        let mut tester = Tester::new(&(), bounded());
        let err = tester.generate_ctc(atc, &seeds, ValueEnv::new()).expect_err("infeasible");
        assert!(err.is_infeasible());
    }

    #[test]
    fn symbolic_calls_are_executed_with_the_pinned_values() {
        let reg = FnRegistry::new().with("double", |args| {
            Ok(Expr::Num(2 * testgen_see::int_arg("double", args, 0)?))
        });
        let atc = Program::new(vec![
            Stmt::input("a"),
            Stmt::Assume(Expr::binary("Gt", Expr::var("a"), Expr::Num(4))),
            Stmt::assign("r", Expr::call("double", vec![Expr::var("a")])),
            Stmt::Assert(Expr::binary("Eq", Expr::var("r"), Expr::binary("Add", Expr::var("a"), Expr::var("a")))),
        ]);
        let mut tester = Tester::new(&reg, bounded());
        let ctc = tester.generate_ctc(atc, &Seeds::new(), ValueEnv::new()).expect("ctc");

        assert_eq!(ctc.inputs, vec![("a".to_string(), 5)]);
        assert_eq!(
            ctc.program.stmts[2],
            Stmt::assign("r", Expr::call("double", vec![Expr::var("a")]))
        );
        assert_eq!(ctc.obligations[0].bound, Expr::binary(
            "Eq",
            Expr::Num(10),
            Expr::binary("Add", Expr::Num(5), Expr::Num(5))
        ));
    }

    #[test]
    fn initial_environment_is_visible() {
        let mut env = ValueEnv::new();
        env.insert("limit".into(), Expr::Num(-3));
        let atc = Program::new(vec![
            Stmt::input("a"),
            Stmt::Assume(Expr::binary("Lt", Expr::var("a"), Expr::var("limit"))),
        ]);
        let mut tester = Tester::new(&(), bounded());
        let ctc = tester.generate_ctc(atc, &Seeds::new(), env).expect("ctc");
        assert_eq!(ctc.inputs, vec![("a".to_string(), -4)]);
    }

    fn set_then_get() -> Program {
        Program::new(vec![
            Stmt::input("n"),
            Stmt::Assume(Expr::binary("Gt", Expr::var("n"), Expr::Num(0))),
            Stmt::assign("y", Expr::call("set_y", vec![Expr::var("n")])),
            Stmt::Assume(Expr::binary("Gt", Expr::var("y"), Expr::Num(10))),
        ])
    }

    fn setter() -> FnRegistry {
        FnRegistry::new().with("set_y", |args| Ok(Expr::Num(testgen_see::int_arg("set_y", args, 0)?)))
    }

    #[test]
    fn a_pin_ruled_out_later_is_retried_with_other_values() {
        let reg = setter();
        let mut tester = Tester::new(&reg, bounded());
        let ctc = tester.generate_ctc(set_then_get(), &Seeds::new(), ValueEnv::new()).expect("ctc");
        assert_eq!(ctc.inputs, vec![("n".to_string(), 11)]);
    }

    #[test]
    fn exhausted_pin_retries_are_a_conflict_not_infeasibility() {
        let reg = setter();
        let mut tester = Tester::new(&reg, bounded()).with_pin_retries(3);
        let err = tester
            .generate_ctc(set_then_get(), &Seeds::new(), ValueEnv::new())
            .expect_err("conflict");
        assert!(matches!(err, TesterError::PinConflict { attempts: 4 }), "{err}");
        assert!(!err.is_infeasible());
    }

    #[test]
    fn exclusion_clause_negates_every_pin() {
        let clause = exclude(&[(SymVarId(0), 1), (SymVarId(3), -2)]);
        assert_eq!(
            clause,
            Expr::call(
                "Not",
                vec![Expr::binary(
                    "And",
                    Expr::binary("Eq", Expr::SymVar(SymVarId(0)), Expr::Num(1)),
                    Expr::binary("Eq", Expr::SymVar(SymVarId(3)), Expr::Num(-2)),
                )]
            )
        );
    }
}
