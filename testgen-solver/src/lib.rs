#![forbid(unsafe_code)]

//! Translation of symbolic path constraints into integer-arithmetic formulas
//! and satisfiability queries against a pluggable SMT backend.

mod backend;
mod bounded;
mod cli;
mod error;
mod formula;
mod model;
pub mod rules;
mod translate;
#[cfg(feature = "z3")]
mod z3_backend;

use log::{debug, info};
use testgen_ast::Expr;

pub use backend::{BackendKind, CheckResult, SmtBackend, SolverConfig, create_backend};
pub use bounded::BoundedBackend;
pub use cli::Z3Cli;
pub use error::SolverError;
pub use formula::{Formula, Op, SolverVar, Sort, Value};
pub use model::{Model, SolveOutcome};
pub use translate::Translator;
#[cfg(feature = "z3")]
pub use z3_backend::Z3Backend;

/// Solves conjunctions of path-constraint expressions.
pub struct SolverBridge {
    backend: Box<dyn SmtBackend>,
}

impl SolverBridge {
    pub fn new(backend: Box<dyn SmtBackend>) -> Self {
        Self { backend }
    }

    pub fn from_config(cfg: &SolverConfig) -> Result<Self, SolverError> {
        Ok(Self::new(create_backend(cfg)?))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Checks the conjunction of `constraints`. On SAT the model holds a
    /// value for every variable the constraints mention.
    pub fn solve(&mut self, constraints: &[Expr]) -> Result<SolveOutcome, SolverError> {
        let mut translator = Translator::new();
        let parts = constraints
            .iter()
            .map(|c| translator.translate_constraint(c))
            .collect::<Result<Vec<_>, _>>()?;
        let goal = Formula::conjoin(parts);

        self.backend.reset();
        self.backend.assert(&goal)?;
        let outcome = match self.backend.check_sat()? {
            CheckResult::Sat => SolveOutcome::Sat(self.backend.model(translator.vars())?),
            CheckResult::Unsat => SolveOutcome::Unsat,
            CheckResult::Unknown(reason) => return Err(SolverError::Unknown { reason }),
        };
        info!(
            "solver[{}]: {} constraints over {} vars: {}",
            self.backend.name(),
            constraints.len(),
            translator.vars().len(),
            if outcome.is_sat() { "sat" } else { "unsat" }
        );
        if let SolveOutcome::Sat(model) = &outcome {
            for (var, value) in model.iter() {
                debug!("solver: {var} = {value}");
            }
        }
        Ok(outcome)
    }
}

/// Translates a single expression with a fresh translator.
pub fn translate(expr: &Expr) -> Result<Formula, SolverError> {
    Translator::new().translate(expr)
}
