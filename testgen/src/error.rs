#![forbid(unsafe_code)]

use std::path::PathBuf;

use miette::Diagnostic;
use testgen_atc::AtcError;
use testgen_see::ExecError;
use testgen_solver::SolverError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TesterError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Solver(#[from] SolverError),

    #[error("no concrete inputs satisfy the path constraint ({constraints} assumptions)")]
    #[diagnostic(
        code(testgen::ctc::infeasible),
        help("the assumed preconditions contradict each other along this call sequence; try another sequence")
    )]
    Infeasible { constraints: usize },

    #[error("every input pinned for a symbolic call was ruled out later ({attempts} attempts)")]
    #[diagnostic(
        code(testgen::ctc::pin_conflict),
        help("a satisfying choice may still exist; raise `generation.pin_retries` or use the z3 backend")
    )]
    PinConflict { attempts: u32 },
}

impl TesterError {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, TesterError::Infeasible { .. })
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(testgen::config))]
pub struct ConfigError {
    pub message: String,
}

#[derive(Debug, Error, Diagnostic)]
pub enum DriverError {
    #[error("failed to load specification {}: {message}", .path.display())]
    #[diagnostic(code(testgen::driver::spec))]
    Spec { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Generation(#[from] AtcError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tester(#[from] TesterError),
}

impl DriverError {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, DriverError::Tester(e) if e.is_infeasible())
    }
}
