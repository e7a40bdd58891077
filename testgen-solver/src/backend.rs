#![forbid(unsafe_code)]

use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::SolverError;
use crate::bounded::BoundedBackend;
use crate::cli::Z3Cli;
use crate::formula::{Formula, SolverVar};
use crate::model::Model;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckResult {
    Sat,
    Unsat,
    Unknown(String),
}

/// Incremental SMT surface: assert formulas, check, read a model.
pub trait SmtBackend {
    fn name(&self) -> &'static str;

    /// Drops every assertion.
    fn reset(&mut self);

    fn assert(&mut self, formula: &Formula) -> Result<(), SolverError>;

    fn check_sat(&mut self) -> Result<CheckResult, SolverError>;

    /// Values for `vars` from the last satisfiable check. Variables the
    /// assertions leave unconstrained get the completion value 0.
    fn model(&mut self, vars: &[SolverVar]) -> Result<Model, SolverError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Z3 through its native API when compiled with the `z3` feature,
    /// otherwise the `z3` executable as a subprocess.
    #[default]
    Z3,
    /// Always the `z3` executable as a subprocess.
    #[serde(rename = "z3-cli")]
    Z3Cli,
    /// Enumeration over narrowed ranges. Incomplete: it answers `Unknown`
    /// when no model lies inside its search window.
    Bounded,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Z3 => "z3",
            BackendKind::Z3Cli => "z3-cli",
            BackendKind::Bounded => "bounded",
        }
    }
}

/// `[solver]` section of the configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub backend: BackendKind,
    /// Z3 executable for the subprocess backend. Looked up on `PATH` when unset.
    pub z3_path: Option<PathBuf>,
    /// Per-query timeout for the subprocess backend; 0 disables it.
    pub timeout_ms: u64,
    /// Bounded backend: width of the search window around each range.
    pub bound: i64,
    /// Bounded backend: largest assignment space it will enumerate.
    pub max_candidates: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            z3_path: None,
            timeout_ms: 0,
            bound: 64,
            max_candidates: 2_000_000,
        }
    }
}

pub fn create_backend(cfg: &SolverConfig) -> Result<Box<dyn SmtBackend>, SolverError> {
    match cfg.backend {
        BackendKind::Z3 => native_or_cli(cfg),
        BackendKind::Z3Cli => Ok(Box::new(Z3Cli::from_config(cfg)?)),
        BackendKind::Bounded => Ok(Box::new(BoundedBackend::new(cfg.bound, cfg.max_candidates))),
    }
}

#[cfg(feature = "z3")]
fn native_or_cli(_cfg: &SolverConfig) -> Result<Box<dyn SmtBackend>, SolverError> {
    debug!("solver: using the native z3 backend");
    Ok(Box::new(crate::z3_backend::Z3Backend::new()))
}

#[cfg(not(feature = "z3"))]
fn native_or_cli(cfg: &SolverConfig) -> Result<Box<dyn SmtBackend>, SolverError> {
    debug!("solver: z3 not compiled in, using the subprocess backend");
    Ok(Box::new(Z3Cli::from_config(cfg)?))
}
