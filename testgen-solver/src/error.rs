#![forbid(unsafe_code)]

use miette::Diagnostic;
use thiserror::Error;

use crate::formula::Sort;

#[derive(Debug, Error, Diagnostic)]
pub enum SolverError {
    #[error("unsupported construct for integer arithmetic: {construct}")]
    #[diagnostic(code(testgen::solver::unsupported))]
    Unsupported { construct: String },

    #[error("`{op}` expects {expected} arguments, got {found}")]
    #[diagnostic(code(testgen::solver::arity))]
    Arity {
        op: String,
        expected: usize,
        found: usize,
    },

    #[error("`{op}` expects {expected} operands, got {found}")]
    #[diagnostic(code(testgen::solver::sort_mismatch))]
    SortMismatch { op: String, expected: Sort, found: Sort },

    #[error("{backend} backend failed: {message}")]
    #[diagnostic(code(testgen::solver::backend))]
    Backend { backend: &'static str, message: String },

    #[error("solver returned unknown: {reason}")]
    #[diagnostic(code(testgen::solver::unknown))]
    Unknown { reason: String },

    #[error("model value for `{var}` is not an integer numeral")]
    #[diagnostic(code(testgen::solver::non_integer))]
    NonInteger { var: String },

    #[error("{vars} unfixed variables cannot share a budget of {budget} candidates (bound {bound})")]
    #[diagnostic(
        code(testgen::solver::search_budget),
        help("raise `solver.max_candidates` or use the z3 backend")
    )]
    SearchBudgetExhausted { vars: usize, bound: i64, budget: u64 },

    #[error("`{backend}` backend is not available")]
    #[diagnostic(
        code(testgen::solver::unavailable),
        help("install z3, set `solver.z3_path`, or rebuild with `--features z3`")
    )]
    BackendUnavailable { backend: String },
}
