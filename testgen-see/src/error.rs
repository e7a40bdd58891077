#![forbid(unsafe_code)]

use miette::Diagnostic;
use testgen_ast::SymVarId;
use thiserror::Error;

/// Failure reported by a function-registry implementation.
#[derive(Debug, Error, Diagnostic)]
#[error("dispatch error: {message}")]
#[diagnostic(code(testgen::see::dispatch))]
pub struct DispatchError {
    pub message: String,
}

impl DispatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ExecError {
    #[error("unknown function `{name}`")]
    #[diagnostic(code(testgen::see::unknown_function))]
    UnknownFunction { name: String },

    #[error("`{target} := {call}` depends on unresolved symbolic inputs")]
    #[diagnostic(
        code(testgen::see::not_ready),
        help("API calls are executed concretely; pin the inputs they depend on first")
    )]
    NotReady {
        target: String,
        call: String,
        pending: Vec<SymVarId>,
    },

    #[error("variable `{name}` is read before it is bound")]
    #[diagnostic(code(testgen::see::unbound))]
    Unbound { name: String },

    #[error("call to `{name}` failed")]
    #[diagnostic(code(testgen::see::dispatch_failed))]
    Dispatch {
        name: String,
        #[source]
        #[diagnostic_source]
        source: DispatchError,
    },
}
