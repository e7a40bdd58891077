#![forbid(unsafe_code)]

//! Symbolic execution of abstract test cases.
//!
//! Inputs become fresh symbolic variables, builtin operators build expression
//! trees, `assume` extends the path constraint and calls into the function
//! registry run concretely once their arguments are ready.

mod builtins;
mod engine;
mod error;
mod registry;

pub use builtins::{BUILTINS, fold, is_builtin};
pub use engine::{Engine, Execution, Obligation, ValueEnv, execute};
pub use error::{DispatchError, ExecError};
pub use registry::{FnRegistry, FunctionRegistry, int_arg};
