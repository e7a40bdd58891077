#![forbid(unsafe_code)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AtcError {
    #[error("no API block named `{name}`")]
    #[diagnostic(code(testgen::atc::unknown_api))]
    UnknownApi { name: String },

    #[error("no local symbol table for block {block} (`{api}`)")]
    #[diagnostic(
        code(testgen::atc::missing_symbol_table),
        help("build tables with `LocalScopes::from_call_params` or supply one per block")
    )]
    MissingSymbolTable { api: String, block: usize },

    #[error("variable `{var}` in `{api}` is neither a global nor a local of the block")]
    #[diagnostic(code(testgen::atc::unresolved_variable))]
    UnresolvedVariable { api: String, var: String },

    #[error("response of `{api}` does not name a variable: {found}")]
    #[diagnostic(code(testgen::atc::invalid_response_target))]
    InvalidResponseTarget { api: String, found: String },
}
