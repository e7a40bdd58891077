#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Opaque id of a symbolic input value. Two ids are the same variable iff
/// they are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymVarId(pub u32);

impl SymVarId {
    /// Name used for the variable when it is handed to a solver.
    pub fn solver_name(self) -> String {
        format!("X{}", self.0)
    }
}

/// Hands out fresh ids for one generation session, starting at 0.
#[derive(Clone, Debug, Default)]
pub struct SymVarCounter {
    next: u32,
}

impl SymVarCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> SymVarId {
        let id = SymVarId(self.next);
        self.next += 1;
        id
    }

    pub fn issued(&self) -> u32 {
        self.next
    }
}
