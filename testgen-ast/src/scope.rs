#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ApiCall;

/// Names declared local to one API block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    names: BTreeSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Symbol tables keyed by block position in the specification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalScopes {
    tables: BTreeMap<usize, SymbolTable>,
}

impl LocalScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: usize, table: SymbolTable) {
        self.tables.insert(block, table);
    }

    pub fn get(&self, block: usize) -> Option<&SymbolTable> {
        self.tables.get(&block)
    }

    /// One table per block, holding the variable arguments of its call.
    pub fn from_call_params<'a>(calls: impl IntoIterator<Item = &'a ApiCall>) -> Self {
        let mut scopes = Self::new();
        for (idx, call) in calls.into_iter().enumerate() {
            let table = call.args.iter().filter_map(|a| a.as_var()).collect();
            scopes.insert(idx, table);
        }
        scopes
    }
}
