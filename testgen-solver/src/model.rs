#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use testgen_ast::SymVarId;

use crate::formula::SolverVar;

/// Concrete integer for every variable referenced by a satisfiable query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Model {
    values: BTreeMap<SolverVar, i64>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: SolverVar, value: i64) {
        self.values.insert(var, value);
    }

    pub fn get(&self, var: &SolverVar) -> Option<i64> {
        self.values.get(var).copied()
    }

    pub fn get_sym(&self, id: SymVarId) -> Option<i64> {
        self.get(&SolverVar::Sym(id))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SolverVar, i64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    pub fn as_map(&self) -> &BTreeMap<SolverVar, i64> {
        &self.values
    }
}

impl FromIterator<(SolverVar, i64)> for Model {
    fn from_iter<I: IntoIterator<Item = (SolverVar, i64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Result of a satisfiability query. UNSAT is an ordinary outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    Sat(Model),
    Unsat,
}

impl SolveOutcome {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolveOutcome::Sat(_))
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            SolveOutcome::Sat(m) => Some(m),
            SolveOutcome::Unsat => None,
        }
    }
}
