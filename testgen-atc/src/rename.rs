#![forbid(unsafe_code)]

//! Renaming passes over expressions: block-local suffixes and prime removal.

use std::collections::BTreeSet;

use testgen_ast::{Expr, OLD_SUFFIX, PRIME_FN, Spec, SymbolTable};

/// The locals of one emitted block and the suffix that disambiguates them.
#[derive(Clone, Debug)]
pub struct LocalScope<'a> {
    spec: &'a Spec,
    table: &'a SymbolTable,
    results: BTreeSet<String>,
    suffix: String,
}

impl<'a> LocalScope<'a> {
    pub fn new(spec: &'a Spec, table: &'a SymbolTable, suffix: impl Into<String>) -> Self {
        Self {
            spec,
            table,
            results: BTreeSet::new(),
            suffix: suffix.into(),
        }
    }

    /// Names bound by the block's response; renamed but never inputs.
    pub fn with_results<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.results.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// A local parameter of the block; globals shadow the table.
    pub fn is_param(&self, name: &str) -> bool {
        self.table.contains(name) && !self.spec.is_global(name)
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.is_param(name) || (self.results.contains(name) && !self.spec.is_global(name))
    }

    pub fn resolves(&self, name: &str) -> bool {
        self.is_local(name) || self.spec.is_global(name)
    }

    pub fn rename(&self, name: &str) -> String {
        if self.is_local(name) {
            format!("{name}{}", self.suffix)
        } else {
            name.to_string()
        }
    }
}

/// Appends the scope suffix to every local variable, map keys included.
/// Without a scope the expression is copied unchanged.
pub fn convert(expr: &Expr, scope: Option<&LocalScope<'_>>) -> Expr {
    let Some(scope) = scope else {
        return expr.clone();
    };
    match expr {
        Expr::Var(name) => Expr::Var(scope.rename(name)),
        Expr::Num(_) | Expr::Str(_) | Expr::Bool(_) | Expr::SymVar(_) => expr.clone(),
        Expr::Set(items) => Expr::Set(items.iter().map(|e| convert(e, Some(scope))).collect()),
        Expr::Tuple(items) => Expr::Tuple(items.iter().map(|e| convert(e, Some(scope))).collect()),
        Expr::Map(entries) => Expr::Map(
            entries
                .iter()
                .map(|(k, v)| (scope.rename(k), convert(v, Some(scope))))
                .collect(),
        ),
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(|e| convert(e, Some(scope))).collect(),
        },
    }
}

/// Names wrapped as `'(name)`, first occurrence order.
pub fn primed_vars(expr: &Expr) -> Vec<String> {
    let mut out = Vec::new();
    collect_primed(expr, &mut out);
    out
}

fn collect_primed(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Call { name, args } if name == PRIME_FN => {
            if let Some(Expr::Var(v)) = args.first() {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
        }
        other => {
            for child in other.children() {
                collect_primed(child, out);
            }
        }
    }
}

/// `'(U)` becomes the post-call `U`; a bare `U` in `primed` becomes `U_old`.
pub fn remove_primes(expr: &Expr, primed: &BTreeSet<String>) -> Expr {
    strip(expr, primed, false)
}

fn strip(expr: &Expr, primed: &BTreeSet<String>, inside: bool) -> Expr {
    let old = |name: &str| {
        if !inside && primed.contains(name) {
            format!("{name}{OLD_SUFFIX}")
        } else {
            name.to_string()
        }
    };
    match expr {
        Expr::Var(name) => Expr::Var(old(name)),
        Expr::Call { name, args } if name == PRIME_FN && args.len() == 1 => strip(&args[0], primed, true),
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(|e| strip(e, primed, inside)).collect(),
        },
        Expr::Set(items) => Expr::Set(items.iter().map(|e| strip(e, primed, inside)).collect()),
        Expr::Tuple(items) => Expr::Tuple(items.iter().map(|e| strip(e, primed, inside)).collect()),
        Expr::Map(entries) => Expr::Map(
            entries
                .iter()
                .map(|(k, v)| (old(k), strip(v, primed, inside)))
                .collect(),
        ),
        Expr::Num(_) | Expr::Str(_) | Expr::Bool(_) | Expr::SymVar(_) => expr.clone(),
    }
}

/// Local parameters referenced by `exprs`, map keys included, deduplicated
/// in first-seen order.
pub fn input_candidates<'e>(exprs: impl IntoIterator<Item = &'e Expr>, scope: &LocalScope<'_>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for expr in exprs {
        for name in expr.var_names() {
            if scope.is_param(name) && !out.iter().any(|seen| seen == name) {
                out.push(name.to_string());
            }
        }
    }
    out
}

/// Variables in value position, pre-order. Map keys are labels and are skipped.
pub fn free_vars(expr: &Expr) -> Vec<&str> {
    let mut out = Vec::new();
    collect_free(expr, &mut out);
    out
}

fn collect_free<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    match expr {
        Expr::Var(name) => out.push(name.as_str()),
        other => {
            for child in other.children() {
                collect_free(child, out);
            }
        }
    }
}
