#![forbid(unsafe_code)]

//! Compiles a specification and a requested call sequence into an abstract
//! test case: a flat program of `input()`, `assume`, call and `assert`
//! statements with block-local variables renamed apart.

mod error;
pub mod rename;

use std::collections::BTreeSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use testgen_ast::{ApiBlock, Expr, LocalScopes, OLD_SUFFIX, Program, Spec, Stmt, TypeExpr};

pub use error::AtcError;
pub use rename::{LocalScope, convert, input_candidates, primed_vars, remove_primes};

/// How the rename suffix of an emitted block is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuffixScheme {
    /// Position of the call in the requested sequence. Repeated calls to the
    /// same API get distinct variables.
    #[default]
    CallOccurrence,
    /// Position of the matched block in the specification. Repeated calls to
    /// the same API share their variables.
    BlockIndex,
}

pub struct AtcGenerator<'a> {
    spec: &'a Spec,
    scopes: &'a LocalScopes,
    suffix: SuffixScheme,
}

impl<'a> AtcGenerator<'a> {
    pub fn new(spec: &'a Spec, scopes: &'a LocalScopes) -> Self {
        Self {
            spec,
            scopes,
            suffix: SuffixScheme::default(),
        }
    }

    pub fn with_suffix_scheme(mut self, suffix: SuffixScheme) -> Self {
        self.suffix = suffix;
        self
    }

    pub fn generate<S: AsRef<str>>(&self, calls: &[S]) -> Result<Program, AtcError> {
        let resolved = calls
            .iter()
            .map(|call| {
                let name = call.as_ref();
                self.spec
                    .block(name)
                    .ok_or_else(|| AtcError::UnknownApi { name: name.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmts = self.init_block();
        stmts.extend(self.havoc_block(resolved.iter().map(|(_, b)| *b)));

        for (occurrence, (index, block)) in resolved.into_iter().enumerate() {
            let name = &block.name;
            let suffix = match self.suffix {
                SuffixScheme::CallOccurrence => occurrence,
                SuffixScheme::BlockIndex => index,
            };
            let emitted = self.api_block(block, index, &suffix.to_string())?;
            debug!("atc: `{name}` (block {index}) emitted {} statements", emitted.len());
            stmts.extend(emitted);
        }

        info!("atc: {} statements for {} calls", stmts.len(), calls.len());
        Ok(Program::new(stmts))
    }

    fn init_block(&self) -> Vec<Stmt> {
        self.spec
            .inits
            .iter()
            .map(|init| Stmt::assign(init.var.clone(), convert(&init.expr, None)))
            .collect()
    }

    /// `G := input()` for every uninitialized integer global the requested
    /// blocks mention, in declaration order. Other uninitialized globals are
    /// left unbound.
    fn havoc_block<'b>(&self, blocks: impl Iterator<Item = &'b ApiBlock>) -> Vec<Stmt> {
        let mut mentioned: BTreeSet<&str> = BTreeSet::new();
        for block in blocks {
            let exprs = std::iter::once(&block.pre)
                .chain(block.call.args.iter())
                .chain(block.call.response.expr.as_ref())
                .chain(std::iter::once(&block.post));
            for expr in exprs {
                mentioned.extend(expr.var_names());
            }
        }
        self.spec
            .globals
            .iter()
            .filter(|g| g.ty == TypeExpr::int())
            .filter(|g| mentioned.contains(g.name.as_str()))
            .filter(|g| !self.spec.inits.iter().any(|i| i.var == g.name))
            .map(|g| {
                debug!("atc: `{}` has no init, treating it as an input", g.name);
                Stmt::input(g.name.clone())
            })
            .collect()
    }

    fn api_block(&self, block: &ApiBlock, index: usize, suffix: &str) -> Result<Vec<Stmt>, AtcError> {
        let table = self.scopes.get(index).ok_or_else(|| AtcError::MissingSymbolTable {
            api: block.name.clone(),
            block: index,
        })?;

        let response = block.call.response.expr.as_ref();
        let results = response.map(|r| rename::free_vars(r)).unwrap_or_default();
        let scope = LocalScope::new(self.spec, table, suffix).with_results(results);
        self.validate(block, &scope)?;

        let mut out = Vec::new();

        for var in input_candidates(block.call.args.iter().chain(std::iter::once(&block.pre)), &scope) {
            out.push(Stmt::input(scope.rename(&var)));
        }

        out.push(Stmt::Assume(convert(&block.pre, Some(&scope))));

        let primed = response.map(primed_vars).unwrap_or_default();
        for name in &primed {
            out.push(Stmt::assign(format!("{name}{OLD_SUFFIX}"), Expr::var(name.clone())));
        }
        let primed: BTreeSet<String> = primed.into_iter().collect();

        let target = match response {
            Some(expr) => match remove_primes(&convert(expr, Some(&scope)), &primed) {
                Expr::Var(name) => name,
                other => {
                    return Err(AtcError::InvalidResponseTarget {
                        api: block.name.clone(),
                        found: other.to_string(),
                    });
                }
            },
            None => format!("_result{suffix}"),
        };
        let args = block.call.args.iter().map(|a| convert(a, Some(&scope))).collect();
        out.push(Stmt::assign(target, Expr::call(block.call.name.clone(), args)));

        out.push(Stmt::Assert(remove_primes(&convert(&block.post, Some(&scope)), &primed)));
        Ok(out)
    }

    fn validate(&self, block: &ApiBlock, scope: &LocalScope<'_>) -> Result<(), AtcError> {
        let exprs = std::iter::once(&block.pre)
            .chain(block.call.args.iter())
            .chain(std::iter::once(&block.post));
        for expr in exprs {
            if let Some(var) = rename::free_vars(expr).into_iter().find(|v| !scope.resolves(v)) {
                return Err(AtcError::UnresolvedVariable {
                    api: block.name.clone(),
                    var: var.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// [`AtcGenerator::generate`] with the default suffix scheme.
pub fn generate<S: AsRef<str>>(spec: &Spec, scopes: &LocalScopes, calls: &[S]) -> Result<Program, AtcError> {
    AtcGenerator::new(spec, scopes).generate(calls)
}
