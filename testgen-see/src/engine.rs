#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use log::{debug, trace};
use testgen_ast::{Expr, Program, Stmt, SymVarCounter, SymVarId};

use crate::builtins::{fold, is_builtin};
use crate::{ExecError, FunctionRegistry};

/// Variable name to its last bound value.
pub type ValueEnv = BTreeMap<String, Expr>;

/// An assertion met during execution, with the bindings in force at that point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Obligation {
    pub expr: Expr,
    pub bound: Expr,
}

/// Everything one run leaves behind.
#[derive(Clone, Debug, Default)]
pub struct Execution {
    pub env: ValueEnv,
    pub path_constraint: Vec<Expr>,
    pub inputs: Vec<(String, SymVarId)>,
    pub obligations: Vec<Obligation>,
}

/// Single-pass symbolic interpreter over straight-line programs.
pub struct Engine<'r> {
    registry: &'r dyn FunctionRegistry,
    counter: SymVarCounter,
    env: ValueEnv,
    path: Vec<Expr>,
    inputs: Vec<(String, SymVarId)>,
    obligations: Vec<Obligation>,
}

impl<'r> Engine<'r> {
    pub fn new(registry: &'r dyn FunctionRegistry) -> Self {
        Self {
            registry,
            counter: SymVarCounter::new(),
            env: ValueEnv::new(),
            path: Vec::new(),
            inputs: Vec::new(),
            obligations: Vec::new(),
        }
    }

    /// Continue numbering from an existing session counter.
    pub fn with_counter(mut self, counter: SymVarCounter) -> Self {
        self.counter = counter;
        self
    }

    pub fn with_env(mut self, env: ValueEnv) -> Self {
        self.env = env;
        self
    }

    pub fn env(&self) -> &ValueEnv {
        &self.env
    }

    pub fn lookup(&self, name: &str) -> Option<&Expr> {
        self.env.get(name)
    }

    pub fn path_constraint(&self) -> &[Expr] {
        &self.path
    }

    /// Input variables in allocation order.
    pub fn inputs(&self) -> &[(String, SymVarId)] {
        &self.inputs
    }

    pub fn obligations(&self) -> &[Obligation] {
        &self.obligations
    }

    pub fn counter(&self) -> &SymVarCounter {
        &self.counter
    }

    pub fn execute(&mut self, program: &Program) -> Result<(), ExecError> {
        for stmt in &program.stmts {
            self.step(stmt)?;
        }
        debug!(
            "see: {} statements, {} inputs, path constraint of {}",
            program.len(),
            self.inputs.len(),
            self.path.len()
        );
        Ok(())
    }

    pub fn step(&mut self, stmt: &Stmt) -> Result<(), ExecError> {
        trace!("see: {stmt}");
        match stmt {
            Stmt::Assign { target, expr } => {
                let value = self.eval_rhs(target, expr)?;
                self.env.insert(target.clone(), value);
            }
            Stmt::Assume(e) => {
                let bound = self.substitute(e)?;
                self.path.push(bound);
            }
            Stmt::Assert(e) => {
                let bound = self.substitute_lenient(e);
                self.obligations.push(Obligation { expr: e.clone(), bound });
            }
        }
        Ok(())
    }

    /// Replaces the symbolic input `id` by `value` in every binding and
    /// records the choice in the path constraint.
    pub fn pin(&mut self, id: SymVarId, value: i64) {
        debug!("see: pin {id} = {value}");
        for bound in self.env.values_mut() {
            *bound = replace_sym(bound, id, value);
        }
        self.path
            .push(Expr::binary("Eq", Expr::SymVar(id), Expr::Num(value)));
    }

    /// Whether `expr` can be evaluated concretely under the current bindings.
    pub fn is_ready(&self, expr: &Expr) -> Result<bool, ExecError> {
        Ok(self.substitute(expr)?.sym_vars().is_empty())
    }

    /// Current bindings substituted into `expr`. Unbound variables are errors.
    pub fn substitute(&self, expr: &Expr) -> Result<Expr, ExecError> {
        Ok(match expr {
            Expr::Var(name) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| ExecError::Unbound { name: name.clone() })?,
            Expr::Num(_) | Expr::Str(_) | Expr::Bool(_) | Expr::SymVar(_) => expr.clone(),
            Expr::Set(items) => Expr::Set(self.substitute_all(items)?),
            Expr::Tuple(items) => Expr::Tuple(self.substitute_all(items)?),
            Expr::Map(entries) => Expr::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.substitute(v)?)))
                    .collect::<Result<_, ExecError>>()?,
            ),
            Expr::Call { name, args } => Expr::Call {
                name: name.clone(),
                args: self.substitute_all(args)?,
            },
        })
    }

    fn substitute_all(&self, items: &[Expr]) -> Result<Vec<Expr>, ExecError> {
        items.iter().map(|e| self.substitute(e)).collect()
    }

    fn substitute_lenient(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Var(name) => self.env.get(name).cloned().unwrap_or_else(|| expr.clone()),
            Expr::Set(items) => Expr::Set(items.iter().map(|e| self.substitute_lenient(e)).collect()),
            Expr::Tuple(items) => Expr::Tuple(items.iter().map(|e| self.substitute_lenient(e)).collect()),
            Expr::Map(entries) => Expr::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.substitute_lenient(v)))
                    .collect(),
            ),
            Expr::Call { name, args } => Expr::Call {
                name: name.clone(),
                args: args.iter().map(|e| self.substitute_lenient(e)).collect(),
            },
            other => other.clone(),
        }
    }

    fn eval_rhs(&mut self, target: &str, expr: &Expr) -> Result<Expr, ExecError> {
        let Expr::Call { name, args } = expr else {
            return self.substitute(expr);
        };

        if expr.is_input() {
            let id = self.counter.fresh();
            debug!("see: {target} <- {id}");
            self.inputs.push((target.to_string(), id));
            return Ok(Expr::SymVar(id));
        }

        if is_builtin(name) {
            return Ok(Expr::Call {
                name: name.clone(),
                args: self.substitute_all(args)?,
            });
        }

        if !self.registry.contains(name) {
            return Err(ExecError::UnknownFunction { name: name.clone() });
        }

        let bound = self.substitute_all(args)?;
        let pending: Vec<SymVarId> = {
            let mut ids: Vec<SymVarId> = bound.iter().flat_map(Expr::sym_vars).collect();
            ids.sort();
            ids.dedup();
            ids
        };
        if !pending.is_empty() {
            return Err(ExecError::NotReady {
                target: target.to_string(),
                call: expr.to_string(),
                pending,
            });
        }

        let folded: Vec<Expr> = bound.iter().map(fold).collect();
        let result = self
            .registry
            .call(name, &folded)
            .map_err(|source| ExecError::Dispatch {
                name: name.clone(),
                source,
            })?;
        debug!("see: {target} := {name}(..) = {result}");
        Ok(result)
    }

    pub fn into_execution(self) -> Execution {
        Execution {
            env: self.env,
            path_constraint: self.path,
            inputs: self.inputs,
            obligations: self.obligations,
        }
    }
}

fn replace_sym(expr: &Expr, id: SymVarId, value: i64) -> Expr {
    match expr {
        Expr::SymVar(s) if *s == id => Expr::Num(value),
        Expr::Set(items) => Expr::Set(items.iter().map(|e| replace_sym(e, id, value)).collect()),
        Expr::Tuple(items) => Expr::Tuple(items.iter().map(|e| replace_sym(e, id, value)).collect()),
        Expr::Map(entries) => Expr::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), replace_sym(v, id, value)))
                .collect(),
        ),
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(|e| replace_sym(e, id, value)).collect(),
        },
        other => other.clone(),
    }
}

/// Runs `program` from an empty environment with a fresh counter.
pub fn execute(program: &Program, registry: &dyn FunctionRegistry) -> Result<Execution, ExecError> {
    let mut engine = Engine::new(registry);
    engine.execute(program)?;
    Ok(engine.into_execution())
}
