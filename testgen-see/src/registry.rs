#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use testgen_ast::Expr;

use crate::DispatchError;

/// Concrete implementations of the API under test.
///
/// The engine only calls [`FunctionRegistry::call`] once every argument is a
/// concrete value. Implementations may keep private state behind interior
/// mutability; the engine only ever holds a shared reference.
pub trait FunctionRegistry {
    fn contains(&self, name: &str) -> bool;

    fn call(&self, name: &str, args: &[Expr]) -> Result<Expr, DispatchError>;
}

impl FunctionRegistry for () {
    fn contains(&self, _name: &str) -> bool {
        false
    }

    fn call(&self, name: &str, _args: &[Expr]) -> Result<Expr, DispatchError> {
        Err(DispatchError::new(format!("no implementation for `{name}`")))
    }
}

impl<R: FunctionRegistry + ?Sized> FunctionRegistry for &R {
    fn contains(&self, name: &str) -> bool {
        (**self).contains(name)
    }

    fn call(&self, name: &str, args: &[Expr]) -> Result<Expr, DispatchError> {
        (**self).call(name, args)
    }
}

type Handler = Box<dyn Fn(&[Expr]) -> Result<Expr, DispatchError>>;

/// Registry backed by closures, keyed by function name.
#[derive(Default)]
pub struct FnRegistry {
    handlers: BTreeMap<String, Handler>,
}

impl FnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[Expr]) -> Result<Expr, DispatchError> + 'static,
    {
        self.handlers.insert(name.into(), Box::new(f));
        self
    }

    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Expr]) -> Result<Expr, DispatchError> + 'static,
    {
        self.register(name, f);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl FunctionRegistry for FnRegistry {
    fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    fn call(&self, name: &str, args: &[Expr]) -> Result<Expr, DispatchError> {
        match self.handlers.get(name) {
            Some(f) => f(args),
            None => ().call(name, args),
        }
    }
}

/// Reads argument `idx` as an integer literal.
pub fn int_arg(name: &str, args: &[Expr], idx: usize) -> Result<i64, DispatchError> {
    match args.get(idx) {
        Some(Expr::Num(n)) => Ok(*n),
        Some(other) => Err(DispatchError::new(format!(
            "`{name}` expects an integer for argument {idx}, got {other}"
        ))),
        None => Err(DispatchError::new(format!(
            "`{name}` expects at least {} arguments, got {}",
            idx + 1,
            args.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_registry_knows_nothing() {
        assert!(!().contains("f1"));
        assert!(().call("f1", &[]).is_err());
    }

    #[test]
    fn closures_are_dispatched_by_name() {
        let reg = FnRegistry::new().with("inc", |args| Ok(Expr::Num(int_arg("inc", args, 0)? + 1)));
        assert!(reg.contains("inc"));
        assert_eq!(reg.call("inc", &[Expr::Num(4)]).expect("inc"), Expr::Num(5));
        assert!(reg.call("inc", &[Expr::Str("a".into())]).is_err());
        assert!(reg.call("dec", &[]).is_err());
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["inc"]);
    }
}
