#![forbid(unsafe_code)]

//! Concrete applications the generated tests run against.

use std::cell::Cell;

use log::debug;
use testgen_ast::Expr;
use testgen_see::{DispatchError, FunctionRegistry, int_arg};

/// `f1(a, b) = a + b`, `f2() = 0`, plus a getter/setter pair over one
/// private integer.
#[derive(Debug, Default)]
pub struct App1 {
    y: Cell<i64>,
}

impl App1 {
    pub const FUNCTIONS: &'static [&'static str] = &["f1", "f2", "get_y", "set_y"];

    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the private global.
    pub fn y(&self) -> i64 {
        self.y.get()
    }
}

impl FunctionRegistry for App1 {
    fn contains(&self, name: &str) -> bool {
        Self::FUNCTIONS.contains(&name)
    }

    fn call(&self, name: &str, args: &[Expr]) -> Result<Expr, DispatchError> {
        let out = match name {
            "f1" => {
                let (a, b) = (int_arg(name, args, 0)?, int_arg(name, args, 1)?);
                a.checked_add(b)
                    .ok_or_else(|| DispatchError::new(format!("f1({a}, {b}) overflows")))?
            }
            "f2" => 0,
            "get_y" => self.y.get(),
            "set_y" => {
                let v = int_arg(name, args, 0)?;
                self.y.set(v);
                v
            }
            other => return ().call(other, args),
        };
        debug!("app1: {name} -> {out}");
        Ok(Expr::Num(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn f1_adds_and_f2_is_zero() {
        let app = App1::new();
        assert_eq!(app.call("f1", &[Expr::Num(3), Expr::Num(4)]).expect("f1"), Expr::Num(7));
        assert_eq!(app.call("f2", &[]).expect("f2"), Expr::Num(0));
        assert!(app.call("f1", &[Expr::Num(3)]).is_err());
        assert!(app.call("f1", &[Expr::Num(i64::MAX), Expr::Num(1)]).is_err());
    }

    #[test]
    fn setter_state_is_visible_to_the_getter() {
        let app = App1::new();
        assert_eq!(app.call("get_y", &[]).expect("get"), Expr::Num(0));
        assert_eq!(app.call("set_y", &[Expr::Num(9)]).expect("set"), Expr::Num(9));
        assert_eq!(app.call("get_y", &[]).expect("get"), Expr::Num(9));
        assert_eq!(app.y(), 9);
    }

    #[test]
    fn other_names_are_unknown() {
        let app = App1::new();
        assert!(!app.contains("f3"));
        assert!(app.call("f3", &[]).is_err());
    }
}
