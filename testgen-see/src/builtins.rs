#![forbid(unsafe_code)]

use testgen_ast::Expr;

/// Operators the engine composes symbolically instead of dispatching.
pub const BUILTINS: &[&str] = &["Add", "Sub", "Mul", "Eq", "Lt", "Gt", "And", "Or", "Not"];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Evaluates builtin applications whose operands are literals, bottom-up.
/// Anything that cannot be evaluated is rebuilt with folded children.
pub fn fold(expr: &Expr) -> Expr {
    match expr {
        Expr::Call { name, args } => {
            let args: Vec<Expr> = args.iter().map(fold).collect();
            if is_builtin(name) {
                if let Some(v) = eval(name, &args) {
                    return v;
                }
            }
            Expr::Call {
                name: name.clone(),
                args,
            }
        }
        Expr::Set(items) => Expr::Set(items.iter().map(fold).collect()),
        Expr::Tuple(items) => Expr::Tuple(items.iter().map(fold).collect()),
        Expr::Map(entries) => Expr::Map(entries.iter().map(|(k, v)| (k.clone(), fold(v))).collect()),
        other => other.clone(),
    }
}

fn eval(name: &str, args: &[Expr]) -> Option<Expr> {
    match (name, args) {
        ("Add", [Expr::Num(a), Expr::Num(b)]) => a.checked_add(*b).map(Expr::Num),
        ("Sub", [Expr::Num(a), Expr::Num(b)]) => a.checked_sub(*b).map(Expr::Num),
        ("Mul", [Expr::Num(a), Expr::Num(b)]) => a.checked_mul(*b).map(Expr::Num),
        ("Lt", [Expr::Num(a), Expr::Num(b)]) => Some(Expr::Bool(a < b)),
        ("Gt", [Expr::Num(a), Expr::Num(b)]) => Some(Expr::Bool(a > b)),
        ("Eq", [a, b]) if a.is_literal() && b.is_literal() => Some(Expr::Bool(a == b)),
        ("And", [Expr::Bool(a), Expr::Bool(b)]) => Some(Expr::Bool(*a && *b)),
        ("Or", [Expr::Bool(a), Expr::Bool(b)]) => Some(Expr::Bool(*a || *b)),
        ("Not", [Expr::Bool(a)]) => Some(Expr::Bool(!a)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testgen_ast::SymVarId;

    #[test]
    fn folds_nested_arithmetic_and_logic() {
        let e = Expr::binary(
            "And",
            Expr::binary("Gt", Expr::binary("Add", Expr::Num(2), Expr::Num(3)), Expr::Num(4)),
            Expr::call("Not", vec![Expr::binary("Eq", Expr::Str("a".into()), Expr::Str("b".into()))]),
        );
        assert_eq!(fold(&e), Expr::Bool(true));
    }

    #[test]
    fn leaves_symbolic_and_foreign_calls_alone() {
        let sym = Expr::binary("Add", Expr::SymVar(SymVarId(0)), Expr::binary("Mul", Expr::Num(2), Expr::Num(3)));
        assert_eq!(
            fold(&sym),
            Expr::binary("Add", Expr::SymVar(SymVarId(0)), Expr::Num(6))
        );
        let foreign = Expr::call("f1", vec![Expr::binary("Sub", Expr::Num(1), Expr::Num(1))]);
        assert_eq!(fold(&foreign), Expr::call("f1", vec![Expr::Num(0)]));
    }

    #[test]
    fn overflow_is_not_folded() {
        let e = Expr::binary("Add", Expr::Num(i64::MAX), Expr::Num(1));
        assert_eq!(fold(&e), e);
    }
}
