use proptest::{
    prelude::{Just, Strategy, prop, prop_oneof},
    test_runner::{Config, TestCaseError, TestRunner},
};
use testgen_ast::{Decl, Expr, Spec, SymbolTable, TypeExpr};
use testgen_atc::{LocalScope, convert};

fn leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        prop::sample::select(vec!["x", "y", "z", "w"]).prop_map(Expr::var),
        (-50i64..50).prop_map(Expr::Num),
        Just(Expr::Bool(true)),
    ]
}

fn expr() -> impl Strategy<Value = Expr> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            (
                prop::sample::select(vec!["Add", "Eq", "And", "f1"]),
                prop::collection::vec(inner.clone(), 0..4)
            )
                .prop_map(|(name, args)| Expr::call(name, args)),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Expr::Set),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Expr::Tuple),
            prop::collection::vec(
                (prop::sample::select(vec!["x", "k"]).prop_map(String::from), inner),
                0..3
            )
            .prop_map(Expr::Map),
        ]
    })
}

fn expected_name(name: &str) -> String {
    match name {
        "x" | "z" => format!("{name}0"),
        other => other.to_string(),
    }
}

#[test]
fn convert_renames_exactly_the_locals() {
    let spec = Spec {
        globals: vec![Decl::new("y", TypeExpr::int())],
        ..Spec::default()
    };
    let table: SymbolTable = ["x", "z", "y"].into_iter().collect();
    let scope = LocalScope::new(&spec, &table, "0");

    let mut runner = TestRunner::new(Config {
        cases: 128,
        ..Config::default()
    });

    runner
        .run(&expr(), |e| {
            let out = convert(&e, Some(&scope));
            let before: Vec<String> = e.var_names().into_iter().map(expected_name).collect();
            let after: Vec<String> = out.var_names().into_iter().map(str::to_string).collect();
            if before != after {
                return Err(TestCaseError::fail(format!("{e} renamed to {out}")));
            }
            if out.children().len() != e.children().len() {
                return Err(TestCaseError::fail(format!("shape changed: {e} -> {out}")));
            }
            Ok(())
        })
        .expect("renaming property");
}
