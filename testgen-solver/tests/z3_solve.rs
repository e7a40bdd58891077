#![cfg(feature = "z3")]

use testgen_ast::{Expr, SymVarId};
use testgen_solver::{SolveOutcome, SolverBridge, Z3Backend};

fn x(n: u32) -> Expr {
    Expr::SymVar(SymVarId(n))
}

fn bridge() -> SolverBridge {
    SolverBridge::new(Box::new(Z3Backend::new()))
}

#[test]
fn z3_solves_sum_with_lower_bound() {
    let c = Expr::binary(
        "And",
        Expr::binary("Eq", Expr::binary("Add", x(0), x(1)), Expr::Num(10)),
        Expr::binary("Gt", x(0), Expr::Num(3)),
    );
    let outcome = bridge().solve(&[c]).expect("solve");
    let model = outcome.model().expect("sat");
    assert_eq!(model.len(), 2);
    let a = model.get_sym(SymVarId(0)).expect("X0");
    let b = model.get_sym(SymVarId(1)).expect("X1");
    assert_eq!(a + b, 10);
    assert!(a > 3 || b > 3);
}

#[test]
fn z3_reports_unsat_as_an_outcome() {
    let c = Expr::binary(
        "And",
        Expr::binary("Eq", x(0), Expr::Num(5)),
        Expr::binary("Eq", x(0), Expr::Num(10)),
    );
    assert_eq!(bridge().solve(&[c]).expect("solve"), SolveOutcome::Unsat);
}

#[test]
fn z3_handles_values_beyond_any_small_bound() {
    let c = Expr::binary("Gt", x(0), Expr::Num(1_000_000));
    let mut bridge = bridge();
    let outcome = bridge.solve(&[c]).expect("solve");
    assert!(outcome.model().and_then(|m| m.get_sym(SymVarId(0))).expect("X0") > 1_000_000);

    let again = bridge.solve(&[Expr::binary("Lt", x(0), Expr::Num(0))]).expect("solve after reset");
    assert!(again.model().and_then(|m| m.get_sym(SymVarId(0))).expect("X0") < 0);
}
