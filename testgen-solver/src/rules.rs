#![forbid(unsafe_code)]

//! Builtin operator table used by the translator.

use crate::formula::{Op, Sort};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signature {
    /// `Int x Int -> Int`
    Arith,
    /// `Int x Int -> Bool`
    Compare,
    /// Both operands of one sort, `-> Bool`.
    Equality,
    /// `Bool^n -> Bool`
    Logic,
}

impl Signature {
    pub fn result(self) -> Sort {
        match self {
            Signature::Arith => Sort::Int,
            Signature::Compare | Signature::Equality | Signature::Logic => Sort::Bool,
        }
    }

    /// Sort every operand must have, if fixed.
    pub fn operand(self) -> Option<Sort> {
        match self {
            Signature::Arith | Signature::Compare => Some(Sort::Int),
            Signature::Logic => Some(Sort::Bool),
            Signature::Equality => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub name: &'static str,
    pub arity: usize,
    pub op: Op,
    pub signature: Signature,
}

pub const RULES: &[Rule] = &[
    Rule { name: "Add", arity: 2, op: Op::Add, signature: Signature::Arith },
    Rule { name: "Sub", arity: 2, op: Op::Sub, signature: Signature::Arith },
    Rule { name: "Mul", arity: 2, op: Op::Mul, signature: Signature::Arith },
    Rule { name: "Eq", arity: 2, op: Op::Eq, signature: Signature::Equality },
    Rule { name: "Lt", arity: 2, op: Op::Lt, signature: Signature::Compare },
    Rule { name: "Gt", arity: 2, op: Op::Gt, signature: Signature::Compare },
    Rule { name: "And", arity: 2, op: Op::And, signature: Signature::Logic },
    Rule { name: "Or", arity: 2, op: Op::Or, signature: Signature::Logic },
    Rule { name: "Not", arity: 1, op: Op::Not, signature: Signature::Logic },
];

/// Marks a value as unconstrained; translates to `true`.
pub const ANY: &str = "Any";

pub fn lookup(name: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.name == name)
}
