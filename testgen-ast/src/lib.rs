#![forbid(unsafe_code)]

//! In-memory trees consumed and produced by the test generator: the
//! specification model, the straight-line test programs (ATC and CTC) and the
//! symbolic-variable ids shared by the later stages.

mod fmt;
mod scope;
mod symvar;

pub use fmt::{format_expr, format_program, format_spec, format_stmt, format_type};
pub use scope::{LocalScopes, SymbolTable};
pub use symvar::{SymVarCounter, SymVarId};

use serde::{Deserialize, Serialize};

/// Name of the zero-argument call that marks a symbolic input in an ATC.
pub const INPUT_FN: &str = "input";

/// Name of the unary call that marks the post-call value of a global.
pub const PRIME_FN: &str = "'";

/// Suffix given to the pre-call snapshot of a primed global.
pub const OLD_SUFFIX: &str = "_old";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeExpr {
    Const(String),
    Func {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
    },
    Map {
        domain: Box<TypeExpr>,
        range: Box<TypeExpr>,
    },
    Set(Box<TypeExpr>),
    Tuple(Vec<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Const(name.into())
    }

    pub fn int() -> Self {
        Self::named("int")
    }

    pub fn bool() -> Self {
        Self::named("bool")
    }

    pub fn string() -> Self {
        Self::named("string")
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    pub fn map(domain: TypeExpr, range: TypeExpr) -> Self {
        TypeExpr::Map {
            domain: Box::new(domain),
            range: Box::new(range),
        }
    }

    pub fn set(elem: TypeExpr) -> Self {
        TypeExpr::Set(Box::new(elem))
    }
}

/// The value/formula language shared by specifications, programs and the
/// symbolic engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Num(i64),
    Str(String),
    Bool(bool),
    Var(String),
    Set(Vec<Expr>),
    /// Keys are variable names, not arbitrary expressions.
    Map(Vec<(String, Expr)>),
    Tuple(Vec<Expr>),
    Call { name: String, args: Vec<Expr> },
    SymVar(SymVarId),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn binary(name: impl Into<String>, left: Expr, right: Expr) -> Self {
        Self::call(name, vec![left, right])
    }

    pub fn input() -> Self {
        Self::call(INPUT_FN, Vec::new())
    }

    pub fn primed(name: impl Into<String>) -> Self {
        Self::call(PRIME_FN, vec![Expr::var(name)])
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Num(_) | Expr::Str(_) | Expr::Bool(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Expr::Call { name, .. } if name == INPUT_FN)
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Direct sub-expressions, map values included.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Num(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Var(_) | Expr::SymVar(_) => Vec::new(),
            Expr::Set(items) | Expr::Tuple(items) => items.iter().collect(),
            Expr::Map(entries) => entries.iter().map(|(_, v)| v).collect(),
            Expr::Call { args, .. } => args.iter().collect(),
        }
    }

    /// Every variable name in pre-order, map keys included, duplicates kept.
    pub fn var_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_var_names(self, &mut out);
        out
    }

    /// Every symbolic id in pre-order, duplicates kept.
    pub fn sym_vars(&self) -> Vec<SymVarId> {
        let mut out = Vec::new();
        collect_sym_vars(self, &mut out);
        out
    }
}

fn collect_var_names<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    match expr {
        Expr::Var(name) => out.push(name.as_str()),
        Expr::Map(entries) => {
            for (k, v) in entries {
                out.push(k.as_str());
                collect_var_names(v, out);
            }
        }
        other => {
            for child in other.children() {
                collect_var_names(child, out);
            }
        }
    }
}

fn collect_sym_vars(expr: &Expr, out: &mut Vec<SymVarId>) {
    match expr {
        Expr::SymVar(id) => out.push(*id),
        other => {
            for child in other.children() {
                collect_sym_vars(child, out);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    Assign { target: String, expr: Expr },
    /// Records a path condition; the environment is unchanged.
    Assume(Expr),
    /// A correctness obligation kept for later inspection, never executed.
    Assert(Expr),
}

impl Stmt {
    pub fn assign(target: impl Into<String>, expr: Expr) -> Self {
        Stmt::Assign {
            target: target.into(),
            expr,
        }
    }

    pub fn input(target: impl Into<String>) -> Self {
        Self::assign(target, Expr::input())
    }

    /// Target of an `x := input()` statement.
    pub fn input_target(&self) -> Option<&str> {
        match self {
            Stmt::Assign { target, expr } if expr.is_input() => Some(target.as_str()),
            _ => None,
        }
    }
}

/// A straight-line test program: an ATC before concretization, a CTC after.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

impl Program {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn input_count(&self) -> usize {
        self.stmts.iter().filter(|s| s.input_target().is_some()).count()
    }
}

/// A global variable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
    pub name: String,
    pub ty: TypeExpr,
}

impl Decl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self { name: name.into(), ty }
    }
}

/// Runs once in global scope; never renamed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Init {
    pub var: String,
    pub expr: Expr,
}

impl Init {
    pub fn new(var: impl Into<String>, expr: Expr) -> Self {
        Self { var: var.into(), expr }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    Ok200,
    Created201,
    BadRequest400,
}

impl ResponseCode {
    pub fn status(self) -> u16 {
        match self {
            ResponseCode::Ok200 => 200,
            ResponseCode::Created201 => 201,
            ResponseCode::BadRequest400 => 400,
        }
    }
}

/// Signature declaration; carries type information only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<TypeExpr>,
    pub ret: (ResponseCode, TypeExpr),
}

impl FuncDecl {
    pub fn new(name: impl Into<String>, params: Vec<TypeExpr>, code: ResponseCode, ret: TypeExpr) -> Self {
        Self {
            name: name.into(),
            params,
            ret: (code, ret),
        }
    }

    pub fn signature(&self) -> TypeExpr {
        TypeExpr::Func {
            params: self.params.clone(),
            ret: Box::new(self.ret.1.clone()),
        }
    }
}

/// Status tag plus the expression naming the bound result, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub code: ResponseCode,
    #[serde(default)]
    pub expr: Option<Expr>,
}

impl Response {
    pub fn new(code: ResponseCode, expr: Expr) -> Self {
        Self { code, expr: Some(expr) }
    }

    pub fn void(code: ResponseCode) -> Self {
        Self { code, expr: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub response: Response,
}

impl ApiCall {
    pub fn new(name: impl Into<String>, args: Vec<Expr>, response: Response) -> Self {
        Self {
            name: name.into(),
            args,
            response,
        }
    }

    pub fn as_expr(&self) -> Expr {
        Expr::call(self.name.clone(), self.args.clone())
    }
}

/// One endpoint contract: `name : precondition: .. call: .. postcondition: ..`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiBlock {
    pub name: String,
    pub pre: Expr,
    pub call: ApiCall,
    pub post: Expr,
}

impl ApiBlock {
    pub fn new(name: impl Into<String>, pre: Expr, call: ApiCall, post: Expr) -> Self {
        Self {
            name: name.into(),
            pre,
            call,
            post,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    #[serde(default)]
    pub globals: Vec<Decl>,
    #[serde(default)]
    pub inits: Vec<Init>,
    #[serde(default)]
    pub functions: Vec<FuncDecl>,
    #[serde(default)]
    pub blocks: Vec<ApiBlock>,
}

impl Spec {
    pub fn is_global(&self, name: &str) -> bool {
        self.globals.iter().any(|d| d.name == name)
    }

    pub fn global(&self, name: &str) -> Option<&Decl> {
        self.globals.iter().find(|d| d.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&FuncDecl> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Position and block of the first API whose name matches.
    pub fn block(&self, name: &str) -> Option<(usize, &ApiBlock)> {
        self.blocks.iter().enumerate().find(|(_, b)| b.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_equality_is_structural_and_variant_tagged() {
        let a = TypeExpr::map(TypeExpr::string(), TypeExpr::set(TypeExpr::int()));
        let b = TypeExpr::map(TypeExpr::string(), TypeExpr::set(TypeExpr::int()));
        assert_eq!(a, b);
        assert_eq!(a.clone(), a);

        let tuple = TypeExpr::Tuple(vec![TypeExpr::int()]);
        let set = TypeExpr::set(TypeExpr::int());
        assert_ne!(tuple, set);
        assert_ne!(TypeExpr::int(), TypeExpr::bool());
    }

    #[test]
    fn var_names_walk_map_keys_and_nested_calls() {
        let e = Expr::call(
            "And",
            vec![
                Expr::binary("Gt", Expr::var("x"), Expr::Num(0)),
                Expr::Map(vec![("k".into(), Expr::Tuple(vec![Expr::var("z")]))]),
            ],
        );
        assert_eq!(e.var_names(), vec!["x", "k", "z"]);
    }

    #[test]
    fn sym_vars_are_collected_in_order() {
        let e = Expr::binary("Add", Expr::SymVar(SymVarId(3)), Expr::Set(vec![Expr::SymVar(SymVarId(1))]));
        assert_eq!(e.sym_vars(), vec![SymVarId(3), SymVarId(1)]);
    }

    #[test]
    fn input_target_only_matches_input_calls() {
        assert_eq!(Stmt::input("x0").input_target(), Some("x0"));
        assert_eq!(Stmt::assign("y", Expr::Num(0)).input_target(), None);
        assert_eq!(Stmt::Assume(Expr::input()).input_target(), None);
    }

    #[test]
    fn spec_block_lookup_returns_first_match() {
        let call = ApiCall::new("f", Vec::new(), Response::void(ResponseCode::Ok200));
        let spec = Spec {
            blocks: vec![
                ApiBlock::new("g", Expr::Bool(true), call.clone(), Expr::Bool(true)),
                ApiBlock::new("f", Expr::Bool(true), call.clone(), Expr::Num(1)),
                ApiBlock::new("f", Expr::Bool(true), call, Expr::Num(2)),
            ],
            ..Spec::default()
        };
        let (idx, block) = spec.block("f").expect("block");
        assert_eq!(idx, 1);
        assert_eq!(block.post, Expr::Num(1));
        assert!(spec.block("h").is_none());
    }

    #[test]
    fn spec_round_trips_through_json() {
        let spec = Spec {
            globals: vec![Decl::new("y", TypeExpr::int())],
            inits: vec![Init::new("y", Expr::Num(0))],
            functions: vec![FuncDecl::new(
                "f1",
                vec![TypeExpr::int(), TypeExpr::int()],
                ResponseCode::Ok200,
                TypeExpr::int(),
            )],
            blocks: Vec::new(),
        };
        let json = serde_json::to_string(&spec).expect("serialize");
        let back: Spec = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, spec);
    }
}
