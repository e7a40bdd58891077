#![forbid(unsafe_code)]

use std::fmt;

use crate::{ApiBlock, Expr, Program, ResponseCode, Spec, Stmt, TypeExpr, PRIME_FN};

const INDENT: &str = "    ";

pub fn format_type(ty: &TypeExpr) -> String {
    let mut out = String::new();
    fmt_type(&mut out, ty);
    out
}

pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    fmt_expr(&mut out, expr);
    out
}

pub fn format_stmt(stmt: &Stmt) -> String {
    let mut out = String::new();
    fmt_stmt(&mut out, stmt);
    out
}

/// One statement per line.
pub fn format_program(program: &Program) -> String {
    let mut out = String::new();
    for stmt in &program.stmts {
        fmt_stmt(&mut out, stmt);
        out.push('\n');
    }
    out
}

pub fn format_spec(spec: &Spec) -> String {
    let mut out = String::new();
    for decl in &spec.globals {
        out.push_str(&decl.name);
        out.push_str(" : ");
        fmt_type(&mut out, &decl.ty);
        out.push_str(";\n");
    }
    for init in &spec.inits {
        out.push_str(&init.var);
        out.push_str(" := ");
        fmt_expr(&mut out, &init.expr);
        out.push_str(";\n");
    }
    for func in &spec.functions {
        out.push_str(&func.name);
        out.push_str(" : ");
        for p in &func.params {
            fmt_type(&mut out, p);
            out.push_str(" -> ");
        }
        fmt_type(&mut out, &func.ret.1);
        out.push_str(";\n");
    }
    for block in &spec.blocks {
        out.push('\n');
        fmt_block(&mut out, block);
    }
    out
}

fn fmt_block(out: &mut String, block: &ApiBlock) {
    out.push_str(&block.name);
    out.push_str(" :\n");

    out.push_str(INDENT);
    out.push_str("precondition: ");
    fmt_expr(out, &block.pre);
    out.push('\n');

    out.push_str(INDENT);
    out.push_str("call: ");
    out.push_str(&block.call.name);
    fmt_list(out, "(", &block.call.args, ")");
    out.push_str(" => (");
    out.push_str(response_name(block.call.response.code));
    if let Some(e) = &block.call.response.expr {
        out.push_str(", ");
        fmt_expr(out, e);
    }
    out.push_str(")\n");

    out.push_str(INDENT);
    out.push_str("postcondition: ");
    fmt_expr(out, &block.post);
    out.push('\n');
}

fn response_name(code: ResponseCode) -> &'static str {
    match code {
        ResponseCode::Ok200 => "OK",
        ResponseCode::Created201 => "CREATED",
        ResponseCode::BadRequest400 => "BAD_REQUEST",
    }
}

fn fmt_type(out: &mut String, ty: &TypeExpr) {
    match ty {
        TypeExpr::Const(name) => out.push_str(name),
        TypeExpr::Func { params, ret } => {
            out.push('(');
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                fmt_type(out, p);
            }
            out.push_str(") -> ");
            fmt_type(out, ret);
        }
        TypeExpr::Map { domain, range } => {
            out.push_str("Map<");
            fmt_type(out, domain);
            out.push_str(", ");
            fmt_type(out, range);
            out.push('>');
        }
        TypeExpr::Set(elem) => {
            out.push_str("Set<");
            fmt_type(out, elem);
            out.push('>');
        }
        TypeExpr::Tuple(elems) => {
            out.push_str("Tuple<");
            for (i, e) in elems.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                fmt_type(out, e);
            }
            out.push('>');
        }
    }
}

fn fmt_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Num(n) => out.push_str(&n.to_string()),
        Expr::Str(s) => {
            out.push('"');
            for ch in s.chars() {
                match ch {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
        Expr::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Expr::Var(name) => out.push_str(name),
        Expr::Set(items) => fmt_list(out, "{", items, "}"),
        Expr::Map(entries) => {
            out.push('[');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(k);
                out.push_str(" -> ");
                fmt_expr(out, v);
            }
            out.push(']');
        }
        Expr::Tuple(items) => fmt_list(out, "(", items, ")"),
        Expr::Call { name, args } if name == PRIME_FN => fmt_list(out, "'(", args, ")"),
        Expr::Call { name, args } => {
            out.push_str(name);
            fmt_list(out, "(", args, ")");
        }
        Expr::SymVar(id) => {
            out.push('$');
            out.push_str(&id.solver_name());
        }
    }
}

fn fmt_list(out: &mut String, open: &str, items: &[Expr], close: &str) {
    out.push_str(open);
    for (i, e) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        fmt_expr(out, e);
    }
    out.push_str(close);
}

fn fmt_stmt(out: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Assign { target, expr } => {
            out.push_str(target);
            out.push_str(" := ");
            fmt_expr(out, expr);
        }
        Stmt::Assume(e) => {
            out.push_str("assume(");
            fmt_expr(out, e);
            out.push(')');
        }
        Stmt::Assert(e) => {
            out.push_str("assert(");
            fmt_expr(out, e);
            out.push(')');
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_type(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_expr(self))
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_stmt(self))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_program(self))
    }
}

impl fmt::Display for crate::SymVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.solver_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiCall, Decl, Init, Response, SymVarId};

    #[test]
    fn renders_statements_in_canonical_form() {
        assert_eq!(format_stmt(&Stmt::input("x0")), "x0 := input()");
        let pre = Expr::binary("Gt", Expr::var("x0"), Expr::Num(0));
        assert_eq!(Stmt::Assume(pre).to_string(), "assume(Gt(x0, 0))");
        let post = Expr::binary("Eq", Expr::primed("U"), Expr::var("U_old"));
        assert_eq!(Stmt::Assert(post).to_string(), "assert(Eq('(U), U_old))");
    }

    #[test]
    fn renders_composite_types() {
        let ty = TypeExpr::map(TypeExpr::int(), TypeExpr::string());
        assert_eq!(ty.to_string(), "Map<int, string>");
        let f = TypeExpr::Func {
            params: vec![TypeExpr::int(), TypeExpr::set(TypeExpr::bool())],
            ret: Box::new(TypeExpr::Tuple(vec![TypeExpr::int(), TypeExpr::void()])),
        };
        assert_eq!(f.to_string(), "(int, Set<bool>) -> Tuple<int, void>");
    }

    #[test]
    fn renders_collections_and_literals() {
        let e = Expr::Tuple(vec![
            Expr::Set(vec![Expr::Num(1), Expr::Num(-2)]),
            Expr::Map(vec![("k".into(), Expr::Str("a\"b".into()))]),
            Expr::Bool(false),
            Expr::SymVar(SymVarId(4)),
        ]);
        assert_eq!(e.to_string(), r#"({1, -2}, [k -> "a\"b"], false, $X4)"#);
    }

    #[test]
    fn program_is_one_statement_per_line() {
        let p = Program::new(vec![Stmt::assign("y", Expr::Num(0)), Stmt::input("x0")]);
        assert_eq!(p.to_string(), "y := 0\nx0 := input()\n");
    }

    #[test]
    fn spec_rendering_lists_every_section() {
        let spec = Spec {
            globals: vec![Decl::new("y", TypeExpr::int())],
            inits: vec![Init::new("y", Expr::Num(0))],
            functions: vec![crate::FuncDecl::new(
                "f1",
                vec![TypeExpr::int(), TypeExpr::int()],
                ResponseCode::Ok200,
                TypeExpr::int(),
            )],
            blocks: vec![ApiBlock::new(
                "f1",
                Expr::binary("Gt", Expr::var("x"), Expr::Num(0)),
                ApiCall::new(
                    "f1",
                    vec![Expr::var("x"), Expr::var("z")],
                    Response::new(ResponseCode::Ok200, Expr::var("r")),
                ),
                Expr::binary("Eq", Expr::var("r"), Expr::binary("Add", Expr::var("x"), Expr::var("z"))),
            )],
        };
        let text = format_spec(&spec);
        assert!(text.starts_with("y : int;\ny := 0;\nf1 : int -> int -> int;\n"));
        assert!(text.contains("    call: f1(x, z) => (OK, r)\n"));
        assert!(text.contains("    postcondition: Eq(r, Add(x, z))\n"));
    }
}
