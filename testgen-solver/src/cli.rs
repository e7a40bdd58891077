#![forbid(unsafe_code)]

//! Z3 driven as a subprocess over SMT-LIB2.

use std::collections::BTreeMap;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, trace};

use crate::SolverError;
use crate::backend::{CheckResult, SmtBackend, SolverConfig};
use crate::formula::{Formula, Op, SolverVar};
use crate::model::Model;

const COMMON_PATHS: &[&str] = &["/opt/homebrew/bin/z3", "/usr/local/bin/z3", "/usr/bin/z3"];

/// Runs one `z3 -in` process per satisfiability check.
#[derive(Debug)]
pub struct Z3Cli {
    path: PathBuf,
    timeout_ms: u64,
    assertions: Vec<Formula>,
    values: Option<BTreeMap<SolverVar, i64>>,
}

impl Z3Cli {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout_ms: 0,
            assertions: Vec::new(),
            values: None,
        }
    }

    /// Uses `z3_path` when set, else the first `z3` on `PATH` or in a common
    /// install location.
    pub fn from_config(cfg: &SolverConfig) -> Result<Self, SolverError> {
        let path = match &cfg.z3_path {
            Some(p) if p.is_file() => p.clone(),
            Some(p) => {
                return Err(SolverError::BackendUnavailable {
                    backend: format!("z3 at {}", p.display()),
                });
            }
            None => locate_z3().ok_or_else(|| SolverError::BackendUnavailable {
                backend: "z3".to_string(),
            })?,
        };
        debug!("z3-cli: {}", path.display());
        Ok(Self {
            timeout_ms: cfg.timeout_ms,
            ..Self::new(path)
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, script: &str) -> Result<String, SolverError> {
        let mut args = vec!["-in".to_string(), "-smt2".to_string()];
        if self.timeout_ms > 0 {
            args.push(format!("-t:{}", self.timeout_ms));
        }
        let mut child = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| backend_error(format!("failed to start {}: {e}", self.path.display())))?;
        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| backend_error("failed to open z3 stdin".to_string()))?;
            stdin
                .write_all(script.as_bytes())
                .map_err(|e| backend_error(format!("failed to write to z3: {e}")))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| backend_error(format!("failed to wait for z3: {e}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stdout.trim().is_empty() {
            return Err(backend_error(format!("no output from z3; stderr: {}", stderr.trim())));
        }
        Ok(stdout)
    }
}

fn backend_error(message: String) -> SolverError {
    SolverError::Backend {
        backend: "z3-cli",
        message,
    }
}

fn locate_z3() -> Option<PathBuf> {
    let exe = if cfg!(windows) { "z3.exe" } else { "z3" };
    env::var_os("PATH")
        .into_iter()
        .flat_map(|paths| env::split_paths(&paths).collect::<Vec<_>>())
        .map(|dir| dir.join(exe))
        .chain(COMMON_PATHS.iter().map(|p| PathBuf::from(*p)))
        .find(|p| p.is_file())
}

/// SMT-LIB2 query: declarations, assertions, `check-sat`, then the values of
/// `vars` in order.
pub fn render_script(assertions: &[Formula], vars: &[SolverVar]) -> String {
    let mut out = String::from("(set-option :produce-models true)\n");
    for v in vars {
        out.push_str(&format!("(declare-const {} Int)\n", symbol(v)));
    }
    for f in assertions {
        out.push_str("(assert ");
        render(&mut out, f);
        out.push_str(")\n");
    }
    out.push_str("(check-sat)\n");
    if !vars.is_empty() {
        out.push_str("(get-value (");
        for (i, v) in vars.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&symbol(v));
        }
        out.push_str("))\n");
    }
    out
}

fn symbol(v: &SolverVar) -> String {
    format!("|{}|", v.name().replace('|', "_"))
}

fn render(out: &mut String, f: &Formula) {
    match f {
        Formula::Int(n) if *n < 0 => out.push_str(&format!("(- {})", n.unsigned_abs())),
        Formula::Int(n) => out.push_str(&n.to_string()),
        Formula::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Formula::Var(v) => out.push_str(&symbol(v)),
        Formula::App(op, args) => {
            out.push('(');
            out.push_str(match op {
                Op::Add => "+",
                Op::Sub => "-",
                Op::Mul => "*",
                Op::Eq => "=",
                Op::Lt => "<",
                Op::Gt => ">",
                Op::And => "and",
                Op::Or => "or",
                Op::Not => "not",
            });
            for a in args {
                out.push(' ');
                render(out, a);
            }
            out.push(')');
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' | ')' => tokens.push(c.to_string()),
            '|' => {
                let mut atom = String::new();
                for q in chars.by_ref() {
                    if q == '|' {
                        break;
                    }
                    atom.push(q);
                }
                tokens.push(atom);
            }
            c if c.is_whitespace() => {}
            c => {
                let mut atom = c.to_string();
                while let Some(&n) = chars.peek() {
                    if n == '(' || n == ')' || n.is_whitespace() {
                        break;
                    }
                    atom.push(n);
                    chars.next();
                }
                tokens.push(atom);
            }
        }
    }
    tokens
}

fn parse_sexp(tokens: &[String], pos: &mut usize) -> Option<Sexp> {
    let tok = tokens.get(*pos)?;
    *pos += 1;
    match tok.as_str() {
        "(" => {
            let mut items = Vec::new();
            loop {
                if tokens.get(*pos)? == ")" {
                    *pos += 1;
                    return Some(Sexp::List(items));
                }
                items.push(parse_sexp(tokens, pos)?);
            }
        }
        ")" => None,
        atom => Some(Sexp::Atom(atom.to_string())),
    }
}

fn int_value(s: &Sexp) -> Option<i64> {
    match s {
        Sexp::Atom(a) => a.parse().ok(),
        Sexp::List(items) => match items.as_slice() {
            [Sexp::Atom(minus), inner] if minus == "-" => int_value(inner)?.checked_neg(),
            _ => None,
        },
    }
}

/// Reads the verdict and, on `sat`, the `get-value` answer for `vars`.
pub fn parse_output(stdout: &str, vars: &[SolverVar]) -> Result<(CheckResult, BTreeMap<SolverVar, i64>), SolverError> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    let verdict = loop {
        match lines.next() {
            Some("sat") => break CheckResult::Sat,
            Some("unsat") => break CheckResult::Unsat,
            Some("unknown") | Some("timeout") => break CheckResult::Unknown("z3 returned unknown".to_string()),
            Some(l) if l.starts_with("(error") => return Err(backend_error(l.to_string())),
            Some(_) => continue,
            None => return Err(backend_error(format!("no verdict in z3 output: {stdout}"))),
        }
    };
    if verdict != CheckResult::Sat || vars.is_empty() {
        return Ok((verdict, BTreeMap::new()));
    }

    let rest: Vec<&str> = lines.collect();
    let tokens = tokenize(&rest.join("\n"));
    let Some(Sexp::List(pairs)) = parse_sexp(&tokens, &mut 0) else {
        return Err(backend_error(format!("unreadable model: {}", rest.join(" "))));
    };
    if pairs.len() != vars.len() {
        return Err(backend_error(format!("expected {} values, got {}", vars.len(), pairs.len())));
    }
    let mut values = BTreeMap::new();
    for (var, pair) in vars.iter().zip(&pairs) {
        let value = match pair {
            Sexp::List(kv) if kv.len() == 2 => int_value(&kv[1]),
            _ => None,
        }
        .ok_or_else(|| SolverError::NonInteger { var: var.name() })?;
        values.insert(var.clone(), value);
    }
    Ok((verdict, values))
}

impl SmtBackend for Z3Cli {
    fn name(&self) -> &'static str {
        "z3-cli"
    }

    fn reset(&mut self) {
        self.assertions.clear();
        self.values = None;
    }

    fn assert(&mut self, formula: &Formula) -> Result<(), SolverError> {
        self.assertions.push(formula.clone());
        Ok(())
    }

    fn check_sat(&mut self) -> Result<CheckResult, SolverError> {
        let mut vars: Vec<SolverVar> = Vec::new();
        for f in &self.assertions {
            for v in f.vars() {
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
        }
        let script = render_script(&self.assertions, &vars);
        trace!("z3-cli script:\n{script}");
        let (verdict, values) = parse_output(&self.run(&script)?, &vars)?;
        debug!("z3-cli: {verdict:?}");
        self.values = (verdict == CheckResult::Sat).then_some(values);
        Ok(verdict)
    }

    fn model(&mut self, vars: &[SolverVar]) -> Result<Model, SolverError> {
        let values = self
            .values
            .as_ref()
            .ok_or_else(|| backend_error("no model available".to_string()))?;
        Ok(vars
            .iter()
            .map(|v| (v.clone(), values.get(v).copied().unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testgen_ast::SymVarId;

    fn x(n: u32) -> SolverVar {
        SolverVar::Sym(SymVarId(n))
    }

    #[test]
    fn script_declares_asserts_and_asks_for_values() {
        let f = Formula::App(
            Op::And,
            vec![
                Formula::App(Op::Gt, vec![Formula::Var(x(0)), Formula::Int(-3)]),
                Formula::not(Formula::App(Op::Eq, vec![Formula::Var(SolverVar::Named("n".into())), Formula::Int(0)])),
            ],
        );
        let script = render_script(&[f], &[x(0), SolverVar::Named("n".into())]);
        assert!(script.contains("(declare-const |X0| Int)\n(declare-const |n| Int)\n"));
        assert!(script.contains("(assert (and (> |X0| (- 3)) (not (= |n| 0))))\n"));
        assert!(script.ends_with("(check-sat)\n(get-value (|X0| |n|))\n"));
    }

    #[test]
    fn sat_output_yields_values_in_request_order() {
        let out = "sat\n((X0 12)\n (|n| (- 7)))\n";
        let (verdict, values) = parse_output(out, &[x(0), SolverVar::Named("n".into())]).expect("parse");
        assert_eq!(verdict, CheckResult::Sat);
        assert_eq!(values.get(&x(0)), Some(&12));
        assert_eq!(values.get(&SolverVar::Named("n".into())), Some(&-7));
    }

    #[test]
    fn unsat_ignores_the_model_error_that_follows() {
        let out = "unsat\n(error \"line 4 column 10: model is not available\")\n";
        let (verdict, values) = parse_output(out, &[x(0)]).expect("parse");
        assert_eq!(verdict, CheckResult::Unsat);
        assert!(values.is_empty());
    }

    #[test]
    fn errors_before_the_verdict_are_backend_failures() {
        let out = "(error \"line 1 column 2: unknown constant\")\nsat\n";
        assert!(matches!(parse_output(out, &[]), Err(SolverError::Backend { .. })));
    }

    #[test]
    fn non_integer_values_are_rejected() {
        let out = "sat\n((X0 (/ 1 2)))\n";
        assert!(matches!(parse_output(out, &[x(0)]), Err(SolverError::NonInteger { .. })));
    }

    #[test]
    fn missing_executable_is_unavailable() {
        let cfg = SolverConfig {
            z3_path: Some(PathBuf::from("/nonexistent/bin/z3")),
            ..SolverConfig::default()
        };
        assert!(matches!(Z3Cli::from_config(&cfg), Err(SolverError::BackendUnavailable { .. })));
    }
}
