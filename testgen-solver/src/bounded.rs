#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use log::debug;

use crate::SolverError;
use crate::backend::{CheckResult, SmtBackend};
use crate::formula::{Formula, Op, SolverVar, Value};
use crate::model::Model;

const NO_MODEL_WITHIN_BOUND: &str = "no model within bound";

/// Pure-Rust backend for offline use and tests.
///
/// Top-level conjuncts of the form `v = n`, `v < n` and `v > n` narrow each
/// variable to an interval; an empty interval is UNSAT. Inside the interval
/// values are tried nearest to its zero-closest point first, at most
/// `2 * bound + 1` per variable. When that window misses part of some
/// interval and nothing satisfies the assertions the answer is `Unknown`,
/// never UNSAT.
#[derive(Debug)]
pub struct BoundedBackend {
    bound: i64,
    max_candidates: u64,
    assertions: Vec<Formula>,
    found: Option<BTreeMap<SolverVar, i64>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Interval {
    lo: i64,
    hi: i64,
}

impl Interval {
    const FULL: Interval = Interval {
        lo: i64::MIN,
        hi: i64::MAX,
    };
    const EMPTY: Interval = Interval {
        lo: i64::MAX,
        hi: i64::MIN,
    };

    fn is_empty(self) -> bool {
        self.lo > self.hi
    }

    fn size(self) -> u128 {
        (i128::from(self.hi) - i128::from(self.lo) + 1).max(0) as u128
    }

    fn at_least(&mut self, n: i64) {
        self.lo = self.lo.max(n);
    }

    fn at_most(&mut self, n: i64) {
        self.hi = self.hi.min(n);
    }

    fn exactly(&mut self, n: i64) {
        self.at_least(n);
        self.at_most(n);
    }

    fn above(&mut self, n: i64) {
        match n.checked_add(1) {
            Some(m) => self.at_least(m),
            None => *self = Interval::EMPTY,
        }
    }

    fn below(&mut self, n: i64) {
        match n.checked_sub(1) {
            Some(m) => self.at_most(m),
            None => *self = Interval::EMPTY,
        }
    }
}

fn flatten<'a>(f: &'a Formula, out: &mut Vec<&'a Formula>) {
    match f {
        Formula::App(Op::And, args) => args.iter().for_each(|a| flatten(a, out)),
        other => out.push(other),
    }
}

/// Narrows `ranges` with every conjunct that compares a variable to a literal.
fn narrow(conjuncts: &[&Formula], ranges: &mut BTreeMap<SolverVar, Interval>) {
    for c in conjuncts {
        let Formula::App(op, args) = c else { continue };
        let (var, n, flipped) = match args.as_slice() {
            [Formula::Var(v), Formula::Int(n)] => (v, *n, false),
            [Formula::Int(n), Formula::Var(v)] => (v, *n, true),
            _ => continue,
        };
        let Some(range) = ranges.get_mut(var) else { continue };
        match (op, flipped) {
            (Op::Eq, _) => range.exactly(n),
            (Op::Gt, false) | (Op::Lt, true) => range.above(n),
            (Op::Lt, false) | (Op::Gt, true) => range.below(n),
            _ => {}
        }
    }
}

/// Up to `width` values of `range`, nearest to its zero-closest point first.
fn domain(range: Interval, width: u64) -> Vec<i64> {
    let center = 0i64.clamp(range.lo, range.hi);
    let mut out = vec![center];
    let mut k: i64 = 1;
    while (out.len() as u64) < width {
        let up = center.checked_add(k).filter(|v| *v <= range.hi);
        let down = center.checked_sub(k).filter(|v| *v >= range.lo);
        if up.is_none() && down.is_none() {
            break;
        }
        out.extend(up);
        if (out.len() as u64) < width {
            out.extend(down);
        }
        k += 1;
    }
    out
}

/// Largest `w` with `w^n <= budget`.
fn per_var_budget(budget: u64, n: u32) -> u64 {
    if n == 0 {
        return budget;
    }
    let mut w = (budget as f64).powf(1.0 / f64::from(n)).floor() as u64;
    while w > 0 && w.checked_pow(n).is_none_or(|p| p > budget) {
        w -= 1;
    }
    while (w + 1).checked_pow(n).is_some_and(|p| p <= budget) {
        w += 1;
    }
    w
}

impl BoundedBackend {
    pub fn new(bound: i64, max_candidates: u64) -> Self {
        Self {
            bound: bound.max(0),
            max_candidates,
            assertions: Vec::new(),
            found: None,
        }
    }

    fn holds(&self, assignment: &BTreeMap<SolverVar, i64>) -> Result<bool, SolverError> {
        for f in &self.assertions {
            match f.eval(assignment) {
                Some(Value::Bool(true)) => {}
                Some(Value::Bool(false)) => return Ok(false),
                _ => {
                    return Err(SolverError::Backend {
                        backend: "bounded",
                        message: format!("assertion does not evaluate to a boolean: {f:?}"),
                    });
                }
            }
        }
        Ok(true)
    }

    fn domains(&self, vars: &[SolverVar]) -> Result<Option<Vec<(Vec<i64>, bool)>>, SolverError> {
        let mut conjuncts = Vec::new();
        self.assertions.iter().for_each(|f| flatten(f, &mut conjuncts));
        let mut ranges: BTreeMap<SolverVar, Interval> = vars.iter().map(|v| (v.clone(), Interval::FULL)).collect();
        narrow(&conjuncts, &mut ranges);
        if ranges.values().any(|r| r.is_empty()) {
            return Ok(None);
        }

        let unfixed = ranges.values().filter(|r| r.size() > 1).count();
        let window = 2 * self.bound.unsigned_abs() + 1;
        let share = per_var_budget(self.max_candidates, u32::try_from(unfixed).unwrap_or(u32::MAX));
        if unfixed > 0 && share < 3 {
            return Err(SolverError::SearchBudgetExhausted {
                vars: unfixed,
                bound: self.bound,
                budget: self.max_candidates,
            });
        }
        let width = window.min(share);
        Ok(Some(
            vars.iter()
                .map(|v| {
                    let range = ranges[v];
                    let values = domain(range, width);
                    let complete = values.len() as u128 == range.size();
                    (values, complete)
                })
                .collect(),
        ))
    }
}

impl SmtBackend for BoundedBackend {
    fn name(&self) -> &'static str {
        "bounded"
    }

    fn reset(&mut self) {
        self.assertions.clear();
        self.found = None;
    }

    fn assert(&mut self, formula: &Formula) -> Result<(), SolverError> {
        self.assertions.push(formula.clone());
        Ok(())
    }

    fn check_sat(&mut self) -> Result<CheckResult, SolverError> {
        self.found = None;
        let mut vars: Vec<SolverVar> = Vec::new();
        for f in &self.assertions {
            for v in f.vars() {
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
        }

        let Some(domains) = self.domains(&vars)? else {
            debug!("bounded: a variable range is empty");
            return Ok(CheckResult::Unsat);
        };
        let complete = domains.iter().all(|(_, c)| *c);
        debug!(
            "bounded: {} vars, domain sizes {:?}",
            vars.len(),
            domains.iter().map(|(d, _)| d.len()).collect::<Vec<_>>()
        );

        let mut digits = vec![0usize; vars.len()];
        loop {
            let assignment: BTreeMap<SolverVar, i64> = vars
                .iter()
                .cloned()
                .zip(digits.iter().zip(&domains).map(|(d, (values, _))| values[*d]))
                .collect();
            if self.holds(&assignment)? {
                self.found = Some(assignment);
                return Ok(CheckResult::Sat);
            }
            let mut carried = true;
            for (d, (values, _)) in digits.iter_mut().zip(&domains) {
                *d += 1;
                if *d < values.len() {
                    carried = false;
                    break;
                }
                *d = 0;
            }
            if carried {
                break;
            }
        }

        Ok(if complete {
            CheckResult::Unsat
        } else {
            CheckResult::Unknown(NO_MODEL_WITHIN_BOUND.to_string())
        })
    }

    fn model(&mut self, vars: &[SolverVar]) -> Result<Model, SolverError> {
        let found = self.found.as_ref().ok_or_else(|| SolverError::Backend {
            backend: "bounded",
            message: "no satisfying assignment to read a model from".to_string(),
        })?;
        Ok(vars
            .iter()
            .map(|v| (v.clone(), found.get(v).copied().unwrap_or(0)))
            .collect())
    }
}
