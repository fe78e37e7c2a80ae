use crate::config::Config;
use crate::error::SindiError;
use crate::prepared::{Frontend, Prepared};
use crate::simplify::Simplifier;
use crate::solver::{FourierMotzkin, Solver, SolverResult};
use crate::symbolic::{to_formula, Formula};
use log::debug;
use serde::Serialize;
use std::fmt;

/// Relative strength of two predicates. The `Display` forms are stable and
/// meant to be matched on by batch tooling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Equivalent,
    FirstStronger,
    SecondStronger,
    /// No relation could be established. Not a proof that none exists.
    Incomparable,
    Error(String),
}

impl Verdict {
    pub fn from_directions(forward: bool, backward: bool) -> Verdict {
        match (forward, backward) {
            (true, true) => Verdict::Equivalent,
            (true, false) => Verdict::FirstStronger,
            (false, true) => Verdict::SecondStronger,
            (false, false) => Verdict::Incomparable,
        }
    }

    /// The verdict for the same pair with the arguments swapped.
    pub fn reversed(&self) -> Verdict {
        match self {
            Verdict::FirstStronger => Verdict::SecondStronger,
            Verdict::SecondStronger => Verdict::FirstStronger,
            other => other.clone(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Verdict::Equivalent => "equivalent",
            Verdict::FirstStronger => "first-stronger",
            Verdict::SecondStronger => "second-stronger",
            Verdict::Incomparable => "incomparable",
            Verdict::Error(_) => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Verdict::Error(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Equivalent => f.write_str("The predicates are equivalent."),
            Verdict::FirstStronger => f.write_str("The first predicate is stronger."),
            Verdict::SecondStronger => f.write_str("The second predicate is stronger."),
            Verdict::Incomparable => f.write_str("The predicates are incomparable."),
            Verdict::Error(reason) => write!(f, "Error: {reason}"),
        }
    }
}

/// A predicate-strength decision procedure. `compare` never fails: errors
/// come back as `Verdict::Error`.
pub trait Compare: Send + Sync {
    fn compare(&self, first: &str, second: &str) -> Verdict {
        self.explain(first, second).verdict
    }

    fn explain(&self, first: &str, second: &str) -> Comparison;
}

/// A verdict with the evidence behind it.
#[derive(Clone, Debug, Serialize)]
pub struct Comparison {
    pub verdict: Verdict,
    pub first: Option<Prepared>,
    pub second: Option<Prepared>,
    /// What proved "first implies second", if anything did.
    pub forward: Option<String>,
    /// What proved "second implies first", if anything did.
    pub backward: Option<String>,
    /// Sub-expressions that were compared as uninterpreted atoms.
    pub opaque: Vec<String>,
}

impl Comparison {
    pub(crate) fn failed(error: SindiError) -> Comparison {
        Comparison {
            verdict: Verdict::Error(error.to_string()),
            first: None,
            second: None,
            forward: None,
            backward: None,
            opaque: Vec::new(),
        }
    }

    pub(crate) fn decided(
        first: Prepared,
        second: Prepared,
        forward: Option<String>,
        backward: Option<String>,
    ) -> Comparison {
        Comparison {
            verdict: Verdict::from_directions(forward.is_some(), backward.is_some()),
            first: Some(first),
            second: Some(second),
            forward,
            backward,
            opaque: Vec::new(),
        }
    }
}

/// Prepare both predicates, short-circuiting on structural equality.
pub(crate) fn prepare_pair(
    frontend: &Frontend,
    first: &str,
    second: &str,
) -> Result<(Prepared, Prepared), Comparison> {
    let first = frontend.prepare(first).map_err(Comparison::failed)?;
    let second = frontend.prepare(second).map_err(Comparison::failed)?;
    if first.canonical == second.canonical {
        let same = Some("structural".to_string());
        return Err(Comparison::decided(first, second, same.clone(), same));
    }
    Ok((first, second))
}

/// Decides strength by refuting `A && !B`: first by simplification, then by
/// asking the solver. An inconclusive solver leaves the direction unproven.
pub struct Comparator {
    frontend: Frontend,
    simplifier: Simplifier,
    solver: Box<dyn Solver>,
    config: Config,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator")
            .field("solver", &self.solver.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Comparator {
    pub fn new(config: Config) -> Self {
        Self {
            frontend: Frontend::new(&config),
            simplifier: Simplifier::new(&config),
            solver: Box::new(FourierMotzkin),
            config,
        }
    }

    pub fn with_frontend(mut self, frontend: Frontend) -> Self {
        self.frontend = frontend;
        self
    }

    pub fn with_solver<S>(mut self, solver: S) -> Self
    where
        S: Solver + 'static,
    {
        self.solver = Box::new(solver);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// How `a => b` was proven, if it was.
    fn implies(&self, a: &Formula, b: &Formula) -> Option<String> {
        let query = self
            .simplifier
            .formula(&Formula::And(vec![a.clone(), b.clone().negated()]));
        if self.config.trace {
            debug!(target: "sindi::compare", "refuting {query}");
        }
        if query.is_const(false) {
            return Some("simplifier".to_string());
        }
        if query.is_const(true) {
            return None;
        }
        let result = self
            .solver
            .check(&query, self.config.domain, &self.config.limits);
        if self.config.trace || result == SolverResult::Unknown {
            debug!(target: "sindi::compare", "{} answered {result:?}", self.solver.name());
        }
        (result == SolverResult::Unsat).then(|| format!("solver:{}", self.solver.name()))
    }
}

impl Compare for Comparator {
    fn explain(&self, first: &str, second: &str) -> Comparison {
        let (p1, p2) = match prepare_pair(&self.frontend, first, second) {
            Ok(pair) => pair,
            Err(done) => return done,
        };
        let (a, b) = match (to_formula(&p1.canonical), to_formula(&p2.canonical)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => return Comparison::failed(e.into()),
        };
        let forward = self.implies(&a.value, &b.value);
        let backward = self.implies(&b.value, &a.value);
        let mut comparison = Comparison::decided(p1, p2, forward, backward);
        comparison.opaque = a
            .issues
            .iter()
            .chain(&b.issues)
            .map(|issue| issue.to_string())
            .collect();
        if self.config.trace {
            debug!(target: "sindi::compare", "{first:?} vs {second:?}: {}", comparison.verdict);
        }
        comparison
    }
}
