use crate::config::{Domain, SolverLimits};
use crate::poly::{Atom, Monomial, Poly};
use crate::simplify::negate;
use crate::symbolic::{ceil_div, Bound, Constraint, Formula};
use foldhash::{HashMap, HashMapExt};
use log::trace;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverResult {
    Sat,
    Unsat,
    /// Budget, deadline or cancellation hit before an answer.
    Unknown,
}

/// A satisfiability backend for the implication queries of the full
/// comparator. Implementations must be sound for `Unsat`.
pub trait Solver: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, formula: &Formula, domain: Domain, limits: &SolverLimits) -> SolverResult;
}

/// Case split over disjunctions and disequalities, then Fourier-Motzkin
/// elimination over each cube with integer tightening. Nonlinear monomials
/// are treated as independent variables, so `Sat` may be spurious but `Unsat`
/// is always sound.
#[derive(Copy, Clone, Debug, Default)]
pub struct FourierMotzkin;

impl Solver for FourierMotzkin {
    fn name(&self) -> &'static str {
        "fourier-motzkin"
    }

    fn check(&self, formula: &Formula, domain: Domain, limits: &SolverLimits) -> SolverResult {
        let mut search = Search::new(domain, limits);
        let result = match search.branch(vec![formula.clone()], Cube::default()) {
            Ok(true) => SolverResult::Sat,
            Ok(false) => SolverResult::Unsat,
            Err(Exhausted) => SolverResult::Unknown,
        };
        trace!(target: "sindi::solver", "{result:?} after {} branches", search.branches);
        result
    }
}

struct Exhausted;

#[derive(Clone, Default)]
struct Cube {
    props: BTreeMap<Atom, bool>,
    constraints: Vec<Constraint>,
}

impl Cube {
    /// Record a truth value; `false` on conflict.
    fn assume(&mut self, atom: Atom, value: bool) -> bool {
        !matches!(self.props.insert(atom, value), Some(prev) if prev != value)
    }
}

struct Search<'a> {
    unsigned: bool,
    limits: &'a SolverLimits,
    deadline: Option<Instant>,
    branches: usize,
}

impl<'a> Search<'a> {
    fn new(domain: Domain, limits: &'a SolverLimits) -> Self {
        Self {
            unsigned: domain.is_unsigned(),
            limits,
            deadline: limits.timeout.map(|t| Instant::now() + t),
            branches: 0,
        }
    }

    fn alive(&self) -> Result<(), Exhausted> {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Exhausted);
        }
        if self.limits.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(Exhausted);
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<(), Exhausted> {
        self.branches += 1;
        if self.branches > self.limits.max_branches {
            return Err(Exhausted);
        }
        self.alive()
    }

    /// `Ok(true)` once some cube is feasible.
    fn branch(&mut self, mut pending: Vec<Formula>, mut cube: Cube) -> Result<bool, Exhausted> {
        while let Some(formula) = pending.pop() {
            match formula {
                Formula::Const(true) => {}
                Formula::Const(false) => return Ok(false),
                Formula::Prop(atom) => {
                    if !cube.assume(atom, true) {
                        return Ok(false);
                    }
                }
                Formula::Not(inner) => match *inner {
                    Formula::Prop(atom) => {
                        if !cube.assume(atom, false) {
                            return Ok(false);
                        }
                    }
                    other => pending.push(negate(other)),
                },
                Formula::Cmp(c) => cube.constraints.push(c),
                Formula::And(parts) => pending.extend(parts),
                Formula::Or(parts) => {
                    for part in parts {
                        self.tick()?;
                        let mut next = pending.clone();
                        next.push(part);
                        if self.branch(next, cube.clone())? {
                            return Ok(true);
                        }
                    }
                    return Ok(false);
                }
            }
        }
        self.theory(cube.constraints)
    }

    fn theory(&mut self, constraints: Vec<Constraint>) -> Result<bool, Exhausted> {
        if !self.feasible(&constraints)? {
            return Ok(false);
        }
        let split = constraints
            .iter()
            .enumerate()
            .find_map(|(i, c)| match &c.bound {
                Bound::Ne(v) => Some((i, v.clone())),
                Bound::Range { .. } => None,
            });
        let Some((at, value)) = split else {
            return Ok(true);
        };
        // p != v  <=>  p <= v - 1  ||  p >= v + 1
        let sides = [
            Bound::Range {
                lo: None,
                hi: Some(&value - 1),
            },
            Bound::Range {
                lo: Some(&value + 1),
                hi: None,
            },
        ];
        for side in sides {
            self.tick()?;
            let mut next = constraints.clone();
            next[at].bound = side;
            if self.theory(next)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether the ranges (disequalities ignored) admit a rational solution
    /// after integer tightening.
    fn feasible(&self, constraints: &[Constraint]) -> Result<bool, Exhausted> {
        let mut system = System::new();
        for c in constraints {
            system.constraint(c);
        }
        system.axioms(self.unsigned);
        self.eliminate(system.rows)
    }

    fn eliminate(&self, mut rows: BTreeSet<Row>) -> Result<bool, Exhausted> {
        loop {
            self.alive()?;
            let mut live = BTreeSet::new();
            for row in rows {
                if row.coeffs.is_empty() {
                    if row.constant.is_positive() {
                        return Ok(false);
                    }
                } else {
                    live.insert(row);
                }
            }

            let mut counts: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
            for row in &live {
                for (col, c) in &row.coeffs {
                    let entry = counts.entry(*col).or_default();
                    if c.is_positive() {
                        entry.0 += 1;
                    } else {
                        entry.1 += 1;
                    }
                }
            }
            let Some(col) = counts
                .iter()
                .min_by_key(|(_, (up, down))| up * down)
                .map(|(col, _)| *col)
            else {
                return Ok(true);
            };

            let (with, rest): (Vec<Row>, Vec<Row>) =
                live.into_iter().partition(|r| r.coeffs.contains_key(&col));
            let (upper, lower): (Vec<&Row>, Vec<&Row>) =
                with.iter().partition(|r| r.coeff(col).is_positive());
            let mut next: BTreeSet<Row> = rest.into_iter().collect();
            for u in &upper {
                for l in &lower {
                    let a = u.coeff(col);
                    let b = -l.coeff(col);
                    next.insert(u.scaled(&b).plus(&l.scaled(&a)).tightened());
                    if next.len() > self.limits.max_rows {
                        return Err(Exhausted);
                    }
                }
            }
            trace!(
                target: "sindi::solver",
                "eliminated column {col}: {} rows remain",
                next.len()
            );
            rows = next;
        }
    }
}

/// `sum(coeffs[i] * x_i) + constant <= 0`
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
struct Row {
    coeffs: BTreeMap<usize, BigInt>,
    constant: BigInt,
}

impl Row {
    fn coeff(&self, col: usize) -> BigInt {
        self.coeffs.get(&col).cloned().unwrap_or_else(BigInt::zero)
    }

    fn scaled(&self, k: &BigInt) -> Row {
        Row {
            coeffs: self.coeffs.iter().map(|(c, v)| (*c, v * k)).collect(),
            constant: &self.constant * k,
        }
    }

    fn plus(mut self, other: &Row) -> Row {
        for (col, v) in &other.coeffs {
            *self.coeffs.entry(*col).or_insert_with(BigInt::zero) += v;
        }
        self.constant += &other.constant;
        self
    }

    /// Divide through by the coefficient gcd; the constant rounds up since
    /// every column is integer-valued.
    fn tightened(mut self) -> Row {
        self.coeffs.retain(|_, v| !v.is_zero());
        let g = self
            .coeffs
            .values()
            .fold(BigInt::zero(), |acc, v| acc.gcd(v));
        if g > BigInt::one() {
            for v in self.coeffs.values_mut() {
                *v = &*v / &g;
            }
            self.constant = ceil_div(&self.constant, &g);
        }
        self
    }
}

/// The linear relaxation of one cube: a column per monomial.
struct System {
    columns: HashMap<Monomial, usize>,
    monomials: Vec<Monomial>,
    rows: BTreeSet<Row>,
}

impl System {
    fn new() -> Self {
        Self {
            columns: HashMap::new(),
            monomials: Vec::new(),
            rows: BTreeSet::new(),
        }
    }

    fn column(&mut self, m: &Monomial) -> usize {
        if let Some(&col) = self.columns.get(m) {
            return col;
        }
        let col = self.monomials.len();
        self.columns.insert(m.clone(), col);
        self.monomials.push(m.clone());
        col
    }

    /// Add `p <= 0`.
    fn leq_zero(&mut self, p: &Poly) {
        let scale = BigRational::from_integer(p.denominator_lcm());
        let mut row = Row::default();
        for (m, c) in p.terms() {
            let c = (c * &scale).to_integer();
            if m.is_unit() {
                row.constant += c;
            } else {
                let col = self.column(m);
                *row.coeffs.entry(col).or_insert_with(BigInt::zero) += c;
            }
        }
        self.rows.insert(row.tightened());
    }

    fn constraint(&mut self, c: &Constraint) {
        let Bound::Range { lo, hi } = &c.bound else {
            return;
        };
        if let Some(hi) = hi {
            let hi = Poly::constant(BigRational::from_integer(hi.clone()));
            self.leq_zero(&(&c.poly - &hi));
        }
        if let Some(lo) = lo {
            let lo = Poly::constant(BigRational::from_integer(lo.clone()));
            self.leq_zero(&(&lo - &c.poly));
        }
    }

    /// Domain facts for every column, including columns the facts introduce.
    fn axioms(&mut self, unsigned: bool) {
        let mut done = 0;
        while done < self.monomials.len() {
            let col = done;
            let mono = self.monomials[col].clone();
            done += 1;
            if unsigned && mono.is_nonneg() {
                let mut row = Row::default();
                row.coeffs.insert(col, -BigInt::one());
                self.rows.insert(row);
            }
            if let [(atom, 1)] = mono.factors() {
                self.atom_axioms(atom, unsigned);
            }
        }
    }

    /// Truncated division agrees with floor division only for a numerator
    /// known to be `>= 0`.
    fn atom_axioms(&mut self, atom: &Atom, unsigned: bool) {
        if !unsigned {
            return;
        }
        let divisor = |q: &Poly| q.as_integer().filter(|k| k.is_positive());
        match atom {
            // k*t <= p <= k*t + k - 1
            Atom::Quot(p, q) if p.is_nonneg() => {
                let Some(k) = divisor(q) else { return };
                let kt = Poly::atom(atom.clone()).scale(&BigRational::from_integer(k.clone()));
                let slack = Poly::constant(BigRational::from_integer(k - 1));
                self.leq_zero(&(&kt - p.as_ref()));
                self.leq_zero(&(&(p.as_ref() - &kt) - &slack));
            }
            // r <= p for a non-negative numerator, and r <= k - 1 for a constant modulus
            Atom::Rem(p, q) => {
                let r = Poly::atom(atom.clone());
                if p.is_nonneg() {
                    self.leq_zero(&(&r - p.as_ref()));
                }
                if let Some(k) = divisor(q) {
                    let top = Poly::constant(BigRational::from_integer(k - 1));
                    self.leq_zero(&(&r - &top));
                }
            }
            _ => {}
        }
    }
}
