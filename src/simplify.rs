use crate::ast::Ast;
use crate::config::{Config, Domain};
use crate::error::ConversionError;
use crate::poly::Poly;
use crate::symbolic::{
    effective_lo, from_symbolic, to_symbolic, Bound, Constraint, Conversion, Formula, SymExpr,
};
use log::{debug, trace};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::collections::{BTreeMap, BTreeSet};

const MAX_ROUNDS: usize = 8;

/// Simplify with the default configuration.
pub fn simplify(ast: &Ast) -> Result<Ast, ConversionError> {
    Simplifier::default()
        .simplify(ast)
        .map(|conversion| conversion.value)
}

/// Constant folding, tautology/contradiction collapsing and bound merging over
/// the symbolic form.
#[derive(Clone, Debug, Default)]
pub struct Simplifier {
    domain: Domain,
    trace: bool,
}

impl Simplifier {
    pub fn new(config: &Config) -> Self {
        Self {
            domain: config.domain,
            trace: config.trace,
        }
    }

    /// Convert, simplify and decode. Opaque subterms are reported in `issues`.
    pub fn simplify(&self, ast: &Ast) -> Result<Conversion<Ast>, ConversionError> {
        let conversion = to_symbolic(ast)?;
        if self.trace {
            for issue in &conversion.issues {
                debug!(target: "sindi::simplify", "kept opaque: {issue}");
            }
        }
        let value = match conversion.value {
            SymExpr::Formula(f) => SymExpr::Formula(self.formula(&f)),
            term => term,
        };
        Ok(Conversion {
            value: from_symbolic(&value),
            issues: conversion.issues,
        })
    }

    /// Simplify a formula to a fixpoint. The result is in negation normal
    /// form: `Not` only wraps propositional atoms.
    pub fn formula(&self, formula: &Formula) -> Formula {
        let unsigned = self.domain.is_unsigned();
        let mut current = formula.clone();
        for round in 0..MAX_ROUNDS {
            let next = step(current.clone(), unsigned);
            if next == current {
                break;
            }
            if self.trace {
                trace!(target: "sindi::simplify", "round {round}: {next}");
            }
            current = next;
        }
        current
    }
}

fn step(formula: Formula, unsigned: bool) -> Formula {
    match formula {
        Formula::Cmp(c) => match c.decide(unsigned) {
            Some(b) => Formula::Const(b),
            None => Formula::Cmp(c),
        },
        Formula::Not(x) => negate(step(*x, unsigned)),
        Formula::And(xs) => combine(
            xs.into_iter().map(|x| step(x, unsigned)).collect(),
            Junction::All,
            unsigned,
        ),
        Formula::Or(xs) => combine(
            xs.into_iter().map(|x| step(x, unsigned)).collect(),
            Junction::Any,
            unsigned,
        ),
        leaf => leaf,
    }
}

/// Push a negation one level down.
pub fn negate(formula: Formula) -> Formula {
    match formula {
        Formula::Const(b) => Formula::Const(!b),
        Formula::Not(x) => *x,
        Formula::Cmp(c) => c.negate(),
        Formula::And(xs) => Formula::Or(xs.into_iter().map(negate).collect()),
        Formula::Or(xs) => Formula::And(xs.into_iter().map(negate).collect()),
        prop @ Formula::Prop(_) => Formula::Not(Box::new(prop)),
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Junction {
    All,
    Any,
}

impl Junction {
    /// The identity element: `true` for conjunction, `false` for disjunction.
    fn unit(self) -> bool {
        self == Junction::All
    }

    fn build(self, parts: Vec<Formula>) -> Formula {
        match self {
            Junction::All => Formula::And(parts),
            Junction::Any => Formula::Or(parts),
        }
    }

    fn dual_parts(self, formula: &Formula) -> Option<&[Formula]> {
        match (self, formula) {
            (Junction::All, Formula::Or(xs)) | (Junction::Any, Formula::And(xs)) => Some(xs),
            _ => None,
        }
    }
}

fn combine(parts: Vec<Formula>, junction: Junction, unsigned: bool) -> Formula {
    let unit = junction.unit();
    let mut flat = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            Formula::Const(b) if b == unit => {}
            Formula::Const(_) => return Formula::Const(!unit),
            Formula::And(xs) if junction == Junction::All => flat.extend(xs),
            Formula::Or(xs) if junction == Junction::Any => flat.extend(xs),
            other => flat.push(other),
        }
    }
    flat.sort();
    flat.dedup();

    let complementary = flat.iter().any(|f| match f {
        Formula::Not(inner) => flat.binary_search(inner).is_ok(),
        _ => false,
    });
    if complementary {
        return Formula::Const(!unit);
    }

    // Absorption: `p && (p || q)` is `p`, `p || (p && q)` is `p`.
    let present = flat.clone();
    flat.retain(|f| match junction.dual_parts(f) {
        Some(xs) => !xs.iter().any(|x| present.binary_search(x).is_ok()),
        None => true,
    });

    let mut groups: BTreeMap<Poly, Vec<Bound>> = BTreeMap::new();
    let mut out = Vec::with_capacity(flat.len());
    for f in flat {
        match f {
            Formula::Cmp(c) => groups.entry(c.poly).or_default().push(c.bound),
            other => out.push(other),
        }
    }
    for (poly, bounds) in groups {
        let nonneg = unsigned && poly.is_nonneg();
        let merged = match junction {
            Junction::All => intersect(bounds, nonneg),
            Junction::Any => unite(bounds, nonneg),
        };
        match merged {
            Merged::Always if unit => {}
            Merged::Never if !unit => {}
            Merged::Always | Merged::Never => return Formula::Const(!unit),
            Merged::Bounds(bounds) => out.extend(bounds.into_iter().map(|bound| {
                Formula::Cmp(Constraint {
                    poly: poly.clone(),
                    bound,
                })
            })),
        }
    }
    out.sort();
    match out.len() {
        0 => Formula::Const(unit),
        1 => out.remove(0),
        _ => junction.build(out),
    }
}

enum Merged {
    Always,
    Never,
    Bounds(Vec<Bound>),
}

/// Range for output: a lower bound of `0` on a non-negative form says nothing.
fn visible_lo(lo: Option<BigInt>, nonneg: bool) -> Option<BigInt> {
    match lo {
        Some(l) if nonneg && !l.is_positive() => None,
        other => other,
    }
}

fn intersect(bounds: Vec<Bound>, nonneg: bool) -> Merged {
    let mut lo: Option<BigInt> = None;
    let mut hi: Option<BigInt> = None;
    let mut holes = BTreeSet::new();
    for bound in bounds {
        match bound {
            Bound::Range { lo: l, hi: h } => {
                lo = match (lo, l) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    (a, b) => a.or(b),
                };
                hi = match (hi, h) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
            }
            Bound::Ne(v) => {
                holes.insert(v);
            }
        }
    }
    let mut lo = effective_lo(lo.as_ref(), nonneg);
    // A disequality at an end of the range moves that end inward.
    loop {
        let mut moved = false;
        if let Some(l) = lo.as_ref().filter(|l| holes.contains(*l)) {
            lo = Some(l + 1);
            moved = true;
        }
        if let Some(h) = hi.as_ref().filter(|h| holes.contains(*h)) {
            hi = Some(h - 1);
            moved = true;
        }
        if !moved {
            break;
        }
    }
    if let (Some(l), Some(h)) = (&lo, &hi) {
        if h < l {
            return Merged::Never;
        }
    }
    holes.retain(|v| lo.as_ref().map_or(true, |l| v > l) && hi.as_ref().map_or(true, |h| v < h));
    let lo = visible_lo(lo, nonneg);
    let mut out = Vec::new();
    if lo.is_some() || hi.is_some() {
        out.push(Bound::Range { lo, hi });
    }
    out.extend(holes.into_iter().map(Bound::Ne));
    if out.is_empty() {
        Merged::Always
    } else {
        Merged::Bounds(out)
    }
}

fn unite(bounds: Vec<Bound>, nonneg: bool) -> Merged {
    let mut ranges: Vec<(Option<BigInt>, Option<BigInt>)> = Vec::new();
    let mut holes = BTreeSet::new();
    for bound in bounds {
        match bound {
            Bound::Range { lo, hi } => {
                let lo = effective_lo(lo.as_ref(), nonneg);
                let empty = matches!((&lo, &hi), (Some(l), Some(h)) if h < l);
                if !empty {
                    ranges.push((lo, hi));
                }
            }
            Bound::Ne(v) => {
                holes.insert(v);
            }
        }
    }
    if holes.len() > 1 || (nonneg && holes.iter().any(|v| v.is_negative())) {
        return Merged::Always;
    }
    // `None` sorts first, so unbounded-below ranges lead.
    ranges.sort();
    let mut merged: Vec<(Option<BigInt>, Option<BigInt>)> = Vec::new();
    for (lo, hi) in ranges {
        if let Some(last) = merged.last_mut() {
            let touches = match (&last.1, &lo) {
                (None, _) | (_, None) => true,
                (Some(h), Some(l)) => *l <= h + 1,
            };
            if touches {
                last.1 = match (last.1.take(), hi) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    _ => None,
                };
                continue;
            }
        }
        merged.push((lo, hi));
    }
    let contains = |(lo, hi): &(Option<BigInt>, Option<BigInt>), v: &BigInt| {
        lo.as_ref().map_or(true, |l| l <= v) && hi.as_ref().map_or(true, |h| v <= h)
    };
    if let Some(v) = holes.iter().next() {
        if merged.iter().any(|r| contains(r, v)) {
            return Merged::Always;
        }
    }
    let whole = merged.iter().any(|(lo, hi)| {
        hi.is_none()
            && match lo {
                None => true,
                Some(l) => nonneg && l.is_zero(),
            }
    });
    if whole {
        return Merged::Always;
    }
    let mut out: Vec<Bound> = merged
        .into_iter()
        .map(|(lo, hi)| Bound::Range {
            lo: visible_lo(lo, nonneg),
            hi,
        })
        .collect();
    out.extend(holes.into_iter().map(Bound::Ne));
    if out.is_empty() {
        Merged::Never
    } else {
        Merged::Bounds(out)
    }
}
