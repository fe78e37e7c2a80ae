use crate::ast::{Ast, BinOp};
use crate::compare::{prepare_pair, Compare, Comparison};
use crate::config::Config;
use crate::prepared::Frontend;
use log::debug;
use num_rational::BigRational;
use std::cmp::Ordering;

/// A sound test for "the first predicate implies the second" over canonical
/// trees. A rule may miss implications; it must never claim a false one.
pub struct StrengthRule {
    pub name: &'static str,
    pub implies: fn(&Ast, &Ast) -> bool,
}

/// In priority order.
pub static RULES: &[StrengthRule] = &[
    StrengthRule {
        name: "relational-strength",
        implies: relational_strength,
    },
    StrengthRule {
        name: "literal-bound",
        implies: literal_bound,
    },
    StrengthRule {
        name: "conjunction-elimination",
        implies: conjunction_elimination,
    },
    StrengthRule {
        name: "disjunction-introduction",
        implies: disjunction_introduction,
    },
    StrengthRule {
        name: "clause-subsumption",
        implies: clause_subsumption,
    },
];

/// Canonicalization plus the rule library. No algebra and no solver.
#[derive(Debug, Default)]
pub struct RulesComparator {
    frontend: Frontend,
    trace: bool,
}

impl RulesComparator {
    pub fn new(config: &Config) -> Self {
        Self {
            frontend: Frontend::new(config),
            trace: config.trace,
        }
    }

    pub fn with_frontend(mut self, frontend: Frontend) -> Self {
        self.frontend = frontend;
        self
    }

    fn first_rule(&self, a: &Ast, b: &Ast) -> Option<String> {
        let rule = RULES.iter().find(|rule| (rule.implies)(a, b))?;
        if self.trace {
            debug!(target: "sindi::rules", "{} proves {a} => {b}", rule.name);
        }
        Some(format!("rule:{}", rule.name))
    }
}

impl Compare for RulesComparator {
    fn explain(&self, first: &str, second: &str) -> Comparison {
        let (p1, p2) = match prepare_pair(&self.frontend, first, second) {
            Ok(pair) => pair,
            Err(done) => return done,
        };
        let forward = self.first_rule(&p1.canonical, &p2.canonical);
        let backward = self.first_rule(&p2.canonical, &p1.canonical);
        Comparison::decided(p1, p2, forward, backward)
    }
}

/// Whether `a op_a b` implies `a op_b b` for every `a`, `b`.
fn op_implies(a: BinOp, b: BinOp) -> bool {
    use BinOp::*;
    a == b
        || matches!(
            (a, b),
            (Lt, Le) | (Lt, Ne) | (Gt, Ge) | (Gt, Ne) | (Eq, Le) | (Eq, Ge)
        )
}

/// `b`'s operator as seen with `a`'s operand order, if the operands match.
fn aligned<'a>(a: (BinOp, &'a Ast, &'a Ast), b: (BinOp, &'a Ast, &'a Ast)) -> Option<BinOp> {
    let (_, al, ar) = a;
    let (op, bl, br) = b;
    if al == bl && ar == br {
        Some(op)
    } else if al == br && ar == bl {
        Some(op.mirrored())
    } else {
        None
    }
}

fn relational_strength(a: &Ast, b: &Ast) -> bool {
    let (Some(ra), Some(rb)) = (a.relation(), b.relation()) else {
        return false;
    };
    aligned(ra, rb).is_some_and(|op_b| op_implies(ra.0, op_b))
}

/// End of a real interval; `closed` includes the value itself.
#[derive(Clone, Debug)]
struct End {
    value: BigRational,
    closed: bool,
}

impl End {
    /// At least as tight as `outer`, where `inward` orders values further
    /// inside the interval.
    fn within(&self, outer: &End, inward: Ordering) -> bool {
        match self.value.cmp(&outer.value) {
            Ordering::Equal => outer.closed || !self.closed,
            ord => ord == inward,
        }
    }
}

/// The set of reals a relation `term op literal` admits.
#[derive(Clone, Debug)]
enum Region {
    Interval { lo: Option<End>, hi: Option<End> },
    AllBut(BigRational),
}

impl Region {
    fn of(op: BinOp, value: BigRational) -> Region {
        let end = |closed| {
            Some(End {
                value: value.clone(),
                closed,
            })
        };
        match op {
            BinOp::Lt => Region::Interval {
                lo: None,
                hi: end(false),
            },
            BinOp::Le => Region::Interval {
                lo: None,
                hi: end(true),
            },
            BinOp::Gt => Region::Interval {
                lo: end(false),
                hi: None,
            },
            BinOp::Ge => Region::Interval {
                lo: end(true),
                hi: None,
            },
            BinOp::Eq => Region::Interval {
                lo: end(true),
                hi: end(true),
            },
            _ => Region::AllBut(value),
        }
    }

    fn contains(&self, v: &BigRational) -> bool {
        match self {
            Region::AllBut(x) => x != v,
            Region::Interval { lo, hi } => {
                let above = lo
                    .as_ref()
                    .map_or(true, |e| v > &e.value || (e.closed && v == &e.value));
                let below = hi
                    .as_ref()
                    .map_or(true, |e| v < &e.value || (e.closed && v == &e.value));
                above && below
            }
        }
    }

    fn within(&self, outer: &Region) -> bool {
        match (self, outer) {
            (Region::AllBut(x), Region::AllBut(y)) => x == y,
            (Region::AllBut(_), Region::Interval { .. }) => false,
            (inner, Region::AllBut(y)) => !inner.contains(y),
            (Region::Interval { lo: il, hi: ih }, Region::Interval { lo: ol, hi: oh }) => {
                let lo_ok = match (il, ol) {
                    (_, None) => true,
                    (None, Some(_)) => false,
                    (Some(i), Some(o)) => i.within(o, Ordering::Greater),
                };
                let hi_ok = match (ih, oh) {
                    (_, None) => true,
                    (None, Some(_)) => false,
                    (Some(i), Some(o)) => i.within(o, Ordering::Less),
                };
                lo_ok && hi_ok
            }
        }
    }
}

/// `term op literal`, normalized so the literal is on the right.
fn bounded_term(node: &Ast) -> Option<(&Ast, Region)> {
    let (op, lhs, rhs) = node.relation()?;
    if let Some(v) = rhs.literal_value() {
        if lhs.literal_value().is_none() {
            return Some((lhs, Region::of(op, v)));
        }
    }
    let v = lhs.literal_value()?;
    Some((rhs, Region::of(op.mirrored(), v)))
}

fn literal_bound(a: &Ast, b: &Ast) -> bool {
    let (Some((ta, ra)), Some((tb, rb))) = (bounded_term(a), bounded_term(b)) else {
        return false;
    };
    ta == tb && ra.within(&rb)
}

fn operands(node: &Ast, op: BinOp) -> &[Ast] {
    match node {
        Ast::Op { op: own, args } if *own == op => args,
        _ => std::slice::from_ref(node),
    }
}

fn conjunction_elimination(a: &Ast, b: &Ast) -> bool {
    let Ast::Op { op: BinOp::And, args } = a else {
        return false;
    };
    operands(b, BinOp::And).iter().all(|x| args.contains(x))
}

fn disjunction_introduction(a: &Ast, b: &Ast) -> bool {
    let Ast::Op { op: BinOp::Or, args } = b else {
        return false;
    };
    operands(a, BinOp::Or).iter().all(|x| args.contains(x))
}

/// One conjunct implying another, through equality, the relational rules,
/// or the disjuncts of either side.
fn literal_implies(a: &Ast, b: &Ast) -> bool {
    if a == b || relational_strength(a, b) || literal_bound(a, b) {
        return true;
    }
    if let Ast::Op { op: BinOp::Or, args } = b {
        if args.iter().any(|d| literal_implies(a, d)) {
            return true;
        }
    }
    match a {
        Ast::Op { op: BinOp::Or, args } => args.iter().all(|d| literal_implies(d, b)),
        _ => false,
    }
}

fn clause_subsumption(a: &Ast, b: &Ast) -> bool {
    let from = operands(a, BinOp::And);
    operands(b, BinOp::And)
        .iter()
        .all(|goal| from.iter().any(|have| literal_implies(have, goal)))
}
