use crate::ast::{literal_value, rational_to_ast, Ast, BinOp};
use crate::error::{ConversionError, Sort};
use crate::poly::{Atom, Head, Monomial, Poly};
use foldhash::{HashMap, HashMapExt};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;

/// Exponents above this stay symbolic unless the base is a constant.
const MAX_SYMBOLIC_EXPONENT: u32 = 8;
/// Constant powers are folded up to this exponent (`2**256` fits).
const MAX_CONSTANT_EXPONENT: u32 = 1024;

/// An integer range or a disequality over a primitive polynomial.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    /// `lo <= p <= hi`; a missing side is unbounded.
    Range {
        lo: Option<BigInt>,
        hi: Option<BigInt>,
    },
    /// `p != value`
    Ne(BigInt),
}

/// A relation `poly` against integer bounds. `poly` has coprime integer
/// coefficients, no constant term and a positive leading coefficient, so each
/// relation over the same linear form lands on the same key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Constraint {
    pub poly: Poly,
    pub bound: Bound,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Formula {
    Const(bool),
    Prop(Atom),
    Cmp(Constraint),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

/// The symbolic form of a predicate or of a term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymExpr {
    Formula(Formula),
    Term(Poly),
}

/// A converted value together with the constructs that were made opaque on
/// the way.
#[derive(Clone, Debug)]
pub struct Conversion<T> {
    pub value: T,
    pub issues: Vec<ConversionError>,
}

impl Constraint {
    /// Normalize `lhs op rhs`. Relations that do not depend on any atom fold
    /// to a constant.
    pub fn relation(op: BinOp, lhs: &Poly, rhs: &Poly) -> Formula {
        let diff = lhs - rhs;
        let offset = diff.constant_term();
        let linear = diff.without_constant();
        let Some((k, poly)) = linear.primitive() else {
            return Formula::Const(compare_zero(op, &offset));
        };
        // k*q + offset op 0  <=>  q op' -offset/k
        let target = -offset / &k;
        let op = if k.is_negative() { op.mirrored() } else { op };
        let range = |lo: Option<BigInt>, hi: Option<BigInt>| {
            Formula::Cmp(Constraint {
                poly: poly.clone(),
                bound: Bound::Range { lo, hi },
            })
        };
        match op {
            BinOp::Lt => range(None, Some(target.ceil().to_integer() - 1)),
            BinOp::Le => range(None, Some(target.floor().to_integer())),
            BinOp::Gt => range(Some(target.floor().to_integer() + 1), None),
            BinOp::Ge => range(Some(target.ceil().to_integer()), None),
            BinOp::Eq if target.is_integer() => {
                let v = target.to_integer();
                range(Some(v.clone()), Some(v))
            }
            BinOp::Eq => Formula::Const(false),
            BinOp::Ne if target.is_integer() => Formula::Cmp(Constraint {
                poly,
                bound: Bound::Ne(target.to_integer()),
            }),
            _ => Formula::Const(true),
        }
    }

    pub fn range(poly: Poly, lo: Option<BigInt>, hi: Option<BigInt>) -> Constraint {
        Constraint {
            poly,
            bound: Bound::Range { lo, hi },
        }
    }

    /// Whether the polynomial can only take values `>= 0`.
    pub fn is_nonneg(&self, unsigned: bool) -> bool {
        unsigned && self.poly.is_nonneg()
    }

    /// The complement, as a disjunction of constraints.
    pub fn negate(&self) -> Formula {
        match &self.bound {
            Bound::Range { lo, hi } => {
                let mut parts = Vec::new();
                if let Some(lo) = lo {
                    parts.push(Formula::Cmp(Constraint::range(
                        self.poly.clone(),
                        None,
                        Some(lo - 1),
                    )));
                }
                if let Some(hi) = hi {
                    parts.push(Formula::Cmp(Constraint::range(
                        self.poly.clone(),
                        Some(hi + 1),
                        None,
                    )));
                }
                match parts.len() {
                    0 => Formula::Const(false),
                    1 => parts.remove(0),
                    _ => Formula::Or(parts),
                }
            }
            Bound::Ne(v) => Formula::Cmp(Constraint::range(
                self.poly.clone(),
                Some(v.clone()),
                Some(v.clone()),
            )),
        }
    }

    /// Decide the constraint from its bounds alone, if possible.
    pub fn decide(&self, unsigned: bool) -> Option<bool> {
        let nonneg = self.is_nonneg(unsigned);
        match &self.bound {
            Bound::Range { lo, hi } => {
                let floor = effective_lo(lo.as_ref(), nonneg);
                if let (Some(f), Some(h)) = (&floor, hi) {
                    if h < f {
                        return Some(false);
                    }
                }
                let covers_domain = match lo {
                    None => true,
                    Some(l) => nonneg && !l.is_positive(),
                };
                (covers_domain && hi.is_none()).then_some(true)
            }
            Bound::Ne(v) => (nonneg && v.is_negative()).then_some(true),
        }
    }
}

/// The tightest known lower bound, counting `>= 0` for non-negative forms.
pub(crate) fn effective_lo(lo: Option<&BigInt>, nonneg: bool) -> Option<BigInt> {
    match (lo, nonneg) {
        (Some(l), true) => Some(l.max(&BigInt::zero()).clone()),
        (Some(l), false) => Some(l.clone()),
        (None, true) => Some(BigInt::zero()),
        (None, false) => None,
    }
}

fn compare_zero(op: BinOp, value: &BigRational) -> bool {
    let zero = BigRational::zero();
    match op {
        BinOp::Lt => *value < zero,
        BinOp::Le => *value <= zero,
        BinOp::Gt => *value > zero,
        BinOp::Ge => *value >= zero,
        BinOp::Eq => value.is_zero(),
        _ => !value.is_zero(),
    }
}

impl Formula {
    pub fn negated(self) -> Formula {
        Formula::Not(Box::new(self))
    }

    pub fn is_const(&self, value: bool) -> bool {
        matches!(self, Formula::Const(b) if *b == value)
    }
}

/// Convert an AST, choosing a formula unless its root is plainly arithmetic.
pub fn to_symbolic(ast: &Ast) -> Result<Conversion<SymExpr>, ConversionError> {
    let mut bridge = Bridge::default();
    let value = if is_arithmetic(ast) {
        SymExpr::Term(bridge.term(ast)?)
    } else {
        SymExpr::Formula(bridge.formula(ast)?)
    };
    Ok(Conversion {
        value,
        issues: bridge.issues,
    })
}

/// Convert a predicate.
pub fn to_formula(ast: &Ast) -> Result<Conversion<Formula>, ConversionError> {
    let mut bridge = Bridge::default();
    let value = bridge.formula(ast)?;
    Ok(Conversion {
        value,
        issues: bridge.issues,
    })
}

fn is_arithmetic(ast: &Ast) -> bool {
    match ast {
        Ast::Num(_) | Ast::Neg(_) => true,
        Ast::Op { op, .. } => !op.is_relational() && !matches!(op, BinOp::And | BinOp::Or),
        _ => false,
    }
}

fn is_boolean(ast: &Ast) -> bool {
    match ast {
        Ast::Bool(_) | Ast::Not(_) => true,
        Ast::Op { op, .. } => op.is_relational() || matches!(op, BinOp::And | BinOp::Or),
        _ => false,
    }
}

#[derive(Default)]
struct Bridge {
    issues: Vec<ConversionError>,
}

impl Bridge {
    fn mismatch(ast: &Ast, expected: Sort) -> ConversionError {
        ConversionError::SortMismatch {
            node: ast.to_string(),
            expected,
        }
    }

    fn opaque(&mut self, ast: &Ast, reason: &str) -> Atom {
        self.issues.push(ConversionError::Unsupported {
            node: ast.to_string(),
            reason: reason.to_string(),
        });
        Atom::Opaque(Box::new(ast.clone()))
    }

    fn formula(&mut self, ast: &Ast) -> Result<Formula, ConversionError> {
        match ast {
            Ast::Bool(b) => Ok(Formula::Const(*b)),
            Ast::Not(x) => Ok(self.formula(x)?.negated()),
            Ast::Ident(name) => Ok(Formula::Prop(Atom::Symbol(name.clone()))),
            Ast::Call { .. } | Ast::Index { .. } | Ast::Member { .. } => {
                Ok(Formula::Prop(self.application(ast)))
            }
            Ast::Op { op, args } => match op {
                BinOp::And => Ok(Formula::And(self.formulas(args)?)),
                BinOp::Or => Ok(Formula::Or(self.formulas(args)?)),
                BinOp::Eq | BinOp::Ne if args.iter().any(is_boolean) => {
                    let [a, b] = self.pair(ast, args)?;
                    let (a, b) = (self.formula(a)?, self.formula(b)?);
                    let same = Formula::Or(vec![
                        Formula::And(vec![a.clone(), b.clone()]),
                        Formula::And(vec![a.negated(), b.negated()]),
                    ]);
                    Ok(if *op == BinOp::Eq { same } else { same.negated() })
                }
                op if op.is_relational() => {
                    let [a, b] = self.pair(ast, args)?;
                    Ok(Constraint::relation(*op, &self.term(a)?, &self.term(b)?))
                }
                _ => Err(Self::mismatch(ast, Sort::Bool)),
            },
            Ast::Num(_) | Ast::Neg(_) => Err(Self::mismatch(ast, Sort::Bool)),
        }
    }

    fn formulas(&mut self, args: &[Ast]) -> Result<Vec<Formula>, ConversionError> {
        args.iter().map(|a| self.formula(a)).collect()
    }

    fn pair<'a>(&self, ast: &Ast, args: &'a [Ast]) -> Result<[&'a Ast; 2], ConversionError> {
        match args {
            [a, b] => Ok([a, b]),
            _ => Err(ConversionError::Unsupported {
                node: ast.to_string(),
                reason: "relation without exactly two operands".to_string(),
            }),
        }
    }

    fn term(&mut self, ast: &Ast) -> Result<Poly, ConversionError> {
        match ast {
            Ast::Num(text) => match literal_value(text) {
                Some(v) => Ok(Poly::constant(v)),
                None => Ok(Poly::atom(self.opaque(ast, "unreadable literal"))),
            },
            Ast::Ident(name) => Ok(Poly::atom(Atom::Symbol(name.clone()))),
            Ast::Neg(x) => Ok(-&self.term(x)?),
            Ast::Call { .. } | Ast::Index { .. } | Ast::Member { .. } => {
                Ok(Poly::atom(self.application(ast)))
            }
            Ast::Bool(_) | Ast::Not(_) => Err(Self::mismatch(ast, Sort::Int)),
            Ast::Op { op, args } => match op {
                BinOp::Add | BinOp::Mul => {
                    let mut parts = args.iter();
                    let mut acc = match parts.next() {
                        Some(first) => self.term(first)?,
                        None => Poly::zero(),
                    };
                    for arg in parts {
                        let next = self.term(arg)?;
                        acc = if *op == BinOp::Add {
                            &acc + &next
                        } else {
                            &acc * &next
                        };
                    }
                    Ok(acc)
                }
                BinOp::Sub => {
                    let [a, b] = self.pair(ast, args)?;
                    Ok(&self.term(a)? - &self.term(b)?)
                }
                BinOp::Div => {
                    let [a, b] = self.pair(ast, args)?;
                    let (p, q) = (self.term(a)?, self.term(b)?);
                    Ok(self.divide(ast, p, q))
                }
                BinOp::Mod => {
                    let [a, b] = self.pair(ast, args)?;
                    let (p, q) = (self.term(a)?, self.term(b)?);
                    Ok(self.remainder(ast, p, q))
                }
                BinOp::Pow => {
                    let [a, b] = self.pair(ast, args)?;
                    let (base, exp) = (self.term(a)?, self.term(b)?);
                    Ok(self.power(ast, base, exp))
                }
                BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => {
                    let [a, b] = self.pair(ast, args)?;
                    let (p, q) = (self.term(a)?, self.term(b)?);
                    match (p.as_integer(), q.as_integer()) {
                        (Some(x), Some(y)) if !x.is_negative() && !y.is_negative() => {
                            let v = match op {
                                BinOp::BitAnd => x & y,
                                BinOp::BitOr => x | y,
                                _ => x ^ y,
                            };
                            Ok(Poly::constant(BigRational::from_integer(v)))
                        }
                        _ => Ok(Poly::atom(self.opaque(ast, "bitwise operator"))),
                    }
                }
                _ => Err(Self::mismatch(ast, Sort::Int)),
            },
        }
    }

    fn divide(&mut self, ast: &Ast, p: Poly, q: Poly) -> Poly {
        if let Some(d) = q.as_constant() {
            if d.is_zero() {
                return Poly::atom(self.opaque(ast, "division by zero"));
            }
            if let Some(n) = p.as_constant() {
                // Integer operands divide like the EVM: truncated.
                if n.is_integer() && d.is_integer() {
                    let v = n.to_integer() / d.to_integer();
                    return Poly::constant(BigRational::from_integer(v));
                }
                return Poly::constant(n / d);
            }
            if d.is_integer() && p.divisible_by(&d.to_integer()) {
                return p.scale(&d.recip());
            }
        }
        Poly::atom(Atom::Quot(Box::new(p), Box::new(q)))
    }

    fn remainder(&mut self, ast: &Ast, p: Poly, q: Poly) -> Poly {
        match (p.as_integer(), q.as_integer()) {
            (_, Some(d)) if d.is_zero() => Poly::atom(self.opaque(ast, "modulo by zero")),
            (Some(n), Some(d)) => Poly::constant(BigRational::from_integer(n % d)),
            (_, Some(d)) if d.is_one() => Poly::zero(),
            _ => Poly::atom(Atom::Rem(Box::new(p), Box::new(q))),
        }
    }

    fn power(&mut self, ast: &Ast, base: Poly, exp: Poly) -> Poly {
        let exp = exp
            .as_integer()
            .filter(|e| !e.is_negative())
            .and_then(|e| e.to_u32());
        match exp {
            Some(e) if base.as_constant().is_some() && e <= MAX_CONSTANT_EXPONENT => base.pow(e),
            Some(e) if e <= MAX_SYMBOLIC_EXPONENT => base.pow(e),
            _ => Poly::atom(self.opaque(ast, "non-constant or oversized exponent")),
        }
    }

    /// Calls, mapping reads and indexed fields become uninterpreted
    /// applications; anything else is kept opaque.
    fn application(&mut self, ast: &Ast) -> Atom {
        let (head, args): (Head, Vec<&Ast>) = match ast {
            Ast::Call { callee, args } => match callee.as_ref() {
                Ast::Ident(name) => (Head::Function(name.clone()), args.iter().collect()),
                _ => return self.opaque(ast, "call through an expression"),
            },
            Ast::Index { base, index } => match base.as_ref() {
                Ast::Ident(name) => (Head::Index(name.clone()), vec![index.as_ref()]),
                _ => return self.opaque(ast, "nested index"),
            },
            Ast::Member { base, field } => match base.as_ref() {
                Ast::Index { base, index } => match base.as_ref() {
                    Ast::Ident(name) => (
                        Head::IndexField {
                            base: name.clone(),
                            field: field.clone(),
                        },
                        vec![index.as_ref()],
                    ),
                    _ => return self.opaque(ast, "nested index"),
                },
                _ => return self.opaque(ast, "member of a computed value"),
            },
            _ => return self.opaque(ast, "not an application"),
        };
        let mut polys = Vec::with_capacity(args.len());
        for arg in args {
            if is_boolean(arg) {
                return self.opaque(ast, "boolean argument");
            }
            match self.term(arg) {
                Ok(p) => polys.push(p),
                Err(e) => {
                    self.issues.push(e);
                    return Atom::Opaque(Box::new(ast.clone()));
                }
            }
        }
        Atom::App { head, args: polys }
    }
}

/// Decode back into an AST.
pub fn from_symbolic(expr: &SymExpr) -> Ast {
    match expr {
        SymExpr::Formula(f) => formula_to_ast(f),
        SymExpr::Term(p) => poly_to_ast(p),
    }
}

pub fn formula_to_ast(f: &Formula) -> Ast {
    match f {
        Formula::Const(b) => Ast::Bool(*b),
        Formula::Prop(atom) => atom_to_ast(atom),
        Formula::Cmp(c) => constraint_to_ast(c),
        Formula::Not(x) => Ast::not(formula_to_ast(x)),
        Formula::And(xs) => join(BinOp::And, xs.iter().map(formula_to_ast).collect()),
        Formula::Or(xs) => join(BinOp::Or, xs.iter().map(formula_to_ast).collect()),
    }
}

fn join(op: BinOp, mut args: Vec<Ast>) -> Ast {
    match args.len() {
        0 => Ast::Bool(op == BinOp::And),
        1 => args.remove(0),
        _ => Ast::Op { op, args },
    }
}

fn constraint_to_ast(c: &Constraint) -> Ast {
    match &c.bound {
        Bound::Range {
            lo: Some(lo),
            hi: Some(hi),
        } if lo == hi => relation_to_ast(BinOp::Eq, &c.poly, lo),
        Bound::Range { lo, hi } => {
            let mut parts = Vec::new();
            if let Some(lo) = lo {
                parts.push(relation_to_ast(BinOp::Ge, &c.poly, lo));
            }
            if let Some(hi) = hi {
                parts.push(relation_to_ast(BinOp::Le, &c.poly, hi));
            }
            join(BinOp::And, parts)
        }
        Bound::Ne(v) => relation_to_ast(BinOp::Ne, &c.poly, v),
    }
}

/// `poly op value`, with negative terms moved across so both sides read as
/// sums of positive terms.
fn relation_to_ast(op: BinOp, poly: &Poly, value: &BigInt) -> Ast {
    let mut lhs = Vec::new();
    let mut rhs = Vec::new();
    for (m, c) in poly.terms() {
        if c.is_negative() {
            rhs.push(monomial_to_ast(&-c, m));
        } else {
            lhs.push(monomial_to_ast(c, m));
        }
    }
    let value = BigRational::from_integer(value.clone());
    if value.is_negative() {
        lhs.push(rational_to_ast(&-value));
    } else if !value.is_zero() {
        rhs.push(rational_to_ast(&value));
    }
    Ast::binary(op, sum(lhs), sum(rhs))
}

fn sum(mut parts: Vec<Ast>) -> Ast {
    match parts.len() {
        0 => Ast::num("0"),
        1 => parts.remove(0),
        _ => Ast::Op {
            op: BinOp::Add,
            args: parts,
        },
    }
}

pub fn poly_to_ast(p: &Poly) -> Ast {
    let mut pos = Vec::new();
    let mut neg = Vec::new();
    for (m, c) in p.terms() {
        if c.is_negative() {
            neg.push(monomial_to_ast(&-c, m));
        } else {
            pos.push(monomial_to_ast(c, m));
        }
    }
    let mut neg = neg.into_iter();
    let mut acc = if pos.is_empty() {
        match neg.next() {
            Some(first) => Ast::Neg(Box::new(first)),
            None => return Ast::num("0"),
        }
    } else {
        sum(pos)
    };
    for n in neg {
        acc = Ast::binary(BinOp::Sub, acc, n);
    }
    acc
}

/// `coeff * m` for a positive coefficient.
fn monomial_to_ast(coeff: &BigRational, m: &Monomial) -> Ast {
    if m.is_unit() {
        return rational_to_ast(coeff);
    }
    let mut factors: Vec<Ast> = m
        .factors()
        .iter()
        .map(|(atom, exp)| {
            let base = atom_to_ast(atom);
            if *exp == 1 {
                base
            } else {
                Ast::binary(BinOp::Pow, base, Ast::Num(exp.to_string()))
            }
        })
        .collect();
    if !coeff.numer().is_one() {
        factors.insert(0, Ast::Num(coeff.numer().to_string()));
    }
    let product = match factors.len() {
        1 => factors.remove(0),
        _ => Ast::Op {
            op: BinOp::Mul,
            args: factors,
        },
    };
    if coeff.is_integer() {
        product
    } else {
        Ast::binary(BinOp::Div, product, Ast::Num(coeff.denom().to_string()))
    }
}

pub fn atom_to_ast(atom: &Atom) -> Ast {
    match atom {
        Atom::Symbol(name) => Ast::Ident(name.clone()),
        Atom::App { head, args } => {
            let mut args: Vec<Ast> = args.iter().map(poly_to_ast).collect();
            match head {
                Head::Function(name) => Ast::call(name, args),
                Head::Index(name) => Ast::Index {
                    base: Box::new(Ast::ident(name)),
                    index: Box::new(args.pop().unwrap_or_else(|| Ast::num("0"))),
                },
                Head::IndexField { base, field } => Ast::Member {
                    base: Box::new(Ast::Index {
                        base: Box::new(Ast::ident(base)),
                        index: Box::new(args.pop().unwrap_or_else(|| Ast::num("0"))),
                    }),
                    field: field.clone(),
                },
            }
        }
        Atom::Quot(p, q) => Ast::binary(BinOp::Div, poly_to_ast(p), poly_to_ast(q)),
        Atom::Rem(p, q) => Ast::binary(BinOp::Mod, poly_to_ast(p), poly_to_ast(q)),
        Atom::Opaque(ast) => ast.as_ref().clone(),
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", formula_to_ast(self))
    }
}

impl fmt::Display for SymExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", from_symbolic(self))
    }
}

/// Assigns every atom a unique identifier-safe name: separators become `_`
/// and collisions get a numeric suffix.
#[derive(Debug, Default)]
pub struct SymbolTable {
    names: HashMap<String, String>,
    taken: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            names: HashMap::new(),
            taken: HashMap::new(),
        }
    }

    pub fn name(&mut self, raw: &str) -> String {
        if let Some(safe) = self.names.get(raw) {
            return safe.clone();
        }
        let base = safe_name(raw);
        let count = self.taken.entry(base.clone()).or_insert(0);
        let safe = if *count == 0 {
            base.clone()
        } else {
            format!("{base}_{count}")
        };
        *count += 1;
        self.names.insert(raw.to_string(), safe.clone());
        safe
    }

    /// Name for an atom, keyed on its rendered form.
    pub fn atom_name(&mut self, atom: &Atom) -> String {
        self.name(&atom_to_ast(atom).to_string())
    }
}

/// Replace every character that is not `[A-Za-z0-9_]` with `_`.
pub fn safe_name(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Ceiling division by a positive divisor.
pub(crate) fn ceil_div(n: &BigInt, d: &BigInt) -> BigInt {
    -((-n).div_floor(d))
}
