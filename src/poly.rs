use crate::ast::Ast;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::collections::BTreeMap;
use std::ops::{Add, Mul, Neg, Sub};

/// Head of an uninterpreted application.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Head {
    /// `f(x, y)`
    Function(String),
    /// `m[k]`
    Index(String),
    /// `m[k].field`
    IndexField { base: String, field: String },
}

/// An integer-valued leaf of a polynomial.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom {
    Symbol(String),
    App { head: Head, args: Vec<Poly> },
    /// Integer quotient `p / q`.
    Quot(Box<Poly>, Box<Poly>),
    /// Integer remainder `p % q`.
    Rem(Box<Poly>, Box<Poly>),
    /// A subterm with no symbolic meaning, kept verbatim.
    Opaque(Box<Ast>),
}

impl Atom {
    /// Whether the atom is `>= 0` in the unsigned domain. Symbols and state
    /// reads are `uint`; a difference is an unbounded integer, so quotients
    /// and remainders follow the sign of their numerator.
    pub fn is_nonneg(&self) -> bool {
        match self {
            Atom::Symbol(_) | Atom::App { .. } => true,
            Atom::Quot(p, q) => p.is_nonneg() && q.is_nonneg(),
            Atom::Rem(p, _) => p.is_nonneg(),
            Atom::Opaque(ast) => !ast.may_be_negative(),
        }
    }
}

/// Product of atoms with positive exponents, sorted by atom. Empty is `1`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Monomial(Vec<(Atom, u32)>);

impl Monomial {
    pub fn unit() -> Self {
        Monomial(Vec::new())
    }

    pub fn of(atom: Atom) -> Self {
        Monomial(vec![(atom, 1)])
    }

    pub fn is_unit(&self) -> bool {
        self.0.is_empty()
    }

    pub fn factors(&self) -> &[(Atom, u32)] {
        &self.0
    }

    /// Non-negative whenever every atom holds a `uint` value: atoms raised to
    /// an odd power must themselves be non-negative.
    pub fn is_nonneg(&self) -> bool {
        self.0.iter().all(|(atom, exp)| exp % 2 == 0 || atom.is_nonneg())
    }

    fn times(&self, other: &Monomial) -> Monomial {
        let mut merged: BTreeMap<&Atom, u32> = BTreeMap::new();
        for (atom, exp) in self.0.iter().chain(other.0.iter()) {
            *merged.entry(atom).or_insert(0) += exp;
        }
        Monomial(merged.into_iter().map(|(a, e)| (a.clone(), e)).collect())
    }
}

/// A polynomial with exact rational coefficients. Zero coefficients are never
/// stored, so structural equality is polynomial equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Poly {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Poly {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: BigRational) -> Self {
        let mut p = Self::zero();
        p.push(Monomial::unit(), value);
        p
    }

    pub fn integer(value: i64) -> Self {
        Self::constant(BigRational::from_integer(BigInt::from(value)))
    }

    pub fn atom(atom: Atom) -> Self {
        let mut p = Self::zero();
        p.push(Monomial::of(atom), BigRational::one());
        p
    }

    fn push(&mut self, mono: Monomial, coeff: BigRational) {
        if coeff.is_zero() {
            return;
        }
        let slot = self.terms.entry(mono).or_insert_with(BigRational::zero);
        *slot += coeff;
        if slot.is_zero() {
            self.terms.retain(|_, c| !c.is_zero());
        }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &BigRational)> {
        self.terms.iter()
    }

    /// The value, if the polynomial has no atoms.
    pub fn as_constant(&self) -> Option<BigRational> {
        match self.terms.len() {
            0 => Some(BigRational::zero()),
            1 => self.terms.get(&Monomial::unit()).cloned(),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<BigInt> {
        self.as_constant()
            .filter(|c| c.is_integer())
            .map(|c| c.to_integer())
    }

    pub fn constant_term(&self) -> BigRational {
        self.terms
            .get(&Monomial::unit())
            .cloned()
            .unwrap_or_else(BigRational::zero)
    }

    pub fn without_constant(&self) -> Poly {
        let mut p = self.clone();
        p.terms.remove(&Monomial::unit());
        p
    }

    pub fn scale(&self, k: &BigRational) -> Poly {
        let mut p = Poly::zero();
        for (m, c) in &self.terms {
            p.push(m.clone(), c * k);
        }
        p
    }

    pub fn pow(&self, exp: u32) -> Poly {
        let mut acc = Poly::integer(1);
        for _ in 0..exp {
            acc = &acc * self;
        }
        acc
    }

    /// Whether every coefficient is a multiple of `k`.
    pub fn divisible_by(&self, k: &BigInt) -> bool {
        self.terms
            .values()
            .all(|c| c.is_integer() && c.to_integer().is_multiple_of(k))
    }

    /// Provably `>= 0` in the unsigned domain: non-negative coefficients over
    /// non-negative monomials.
    pub fn is_nonneg(&self) -> bool {
        self.terms
            .iter()
            .all(|(m, c)| !c.is_negative() && m.is_nonneg())
    }

    /// Split into `k * q` where `q` has coprime integer coefficients and a
    /// positive leading (first) coefficient. `None` for the zero polynomial.
    pub fn primitive(&self) -> Option<(BigRational, Poly)> {
        let lead = self.terms.values().next()?;
        let denom_lcm = self
            .terms
            .values()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
        let numer_gcd = self.terms.values().fold(BigInt::zero(), |acc, c| {
            let scaled = (c * BigRational::from_integer(denom_lcm.clone())).to_integer();
            acc.gcd(&scaled)
        });
        let mut k = BigRational::new(numer_gcd, denom_lcm);
        if lead.is_negative() {
            k = -k;
        }
        let q = self.scale(&k.recip());
        Some((k, q))
    }

    /// Least common multiple of the coefficient denominators.
    pub fn denominator_lcm(&self) -> BigInt {
        self.terms
            .values()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()))
    }
}

impl<'a> Add<&'a Poly> for &'a Poly {
    type Output = Poly;

    fn add(self, rhs: &'a Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in &rhs.terms {
            out.push(m.clone(), c.clone());
        }
        out
    }
}

impl<'a> Sub<&'a Poly> for &'a Poly {
    type Output = Poly;

    fn sub(self, rhs: &'a Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in &rhs.terms {
            out.push(m.clone(), -c);
        }
        out
    }
}

impl<'a> Mul<&'a Poly> for &'a Poly {
    type Output = Poly;

    fn mul(self, rhs: &'a Poly) -> Poly {
        let mut out = Poly::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &rhs.terms {
                out.push(m1.times(m2), c1 * c2);
            }
        }
        out
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        self.scale(&-BigRational::one())
    }
}
