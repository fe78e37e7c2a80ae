use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Num, One, Zero};
use serde::Serialize;
use std::fmt;

/// Binary (n-ary after flattening) operators, in ascending binding strength.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BitOr,
    BitXor,
    BitAnd,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }

    pub fn from_symbol(s: &str) -> Option<BinOp> {
        let op = match s {
            "||" => BinOp::Or,
            "&&" => BinOp::And,
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            "|" => BinOp::BitOr,
            "^" => BinOp::BitXor,
            "&" => BinOp::BitAnd,
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Mod,
            "**" => BinOp::Pow,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_associative(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or | BinOp::Add)
    }

    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            BinOp::And | BinOp::Or | BinOp::Eq | BinOp::Ne | BinOp::Add | BinOp::Mul
        )
    }

    /// The operator that holds with swapped operands: `a < b` iff `b > a`.
    pub fn mirrored(self) -> BinOp {
        match self {
            BinOp::Lt => BinOp::Gt,
            BinOp::Le => BinOp::Ge,
            BinOp::Gt => BinOp::Lt,
            BinOp::Ge => BinOp::Le,
            other => other,
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 4,
            BinOp::BitOr => 5,
            BinOp::BitXor => 6,
            BinOp::BitAnd => 7,
            BinOp::Add | BinOp::Sub => 8,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 9,
            BinOp::Pow => 11,
        }
    }
}

/// A predicate or term.
///
/// The derived `Ord` compares variant tags first and then fields in order,
/// recursively. It is the canonical sort key for commutative operands: it is
/// total and never conflates structurally different trees.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Ast {
    /// Identifier, possibly a dotted member path (`msg.sender`).
    Ident(String),
    /// Numeric literal as written (`10`, `0.5`, `1e18`, `0xff`).
    Num(String),
    Bool(bool),
    Not(Box<Ast>),
    Neg(Box<Ast>),
    /// Parser output always has two `args`; associative operators may hold more
    /// after canonicalization.
    Op { op: BinOp, args: Vec<Ast> },
    Call { callee: Box<Ast>, args: Vec<Ast> },
    Index { base: Box<Ast>, index: Box<Ast> },
    Member { base: Box<Ast>, field: String },
}

impl Ast {
    pub fn ident(name: &str) -> Ast {
        Ast::Ident(name.to_string())
    }

    pub fn num(text: &str) -> Ast {
        Ast::Num(text.to_string())
    }

    pub fn binary(op: BinOp, lhs: Ast, rhs: Ast) -> Ast {
        Ast::Op {
            op,
            args: vec![lhs, rhs],
        }
    }

    pub fn not(inner: Ast) -> Ast {
        Ast::Not(Box::new(inner))
    }

    pub fn call(name: &str, args: Vec<Ast>) -> Ast {
        Ast::Call {
            callee: Box::new(Ast::ident(name)),
            args,
        }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, Ast::Ident(n) if n == name)
    }

    /// `name(...)` with a plain identifier callee.
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Ast::Call { callee, .. } => match callee.as_ref() {
                Ast::Ident(n) => Some(n),
                _ => None,
            },
            _ => None,
        }
    }

    /// Operands of a relational node.
    pub fn relation(&self) -> Option<(BinOp, &Ast, &Ast)> {
        match self {
            Ast::Op { op, args } if op.is_relational() && args.len() == 2 => {
                Some((*op, &args[0], &args[1]))
            }
            _ => None,
        }
    }

    /// Exact value of a numeric literal.
    pub fn literal_value(&self) -> Option<BigRational> {
        match self {
            Ast::Num(text) => literal_value(text),
            Ast::Neg(inner) => inner.literal_value().map(|v| -v),
            _ => None,
        }
    }

    /// Whether the arithmetic around this node can leave the unsigned range.
    /// Calls, reads and literals are `uint`; only a subtraction or negation
    /// reachable through arithmetic operators can go below zero.
    pub(crate) fn may_be_negative(&self) -> bool {
        match self {
            Ast::Neg(_) => true,
            Ast::Op { op: BinOp::Sub, .. } => true,
            Ast::Op { op, args } => {
                !op.is_relational()
                    && !matches!(op, BinOp::And | BinOp::Or)
                    && args.iter().any(Ast::may_be_negative)
            }
            _ => false,
        }
    }

    pub fn is_zero_literal(&self) -> bool {
        matches!(self, Ast::Num(_)) && self.literal_value().is_some_and(|v| v.is_zero())
    }

    fn precedence(&self) -> u8 {
        match self {
            Ast::Op { op, .. } => op.precedence(),
            Ast::Not(_) => 3,
            Ast::Neg(_) => 10,
            _ => 12,
        }
    }
}

/// Decimal exponents past this are not evaluated; `2**256` needs 78 digits.
const MAX_LITERAL_EXPONENT: u32 = 4096;

/// Parse a literal lexeme into an exact rational. Accepts decimal, decimal
/// fraction, scientific notation, hex and `_` separators. `None` for a lexeme
/// that is malformed or whose scale is out of range.
pub fn literal_value(text: &str) -> Option<BigRational> {
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    if let Some(hex) = clean.strip_prefix("0x").or_else(|| clean.strip_prefix("0X")) {
        return BigInt::from_str_radix(hex, 16).ok().map(BigRational::from_integer);
    }
    let (mantissa, exp) = match clean.find(['e', 'E']) {
        Some(at) => (&clean[..at], clean[at + 1..].parse::<i32>().ok()?),
        None => (clean.as_str(), 0),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let digits = format!("{int_part}{frac_part}");
    if digits.is_empty() {
        return None;
    }
    let value = BigInt::from_str_radix(&digits, 10).ok()?;
    let shift = exp.checked_sub(i32::try_from(frac_part.len()).ok()?)?;
    if shift.unsigned_abs() > MAX_LITERAL_EXPONENT {
        return None;
    }
    let ten = BigInt::from(10u8);
    let scale = num_traits::pow(ten, shift.unsigned_abs() as usize);
    if shift >= 0 {
        Some(BigRational::from_integer(value * scale))
    } else {
        Some(BigRational::new(value, scale))
    }
}

/// Render an exact value as a literal lexeme (`3`, `-3`, `3/4` becomes a division).
pub fn rational_to_ast(value: &BigRational) -> Ast {
    let lit = |n: &BigInt| {
        if n.sign() == num_bigint::Sign::Minus {
            Ast::Neg(Box::new(Ast::Num((-n).to_string())))
        } else {
            Ast::Num(n.to_string())
        }
    };
    if value.denom().is_one() {
        lit(value.numer())
    } else {
        Ast::binary(BinOp::Div, lit(value.numer()), lit(value.denom()))
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Ident(n) | Ast::Num(n) => f.write_str(n),
            Ast::Bool(b) => write!(f, "{b}"),
            Ast::Not(x) => {
                f.write_str("!")?;
                write_operand(f, x, self.precedence(), false)
            }
            Ast::Neg(x) => {
                f.write_str("-")?;
                write_operand(f, x, self.precedence() + 1, false)
            }
            Ast::Op { op, args } => {
                let prec = op.precedence();
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.symbol())?;
                    }
                    // Left-associative: a right operand of equal precedence
                    // needs parentheses; `**` is the other way around.
                    let tight = if *op == BinOp::Pow { i == 0 } else { i > 0 };
                    let tight = tight || op.is_relational();
                    write_operand(f, arg, prec, tight)?;
                }
                Ok(())
            }
            Ast::Call { callee, args } => {
                write_operand(f, callee, 12, false)?;
                f.write_str("(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Ast::Index { base, index } => {
                write_operand(f, base, 12, false)?;
                write!(f, "[{index}]")
            }
            Ast::Member { base, field } => {
                write_operand(f, base, 12, false)?;
                write!(f, ".{field}")
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, node: &Ast, parent: u8, tight: bool) -> fmt::Result {
    let own = node.precedence();
    if own < parent || (tight && own == parent) {
        write!(f, "({node})")
    } else {
        write!(f, "{node}")
    }
}
