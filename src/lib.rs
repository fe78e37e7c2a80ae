mod ast;
mod canonical;
mod compare;
mod config;
mod error;
mod lexer;
mod parser;
mod poly;
mod prepared;
mod rewrite;
mod rules;
mod simplify;
mod solver;
mod symbolic;
#[cfg(feature = "z3")]
mod z3_solver;

pub use ast::{literal_value, rational_to_ast, Ast, BinOp};
pub use canonical::{canonicalize, AstRewriter};
pub use compare::{Compare, Comparator, Comparison, Verdict};
pub use config::{CancelToken, Config, Domain, SolverLimits};
pub use error::{ConversionError, LexError, SindiError, Sort, SyntaxError};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse, parse_str, Parser};
pub use poly::{Atom, Head, Monomial, Poly};
pub use prepared::{Frontend, Prepared};
pub use rewrite::{Identity, SubstitutionTable, SurfaceRewriter};
pub use rules::{RulesComparator, StrengthRule, RULES};
pub use simplify::{simplify, Simplifier};
pub use solver::{FourierMotzkin, Solver, SolverResult};
pub use symbolic::{
    from_symbolic, safe_name, to_formula, to_symbolic, Bound, Constraint, Conversion, Formula,
    SymExpr, SymbolTable,
};
#[cfg(feature = "z3")]
pub use z3_solver::Z3Solver;

/// Compare with the full comparator and the default configuration.
pub fn compare(first: &str, second: &str) -> Verdict {
    Comparator::default().compare(first, second)
}

/// Compare with the solver-free rules only.
pub fn compare_rules(first: &str, second: &str) -> Verdict {
    RulesComparator::default().compare(first, second)
}
