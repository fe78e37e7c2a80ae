use crate::config::{Domain, SolverLimits};
use crate::poly::{Atom, Head, Poly};
use crate::solver::{Solver, SolverResult};
use crate::symbolic::{poly_to_ast, Bound, Constraint, Formula, SymbolTable};
use num_bigint::BigInt;
use num_traits::One;
use z3::ast::{Ast, Bool, Int};
use z3::{Config, Context, FuncDecl, Params, SatResult, Sort};

/// Z3 over linear and nonlinear integer arithmetic. Applications become
/// uninterpreted functions; quotient and remainder truncate toward zero like
/// the EVM, built from Z3's Euclidean `div`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Z3Solver;

impl Solver for Z3Solver {
    fn name(&self) -> &'static str {
        "z3"
    }

    fn check(&self, formula: &Formula, domain: Domain, limits: &SolverLimits) -> SolverResult {
        if limits.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return SolverResult::Unknown;
        }
        let cfg = Config::new();
        let ctx = Context::new(&cfg);
        let solver = z3::Solver::new(&ctx);
        if let Some(timeout) = limits.timeout {
            let mut params = Params::new(&ctx);
            let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
            params.set_u32("timeout", millis);
            solver.set_params(&params);
        }

        let mut encoder = Encoder::new(&ctx);
        let query = encoder.formula(formula);
        solver.assert(&query);
        if domain.is_unsigned() {
            let zero = Int::from_i64(&ctx, 0);
            for value in &encoder.values {
                solver.assert(&value.ge(&zero));
            }
        }
        match solver.check() {
            SatResult::Sat => SolverResult::Sat,
            SatResult::Unsat => SolverResult::Unsat,
            SatResult::Unknown => SolverResult::Unknown,
        }
    }
}

struct Encoder<'ctx> {
    ctx: &'ctx Context,
    names: SymbolTable,
    /// Integer leaves that hold `uint` values, for the `>= 0` axioms.
    values: Vec<Int<'ctx>>,
}

impl<'ctx> Encoder<'ctx> {
    fn new(ctx: &'ctx Context) -> Self {
        Self {
            ctx,
            names: SymbolTable::new(),
            values: Vec::new(),
        }
    }

    fn formula(&mut self, formula: &Formula) -> Bool<'ctx> {
        match formula {
            Formula::Const(b) => Bool::from_bool(self.ctx, *b),
            Formula::Prop(atom) => {
                let atom_name = self.names.atom_name(atom);
                let name = self.names.name(&format!("prop!{atom_name}"));
                Bool::new_const(self.ctx, name)
            }
            Formula::Cmp(c) => self.constraint(c),
            Formula::Not(x) => self.formula(x).not(),
            Formula::And(xs) => {
                let parts: Vec<Bool<'ctx>> = xs.iter().map(|x| self.formula(x)).collect();
                let refs: Vec<&Bool<'ctx>> = parts.iter().collect();
                Bool::and(self.ctx, &refs)
            }
            Formula::Or(xs) => {
                let parts: Vec<Bool<'ctx>> = xs.iter().map(|x| self.formula(x)).collect();
                let refs: Vec<&Bool<'ctx>> = parts.iter().collect();
                Bool::or(self.ctx, &refs)
            }
        }
    }

    fn constraint(&mut self, c: &Constraint) -> Bool<'ctx> {
        let p = self.poly(&c.poly);
        match &c.bound {
            Bound::Range { lo, hi } => {
                let mut parts = Vec::new();
                if let Some(lo) = lo {
                    parts.push(p.ge(&self.int(lo)));
                }
                if let Some(hi) = hi {
                    parts.push(p.le(&self.int(hi)));
                }
                let refs: Vec<&Bool<'ctx>> = parts.iter().collect();
                Bool::and(self.ctx, &refs)
            }
            Bound::Ne(v) => p._eq(&self.int(v)).not(),
        }
    }

    fn int(&self, v: &BigInt) -> Int<'ctx> {
        Int::from_str(self.ctx, &v.to_string()).unwrap_or_else(|| Int::from_i64(self.ctx, 0))
    }

    fn poly(&mut self, p: &Poly) -> Int<'ctx> {
        if !p.denominator_lcm().is_one() {
            // Fractional coefficients have no integer reading; keep the value opaque.
            return self.leaf(&poly_to_ast(p).to_string(), p.is_nonneg());
        }
        let mut terms = Vec::new();
        for (mono, coeff) in p.terms() {
            let mut factors = vec![self.int(&coeff.to_integer())];
            for (atom, exp) in mono.factors() {
                let value = self.atom(atom);
                for _ in 0..*exp {
                    factors.push(value.clone());
                }
            }
            let refs: Vec<&Int<'ctx>> = factors.iter().collect();
            terms.push(Int::mul(self.ctx, &refs));
        }
        if terms.is_empty() {
            return Int::from_i64(self.ctx, 0);
        }
        let refs: Vec<&Int<'ctx>> = terms.iter().collect();
        Int::add(self.ctx, &refs)
    }

    fn leaf(&mut self, key: &str, nonneg: bool) -> Int<'ctx> {
        let value = Int::new_const(self.ctx, self.names.name(key));
        if nonneg {
            self.values.push(value.clone());
        }
        value
    }

    /// `p / q` rounded toward zero. Euclidean division already truncates for
    /// a non-negative numerator, whatever the divisor's sign.
    fn truncated_div(&self, p: &Int<'ctx>, q: &Int<'ctx>) -> Int<'ctx> {
        let zero = Int::from_i64(self.ctx, 0);
        let flipped = p.unary_minus().div(q).unary_minus();
        p.ge(&zero).ite(&p.div(q), &flipped)
    }

    fn atom(&mut self, atom: &Atom) -> Int<'ctx> {
        let value = match atom {
            Atom::Symbol(_) | Atom::Opaque(_) => {
                let name = self.names.atom_name(atom);
                return self.leaf(&name, atom.is_nonneg());
            }
            Atom::App { head, args } => {
                let name = match head {
                    Head::Function(f) => format!("fn!{f}"),
                    Head::Index(base) => format!("idx!{base}"),
                    Head::IndexField { base, field } => format!("idx!{base}.{field}"),
                };
                let name = self.names.name(&format!("{name}/{}", args.len()));
                let int = Sort::int(self.ctx);
                let domain: Vec<&Sort<'ctx>> = args.iter().map(|_| &int).collect();
                let decl = FuncDecl::new(self.ctx, name.clone(), &domain, &int);
                let encoded: Vec<Int<'ctx>> = args.iter().map(|a| self.poly(a)).collect();
                let refs: Vec<&dyn Ast<'ctx>> =
                    encoded.iter().map(|a| a as &dyn Ast<'ctx>).collect();
                match decl.apply(&refs).as_int() {
                    Some(v) => v,
                    None => return self.leaf(&name, true),
                }
            }
            Atom::Quot(p, q) => {
                let (p, q) = (self.poly(p), self.poly(q));
                self.truncated_div(&p, &q)
            }
            // p - q * (p / q), so the sign follows the numerator
            Atom::Rem(p, q) => {
                let (p, q) = (self.poly(p), self.poly(q));
                let quot = self.truncated_div(&p, &q);
                Int::sub(self.ctx, &[&p, &Int::mul(self.ctx, &[&q, &quot])])
            }
        };
        if atom.is_nonneg() {
            self.values.push(value.clone());
        }
        value
    }
}
