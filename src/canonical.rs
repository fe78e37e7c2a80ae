use crate::ast::{Ast, BinOp};
use crate::config::Config;
use log::debug;

/// Canonicalize with the default configuration.
pub fn canonicalize(root: &Ast) -> Ast {
    AstRewriter::default().normalize(root)
}

/// Maps an AST to the canonical representative of its
/// commutativity/associativity/trivial-identity class.
///
/// The input is never mutated; every pass consumes a private clone.
#[derive(Clone, Debug, Default)]
pub struct AstRewriter {
    trace: bool,
}

type Pass = fn(Ast) -> Ast;

// Order matters: later passes assume the normal form left by earlier ones.
const PASSES: [(&str, Pass); 9] = [
    ("local-idioms", local_idioms),
    ("bool-equality", fold_bool_equality),
    ("double-negation", drop_double_negation),
    ("subtraction-shift", shift_subtraction),
    ("flatten", flatten),
    ("additive", normalize_additive),
    ("commutative-sort", sort_commutative),
    ("relation-operands", order_relation_operands),
    ("flag-idioms", flag_idioms),
];

// A flag idiom can introduce `!!x` or unsorted siblings; one more round
// settles them.
const MAX_ROUNDS: usize = 4;

impl AstRewriter {
    pub fn new(config: &Config) -> Self {
        Self {
            trace: config.trace,
        }
    }

    pub fn normalize(&self, root: &Ast) -> Ast {
        let mut ast = root.clone();
        for round in 0..MAX_ROUNDS {
            let next = self.run_passes(ast.clone());
            if next == ast {
                return next;
            }
            if self.trace {
                debug!(target: "sindi::canonical", "round {round}: {next}");
            }
            ast = next;
        }
        ast
    }

    fn run_passes(&self, mut ast: Ast) -> Ast {
        for (name, pass) in PASSES {
            ast = pass(ast);
            if self.trace {
                log::trace!(target: "sindi::canonical", "{name}: {ast}");
            }
        }
        ast
    }
}

/// Rebuild `node` with `rule` applied to every child, then to the node itself.
fn bottom_up(node: Ast, rule: &dyn Fn(Ast) -> Ast) -> Ast {
    let node = match node {
        Ast::Ident(_) | Ast::Num(_) | Ast::Bool(_) => node,
        Ast::Not(x) => Ast::Not(Box::new(bottom_up(*x, rule))),
        Ast::Neg(x) => Ast::Neg(Box::new(bottom_up(*x, rule))),
        Ast::Op { op, args } => Ast::Op {
            op,
            args: args.into_iter().map(|a| bottom_up(a, rule)).collect(),
        },
        Ast::Call { callee, args } => Ast::Call {
            callee: Box::new(bottom_up(*callee, rule)),
            args: args.into_iter().map(|a| bottom_up(a, rule)).collect(),
        },
        Ast::Index { base, index } => Ast::Index {
            base: Box::new(bottom_up(*base, rule)),
            index: Box::new(bottom_up(*index, rule)),
        },
        Ast::Member { base, field } => Ast::Member {
            base: Box::new(bottom_up(*base, rule)),
            field,
        },
    };
    rule(node)
}

struct LocalIdiom {
    call: &'static str,
    expand: fn() -> Ast,
}

static LOCAL_IDIOMS: &[LocalIdiom] = &[
    LocalIdiom {
        call: "isOwner",
        expand: sender_is_owner,
    },
    LocalIdiom {
        call: "isAdmin",
        expand: sender_is_admin,
    },
    LocalIdiom {
        call: "_msgSender",
        expand: msg_sender,
    },
];

fn msg_sender() -> Ast {
    Ast::ident("msg.sender")
}

fn sender_is_owner() -> Ast {
    Ast::binary(BinOp::Eq, msg_sender(), Ast::call("owner", Vec::new()))
}

fn sender_is_admin() -> Ast {
    Ast::binary(BinOp::Eq, msg_sender(), Ast::ident("admin"))
}

fn local_idioms(ast: Ast) -> Ast {
    bottom_up(ast, &|node| {
        if let Ast::Call { args, .. } = &node {
            if args.is_empty() {
                if let Some(name) = node.call_name() {
                    if let Some(idiom) = LOCAL_IDIOMS.iter().find(|i| i.call == name) {
                        return (idiom.expand)();
                    }
                }
            }
        }
        node
    })
}

fn fold_bool_equality(ast: Ast) -> Ast {
    bottom_up(ast, &|node| match node {
        Ast::Op { op, mut args } if matches!(op, BinOp::Eq | BinOp::Ne) && args.len() == 2 => {
            let found = match (&args[0], &args[1]) {
                (Ast::Bool(b), _) => Some((*b, 1)),
                (_, Ast::Bool(b)) => Some((*b, 0)),
                _ => None,
            };
            let Some((lit, keep)) = found else {
                return Ast::Op { op, args };
            };
            let expr = args.swap_remove(keep);
            // `x == true` and `x != false` keep x; the other two negate it.
            if (op == BinOp::Eq) == lit {
                expr
            } else {
                Ast::not(expr)
            }
        }
        other => other,
    })
}

fn drop_double_negation(ast: Ast) -> Ast {
    bottom_up(ast, &|node| match node {
        Ast::Not(inner) => match *inner {
            Ast::Not(x) => *x,
            other => Ast::not(other),
        },
        other => other,
    })
}

fn shift_subtraction(ast: Ast) -> Ast {
    bottom_up(ast, &|node| match node {
        Ast::Op { op, args } if op.is_relational() && args.len() == 2 => {
            let (mut lhs, mut rhs) = match <[Ast; 2]>::try_from(args) {
                Ok([lhs, rhs]) => (lhs, rhs),
                Err(args) => return Ast::Op { op, args },
            };
            // `l op a - b` => `l + b op a`; `a - b op r` => `a op r + b`.
            // Repeat until neither side is a subtraction.
            loop {
                match split_sub(rhs) {
                    Ok((a, b)) => {
                        lhs = Ast::binary(BinOp::Add, lhs, b);
                        rhs = a;
                        continue;
                    }
                    Err(r) => rhs = r,
                }
                match split_sub(lhs) {
                    Ok((a, b)) => {
                        rhs = Ast::binary(BinOp::Add, rhs, b);
                        lhs = a;
                    }
                    Err(l) => {
                        return Ast::Op {
                            op,
                            args: vec![l, rhs],
                        }
                    }
                }
            }
        }
        other => other,
    })
}

fn split_sub(node: Ast) -> Result<(Ast, Ast), Ast> {
    match node {
        Ast::Op {
            op: BinOp::Sub,
            args,
        } => match <[Ast; 2]>::try_from(args) {
            Ok([a, b]) => Ok((a, b)),
            Err(args) => Err(Ast::Op {
                op: BinOp::Sub,
                args,
            }),
        },
        other => Err(other),
    }
}

fn splice(op: BinOp, args: Vec<Ast>) -> Vec<Ast> {
    let mut flat = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Ast::Op { op: inner, args } if inner == op => flat.extend(args),
            other => flat.push(other),
        }
    }
    flat
}

fn flatten(ast: Ast) -> Ast {
    bottom_up(ast, &|node| match node {
        Ast::Op { op, args } if op.is_associative() => Ast::Op {
            op,
            args: splice(op, args),
        },
        other => other,
    })
}

fn normalize_additive(ast: Ast) -> Ast {
    bottom_up(ast, &|node| match node {
        Ast::Op {
            op: BinOp::Add,
            args,
        } => {
            let mut args = splice(BinOp::Add, args);
            args.sort();
            Ast::Op {
                op: BinOp::Add,
                args,
            }
        }
        other => other,
    })
}

fn sort_commutative(ast: Ast) -> Ast {
    bottom_up(ast, &|node| match node {
        Ast::Op { op, mut args } if op.is_commutative() => {
            args.sort();
            Ast::Op { op, args }
        }
        other => other,
    })
}

fn order_relation_operands(ast: Ast) -> Ast {
    bottom_up(ast, &|node| match node {
        Ast::Op { op, mut args } if matches!(op, BinOp::Eq | BinOp::Ne) && args.len() == 2 => {
            if args[1] < args[0] {
                args.swap(0, 1);
            }
            Ast::Op { op, args }
        }
        other => other,
    })
}

struct FlagIdiom {
    mask: &'static str,
    predicate: &'static str,
}

static FLAG_IDIOMS: &[FlagIdiom] = &[FlagIdiom {
    mask: "MarketplaceLib.FLAG_MASK_FINALIZED",
    predicate: "MarketplaceLib.isFinalized",
}];

/// `(x & MASK) == 0` becomes `!isFlagged(x)`; `!= 0` becomes `isFlagged(x)`.
fn flag_idioms(ast: Ast) -> Ast {
    bottom_up(ast, &|node| {
        let Some((op, lhs, rhs)) = node.relation() else {
            return node;
        };
        if !matches!(op, BinOp::Eq | BinOp::Ne) {
            return node;
        }
        let masked = if rhs.is_zero_literal() {
            lhs
        } else if lhs.is_zero_literal() {
            rhs
        } else {
            return node;
        };
        let Some(flagged) = match_flag(masked) else {
            return node;
        };
        if op == BinOp::Eq {
            Ast::not(flagged)
        } else {
            flagged
        }
    })
}

fn match_flag(node: &Ast) -> Option<Ast> {
    let Ast::Op {
        op: BinOp::BitAnd,
        args,
    } = node
    else {
        return None;
    };
    if args.len() != 2 {
        return None;
    }
    FLAG_IDIOMS.iter().find_map(|idiom| {
        let value = if args[1].is_ident(idiom.mask) {
            &args[0]
        } else if args[0].is_ident(idiom.mask) {
            &args[1]
        } else {
            return None;
        };
        Some(Ast::call(idiom.predicate, vec![value.clone()]))
    })
}
