use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};

use sindi::{
    tokenize, Ast, Compare, Comparator, Config, Domain, Frontend, RulesComparator, Simplifier,
    SubstitutionTable, SurfaceRewriter,
};

#[derive(Parser)]
#[clap(
    name = env!("CARGO_BIN_NAME"),
    about = "Compare the logical strength of smart-contract predicates",
    rename_all = "kebab-case",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    /// More log output; repeat for per-step traces
    #[clap(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbosity: u8,

    /// Value domain of free symbols
    #[clap(long, value_enum, default_value = "unsigned", global = true)]
    domain: DomainArg,

    /// Solver time limit in milliseconds (0 disables it)
    #[clap(long, default_value_t = 5000, global = true)]
    timeout_ms: u64,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, ValueEnum)]
enum DomainArg {
    Unsigned,
    Integer,
}

#[derive(Args)]
struct Input {
    /// Predicate text, or a path with --from-file
    predicate: String,

    /// Read the predicate from a file
    #[clap(long)]
    from_file: bool,

    /// Skip the Solidity unit/alias substitutions
    #[clap(long)]
    skip_rewrite: bool,

    /// Print JSON
    #[clap(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the surface substitutions only
    Rewrite(Input),
    /// Print the token stream
    Tokenize(Input),
    /// Print the parsed tree
    Parse {
        #[clap(flatten)]
        input: Input,
        /// Indented tree instead of source form
        #[clap(long)]
        tree: bool,
    },
    /// Print the canonical form
    Canonicalize(Input),
    /// Simplify through the symbolic engine
    Simplify {
        #[clap(flatten)]
        input: Input,
        /// Also print the symbolic form before simplification
        #[clap(long)]
        show_symbolic: bool,
    },
    /// Compare two predicates
    Compare(CompareArgs),
}

#[derive(Args)]
struct CompareArgs {
    first: String,
    second: String,

    /// Use the solver-free rules only
    #[clap(long)]
    rules_only: bool,

    /// Print the prepared forms and what settled each direction
    #[clap(long)]
    verbose: bool,

    /// Print JSON
    #[clap(long)]
    json: bool,

    /// Read the first predicate from a file
    #[clap(long)]
    p1_file: bool,

    /// Read the second predicate from a file
    #[clap(long)]
    p2_file: bool,

    /// Skip the Solidity unit/alias substitutions
    #[clap(long)]
    skip_rewrite: bool,

    /// Use Z3 for inconclusive implications
    #[cfg(feature = "z3")]
    #[clap(long)]
    z3: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let level = match cli.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    debug!("sindi {}", env!("CARGO_PKG_VERSION"));

    let config = Config::new()
        .with_trace(cli.verbosity >= 2)
        .with_domain(match cli.domain {
            DomainArg::Unsigned => Domain::Unsigned,
            DomainArg::Integer => Domain::Integer,
        })
        .with_timeout((cli.timeout_ms > 0).then(|| Duration::from_millis(cli.timeout_ms)));

    match cli.command {
        Command::Rewrite(input) => {
            let out = prepare_text(&input)?;
            emit(input.json, &out, || out.clone())?;
        }
        Command::Tokenize(input) => {
            let text = prepare_text(&input)?;
            let tokens = tokenize(&text)?;
            emit(input.json, &tokens, || {
                let parts: Vec<String> = tokens
                    .iter()
                    .map(|t| format!("({:?}, {:?})", t.lexeme, t.kind))
                    .collect();
                format!("[{}]", parts.join(", "))
            })?;
        }
        Command::Parse { input, tree } => {
            let prepared = frontend(&config, input.skip_rewrite).prepare(&read_predicate(
                &input.predicate,
                input.from_file,
            )?)?;
            emit(input.json, &prepared.parsed, || {
                if tree {
                    let mut out = String::new();
                    write_tree(&mut out, &prepared.parsed, 0);
                    out.trim_end().to_string()
                } else {
                    prepared.parsed.to_string()
                }
            })?;
        }
        Command::Canonicalize(input) => {
            let prepared = frontend(&config, input.skip_rewrite).prepare(&read_predicate(
                &input.predicate,
                input.from_file,
            )?)?;
            emit(input.json, &prepared, || prepared.canonical.to_string())?;
        }
        Command::Simplify {
            input,
            show_symbolic,
        } => {
            let prepared = frontend(&config, input.skip_rewrite).prepare(&read_predicate(
                &input.predicate,
                input.from_file,
            )?)?;
            if show_symbolic {
                let symbolic = sindi::to_symbolic(&prepared.canonical)?;
                println!("symbolic: {}", symbolic.value);
            }
            let simplified = Simplifier::new(&config).simplify(&prepared.canonical)?;
            for issue in &simplified.issues {
                log::info!("{issue}");
            }
            emit(input.json, &simplified.value, || simplified.value.to_string())?;
        }
        Command::Compare(args) => return compare(&config, args),
    }
    Ok(ExitCode::SUCCESS)
}

fn compare(config: &Config, args: CompareArgs) -> Result<ExitCode> {
    let first = read_predicate(&args.first, args.p1_file)?;
    let second = read_predicate(&args.second, args.p2_file)?;
    let front = || frontend(config, args.skip_rewrite);
    let comparator: Box<dyn Compare> = if args.rules_only {
        Box::new(RulesComparator::new(config).with_frontend(front()))
    } else {
        let full = Comparator::new(config.clone()).with_frontend(front());
        #[cfg(feature = "z3")]
        let full = if args.z3 {
            full.with_solver(sindi::Z3Solver)
        } else {
            full
        };
        Box::new(full)
    };
    let comparison = comparator.explain(&first, &second);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        if args.verbose {
            let sides = [("first", &comparison.first), ("second", &comparison.second)];
            for (label, prepared) in sides {
                if let Some(p) = prepared {
                    println!("{label}: {} => {}", p.source, p.canonical);
                }
            }
            let how = |proof: &Option<String>| proof.clone().unwrap_or_else(|| "unproven".into());
            println!("first => second: {}", how(&comparison.forward));
            println!("second => first: {}", how(&comparison.backward));
            for atom in &comparison.opaque {
                println!("opaque: {atom}");
            }
        }
        println!("{}", comparison.verdict);
    }
    Ok(if comparison.verdict.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn read_predicate(value: &str, is_file: bool) -> Result<String> {
    if !is_file {
        return Ok(value.to_string());
    }
    let text = std::fs::read_to_string(Path::new(value))
        .with_context(|| format!("reading predicate from {value}"))?;
    Ok(text.trim().to_string())
}

fn rewriter(skip: bool) -> SubstitutionTable {
    if skip {
        SubstitutionTable::new()
    } else {
        SubstitutionTable::solidity()
    }
}

fn frontend(config: &Config, skip_rewrite: bool) -> Frontend {
    Frontend::with_rewriter(config, rewriter(skip_rewrite))
}

fn prepare_text(input: &Input) -> Result<String> {
    let text = read_predicate(&input.predicate, input.from_file)?;
    Ok(rewriter(input.skip_rewrite).rewrite(&text))
}

fn emit<T: serde::Serialize>(json: bool, value: &T, plain: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", plain());
    }
    Ok(())
}

fn write_tree(out: &mut String, node: &Ast, depth: usize) {
    let pad = "  ".repeat(depth);
    let (label, children): (String, Vec<&Ast>) = match node {
        Ast::Ident(n) | Ast::Num(n) => (n.clone(), Vec::new()),
        Ast::Bool(b) => (b.to_string(), Vec::new()),
        Ast::Not(x) => ("!".into(), vec![x.as_ref()]),
        Ast::Neg(x) => ("-".into(), vec![x.as_ref()]),
        Ast::Op { op, args } => (op.symbol().into(), args.iter().collect()),
        Ast::Call { callee, args } => match callee.as_ref() {
            Ast::Ident(name) => (format!("{name}()"), args.iter().collect()),
            other => (
                "call".into(),
                std::iter::once(other).chain(args.iter()).collect(),
            ),
        },
        Ast::Index { base, index } => ("[]".into(), vec![base.as_ref(), index.as_ref()]),
        Ast::Member { base, field } => (format!(".{field}"), vec![base.as_ref()]),
    };
    out.push_str(&pad);
    out.push_str(&label);
    out.push('\n');
    for child in children {
        write_tree(out, child, depth + 1);
    }
}
