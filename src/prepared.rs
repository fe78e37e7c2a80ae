use crate::ast::Ast;
use crate::canonical::AstRewriter;
use crate::config::Config;
use crate::error::SindiError;
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::rewrite::{Identity, SurfaceRewriter};
use log::debug;
use serde::Serialize;
use std::fmt;

/// Every intermediate form of one predicate, from source text to canonical
/// tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Prepared {
    pub source: String,
    /// Text after the surface rewriter.
    pub rewritten: String,
    pub parsed: Ast,
    pub canonical: Ast,
}

/// Surface rewrite, tokenize, parse and canonicalize. Shared by both
/// comparators and the command line.
pub struct Frontend {
    rewriter: Box<dyn SurfaceRewriter>,
    canonicalizer: AstRewriter,
    trace: bool,
}

impl fmt::Debug for Frontend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frontend")
            .field("canonicalizer", &self.canonicalizer)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

impl Default for Frontend {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Frontend {
    pub fn new(config: &Config) -> Self {
        Self::with_rewriter(config, Identity)
    }

    pub fn with_rewriter<R>(config: &Config, rewriter: R) -> Self
    where
        R: SurfaceRewriter + 'static,
    {
        Self {
            rewriter: Box::new(rewriter),
            canonicalizer: AstRewriter::new(config),
            trace: config.trace,
        }
    }

    pub fn rewrite(&self, text: &str) -> String {
        self.rewriter.rewrite(text)
    }

    pub fn prepare(&self, text: &str) -> Result<Prepared, SindiError> {
        let rewritten = self.rewriter.rewrite(text);
        let tokens = tokenize(&rewritten)?;
        let parsed = parse(&tokens)?;
        let canonical = self.canonicalizer.normalize(&parsed);
        if self.trace {
            debug!(target: "sindi::frontend", "{text:?} => {canonical}");
        }
        Ok(Prepared {
            source: text.to_string(),
            rewritten,
            parsed,
            canonical,
        })
    }
}
