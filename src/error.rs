use thiserror::Error;

/// Fatal tokenizer failure. Positions are byte offsets into the (rewritten) input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("malformed number '{text}' at position {pos}")]
    BadNumber { text: String, pos: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("syntax error at position {pos}: expected {expected}, found {found}")]
pub struct SyntaxError {
    pub pos: usize,
    pub expected: String,
    pub found: String,
}

/// The value kind a sub-expression was required to have.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Sort {
    Bool,
    Int,
}

impl std::fmt::Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sort::Bool => f.write_str("a boolean"),
            Sort::Int => f.write_str("an integer"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Recovered locally: the node became an opaque uninterpreted atom.
    #[error("no symbolic meaning for '{node}': {reason}")]
    Unsupported { node: String, reason: String },
    /// Not recoverable: the node cannot stand where it was used.
    #[error("'{node}' cannot be used as {expected}")]
    SortMismatch { node: String, expected: Sort },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SindiError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),
}
