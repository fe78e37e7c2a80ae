use crate::error::LexError;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Identifier,
    Number,
    Operator,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Token {
    pub lexeme: String,
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub pos: usize,
}

impl Token {
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.lexeme == op
    }
}

/// Split `text` into tokens. Whitespace is insignificant.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let mut lex = Lexer::new(text);
    let mut out = Vec::new();
    while let Some(tok) = lex.next_token()? {
        out.push(tok);
    }
    Ok(out)
}

// Longest first so that `**` wins over `*` and `<=` over `<`.
const TWO_CHAR_OPS: [&str; 7] = ["&&", "||", "==", "!=", "<=", ">=", "**"];
const ONE_CHAR_OPS: &[u8] = b"<>!+-*/%&|^";

pub(crate) struct Lexer<'a> {
    text: &'a str,
    src: &'a [u8],
    i: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(s: &'a str) -> Self {
        Self {
            text: s,
            src: s.as_bytes(),
            i: 0,
        }
    }
    fn peek(&self) -> Option<u8> {
        self.src.get(self.i).copied()
    }
    fn peek_at(&self, k: usize) -> Option<u8> {
        self.src.get(self.i + k).copied()
    }
    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.i += 1;
            } else {
                break;
            }
        }
    }
    fn emit(&mut self, start: usize, kind: TokenKind) -> Option<Token> {
        Some(Token {
            lexeme: self.text[start..self.i].to_string(),
            kind,
            pos: start,
        })
    }
    pub(crate) fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_ws();
        let start = self.i;
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };
        let single = |lex: &mut Self, kind| {
            lex.i += 1;
            lex.emit(start, kind)
        };
        match c {
            b'(' => Ok(single(self, TokenKind::LParen)),
            b')' => Ok(single(self, TokenKind::RParen)),
            b'[' => Ok(single(self, TokenKind::LBracket)),
            b']' => Ok(single(self, TokenKind::RBracket)),
            b',' => Ok(single(self, TokenKind::Comma)),
            b'.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.lex_number(),
            b'.' => Ok(single(self, TokenKind::Dot)),
            c if c.is_ascii_digit() => self.lex_number(),
            c if is_ident_start(c) => Ok(self.lex_ident()),
            _ => self.lex_operator(),
        }
    }
    fn lex_operator(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.i;
        let rest = &self.src[start..];
        for op in TWO_CHAR_OPS {
            if rest.starts_with(op.as_bytes()) {
                self.i += 2;
                return Ok(self.emit(start, TokenKind::Operator));
            }
        }
        match self.peek() {
            Some(c) if ONE_CHAR_OPS.contains(&c) => {
                self.i += 1;
                Ok(self.emit(start, TokenKind::Operator))
            }
            _ => {
                let ch = self.text[start..].chars().next().unwrap_or('\u{FFFD}');
                Err(LexError::UnexpectedChar { ch, pos: start })
            }
        }
    }
    fn lex_number(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.i;
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.i += 2;
            let digits = self.i;
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() || c == b'_' {
                    self.i += 1;
                } else {
                    break;
                }
            }
            if self.i == digits {
                return Err(self.bad_number(start));
            }
        } else {
            let mut seen_dot = false;
            let mut seen_exp = false;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() || c == b'_' {
                    self.i += 1;
                } else if c == b'.' && !seen_dot && !seen_exp {
                    // `1.foo` is not a number followed by a member access.
                    if !self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                        return Err(self.bad_number(start));
                    }
                    seen_dot = true;
                    self.i += 1;
                } else if (c == b'e' || c == b'E') && !seen_exp {
                    seen_exp = true;
                    self.i += 1;
                    if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                        self.i += 1;
                    }
                    if !self.peek().is_some_and(|d| d.is_ascii_digit()) {
                        return Err(self.bad_number(start));
                    }
                } else {
                    break;
                }
            }
        }
        // `12abc` is neither a number nor an identifier.
        if self.peek().is_some_and(is_ident_start) {
            while self.peek().is_some_and(is_ident_continue) {
                self.i += 1;
            }
            return Err(self.bad_number(start));
        }
        Ok(self.emit(start, TokenKind::Number))
    }
    fn bad_number(&self, start: usize) -> LexError {
        LexError::BadNumber {
            text: self.text[start..self.i].to_string(),
            pos: start,
        }
    }
    fn lex_ident(&mut self) -> Option<Token> {
        let start = self.i;
        loop {
            while self.peek().is_some_and(is_ident_continue) {
                self.i += 1;
            }
            // Dotted member paths (`msg.sender`) stay one identifier.
            if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(is_ident_start) {
                self.i += 1;
                continue;
            }
            break;
        }
        self.emit(start, TokenKind::Identifier)
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}
