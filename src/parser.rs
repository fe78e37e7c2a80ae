use crate::ast::{Ast, BinOp};
use crate::error::{SindiError, SyntaxError};
use crate::lexer::{tokenize, Token, TokenKind};

/// Parse a token sequence into an AST.
pub fn parse(tokens: &[Token]) -> Result<Ast, SyntaxError> {
    Parser::new(tokens).parse()
}

/// Tokenize and parse in one step.
pub fn parse_str(text: &str) -> Result<Ast, SindiError> {
    let tokens = tokenize(text)?;
    Ok(parse(&tokens)?)
}

/// Parentheses, brackets, call arguments, `!`, unary `-` and `**` exponents
/// may nest this deep.
const MAX_NESTING: usize = 128;

/// Operator-precedence recursive descent, lowest binding first:
/// `||`, `&&`, `!`, one relational operator, `|`, `^`, `&`, `+ -`, `* / %`,
/// unary `-`, `**`, then call/index/member postfixes.
pub struct Parser<'a> {
    tokens: &'a [Token],
    at: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            at: 0,
            depth: 0,
        }
    }
    fn look(&self) -> Option<&'a Token> {
        self.tokens.get(self.at)
    }
    fn bump(&mut self) {
        self.at += 1;
    }
    fn look_is(&self, kind: TokenKind) -> bool {
        self.look().is_some_and(|t| t.kind == kind)
    }
    fn look_op(&self) -> Option<BinOp> {
        self.look()
            .filter(|t| t.kind == TokenKind::Operator)
            .and_then(|t| BinOp::from_symbol(&t.lexeme))
    }
    fn error(&self, expected: &str) -> SyntaxError {
        match self.look() {
            Some(t) => SyntaxError {
                pos: t.pos,
                expected: expected.to_string(),
                found: format!("'{}'", t.lexeme),
            },
            None => SyntaxError {
                pos: self.tokens.last().map(|t| t.pos + t.lexeme.len()).unwrap_or(0),
                expected: expected.to_string(),
                found: "end of input".to_string(),
            },
        }
    }
    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), SyntaxError> {
        if self.look_is(kind) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }
    /// Run `inner` one nesting level deeper.
    fn nested(
        &mut self,
        inner: fn(&mut Self) -> Result<Ast, SyntaxError>,
    ) -> Result<Ast, SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("shallower input (nesting too deep)"));
        }
        self.depth += 1;
        let out = inner(self);
        self.depth -= 1;
        out
    }
    pub fn parse(mut self) -> Result<Ast, SyntaxError> {
        let expr = self.or_expr()?;
        if self.look().is_some() {
            let expected = if self.look_op().is_some_and(BinOp::is_relational) {
                "'&&', '||' or end of input (relations do not chain)"
            } else {
                "end of input"
            };
            return Err(self.error(expected));
        }
        Ok(expr)
    }
    fn left_assoc(
        &mut self,
        ops: &[BinOp],
        next: fn(&mut Self) -> Result<Ast, SyntaxError>,
    ) -> Result<Ast, SyntaxError> {
        let mut node = next(self)?;
        while let Some(op) = self.look_op().filter(|op| ops.contains(op)) {
            self.bump();
            let rhs = next(self)?;
            node = Ast::binary(op, node, rhs);
        }
        Ok(node)
    }
    fn or_expr(&mut self) -> Result<Ast, SyntaxError> {
        self.left_assoc(&[BinOp::Or], Self::and_expr)
    }
    fn and_expr(&mut self) -> Result<Ast, SyntaxError> {
        self.left_assoc(&[BinOp::And], Self::not_expr)
    }
    fn not_expr(&mut self) -> Result<Ast, SyntaxError> {
        if self.look().is_some_and(|t| t.is_op("!")) {
            self.bump();
            return Ok(Ast::not(self.nested(Self::not_expr)?));
        }
        self.relational()
    }
    fn relational(&mut self) -> Result<Ast, SyntaxError> {
        let lhs = self.bit_or()?;
        match self.look_op().filter(|op| op.is_relational()) {
            Some(op) => {
                self.bump();
                let rhs = self.bit_or()?;
                Ok(Ast::binary(op, lhs, rhs))
            }
            None => Ok(lhs),
        }
    }
    fn bit_or(&mut self) -> Result<Ast, SyntaxError> {
        self.left_assoc(&[BinOp::BitOr], Self::bit_xor)
    }
    fn bit_xor(&mut self) -> Result<Ast, SyntaxError> {
        self.left_assoc(&[BinOp::BitXor], Self::bit_and)
    }
    fn bit_and(&mut self) -> Result<Ast, SyntaxError> {
        self.left_assoc(&[BinOp::BitAnd], Self::additive)
    }
    fn additive(&mut self) -> Result<Ast, SyntaxError> {
        self.left_assoc(&[BinOp::Add, BinOp::Sub], Self::multiplicative)
    }
    fn multiplicative(&mut self) -> Result<Ast, SyntaxError> {
        self.left_assoc(&[BinOp::Mul, BinOp::Div, BinOp::Mod], Self::unary)
    }
    fn unary(&mut self) -> Result<Ast, SyntaxError> {
        if self.look().is_some_and(|t| t.is_op("-")) {
            self.bump();
            return Ok(Ast::Neg(Box::new(self.nested(Self::unary)?)));
        }
        self.power()
    }
    fn power(&mut self) -> Result<Ast, SyntaxError> {
        let base = self.postfix()?;
        if self.look_op() == Some(BinOp::Pow) {
            self.bump();
            let exp = self.nested(Self::unary)?;
            return Ok(Ast::binary(BinOp::Pow, base, exp));
        }
        Ok(base)
    }
    fn postfix(&mut self) -> Result<Ast, SyntaxError> {
        let mut node = self.primary()?;
        loop {
            match self.look().map(|t| t.kind) {
                Some(TokenKind::LParen) => {
                    self.bump();
                    let mut args = Vec::new();
                    if !self.look_is(TokenKind::RParen) {
                        loop {
                            args.push(self.nested(Self::or_expr)?);
                            if self.look_is(TokenKind::Comma) {
                                self.bump();
                                continue;
                            }
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen, "',' or ')'")?;
                    node = Ast::Call {
                        callee: Box::new(node),
                        args,
                    };
                }
                Some(TokenKind::LBracket) => {
                    self.bump();
                    let index = self.nested(Self::or_expr)?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    node = Ast::Index {
                        base: Box::new(node),
                        index: Box::new(index),
                    };
                }
                Some(TokenKind::Dot) => {
                    self.bump();
                    let field = match self.look() {
                        Some(t) if t.kind == TokenKind::Identifier => t.lexeme.clone(),
                        _ => return Err(self.error("member name after '.'")),
                    };
                    self.bump();
                    // A dotted identifier after `]` or `)` is a chain of members.
                    for part in field.split('.') {
                        node = Ast::Member {
                            base: Box::new(node),
                            field: part.to_string(),
                        };
                    }
                }
                _ => return Ok(node),
            }
        }
    }
    fn primary(&mut self) -> Result<Ast, SyntaxError> {
        let tok = match self.look() {
            Some(t) => t,
            None => return Err(self.error("operand")),
        };
        match tok.kind {
            TokenKind::Number => {
                self.bump();
                Ok(Ast::Num(tok.lexeme.clone()))
            }
            TokenKind::Identifier => {
                self.bump();
                Ok(match tok.lexeme.as_str() {
                    "true" => Ast::Bool(true),
                    "false" => Ast::Bool(false),
                    name => Ast::Ident(name.to_string()),
                })
            }
            TokenKind::LParen => {
                self.bump();
                let e = self.nested(Self::or_expr)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(e)
            }
            _ => Err(self.error("number, identifier or '('")),
        }
    }
}
