//! Parser for the transform language.
//!
//! Parses a token stream into a list of [`Statement`]s. Statements are
//! separated by newlines or commas; each one is
//! `[pitch filter] [time filter] parameter (= | +=) expression`.

use super::ast::*;
use super::dialect::Dialect;
use super::error::ParseError;
use super::token::{Token, TokenKind};
use crate::eval::Function;
use crate::time::BarBeat;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    dialect: Dialect,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, dialect: Dialect) -> Self {
        Self {
            tokens,
            pos: 0,
            dialect,
        }
    }

    pub fn parse(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();

        loop {
            self.skip_separators();
            if self.is_at_end() {
                break;
            }

            statements.push(self.parse_statement()?);

            let t = self.peek();
            match &t.kind {
                TokenKind::Newline | TokenKind::Comma => continue,
                TokenKind::Eof => break,
                other => {
                    return Err(ParseError::parse(
                        format!("unexpected {} after statement", other.describe()),
                        t.line,
                        t.col,
                    ));
                }
            }
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let mut pitch_filter = None;
        let mut time_filter = None;

        loop {
            match self.peek().kind {
                TokenKind::Pitch(_) if pitch_filter.is_none() => {
                    pitch_filter = Some(self.parse_pitch_filter()?);
                }
                TokenKind::BarBeat { .. } if time_filter.is_none() => {
                    time_filter = Some(self.parse_time_filter()?);
                }
                _ => break,
            }
        }

        let parameter = self.parse_parameter()?;
        let operator = self.parse_assign_op()?;
        let expression = self.parse_expr()?;

        Ok(Statement {
            parameter,
            operator,
            pitch_filter,
            time_filter,
            expression,
        })
    }

    /// `C3` or `C3-C5`.
    fn parse_pitch_filter(&mut self) -> Result<PitchFilter, ParseError> {
        let (line, col) = self.position();
        let low = self.expect_pitch()?;
        if !self.check(TokenKind::Minus) {
            return Ok(PitchFilter::Single(low));
        }
        self.advance(); // consume '-'
        let high = self.expect_pitch()?;
        if low > high {
            return Err(ParseError::parse(
                format!("pitch range is reversed ({low} > {high})"),
                line,
                col,
            ));
        }
        Ok(PitchFilter::Range(low, high))
    }

    /// `1|1-2|1`.
    fn parse_time_filter(&mut self) -> Result<TimeFilter, ParseError> {
        let (line, col) = self.position();
        let start = self.expect_bar_beat()?;
        self.expect(TokenKind::Minus)?;
        let end = self.expect_bar_beat()?;
        if (start.bar, start.beat) > (end.bar, end.beat) {
            return Err(ParseError::parse(
                format!("time range starts after it ends ({start} > {end})"),
                line,
                col,
            ));
        }
        Ok(TimeFilter { start, end })
    }

    fn parse_parameter(&mut self) -> Result<Parameter, ParseError> {
        let t = self.peek();
        let (line, col) = (t.line, t.col);
        match &t.kind {
            TokenKind::Ident(name) => match self.dialect.parameter(name) {
                Some(p) => {
                    self.advance();
                    Ok(p)
                }
                None => Err(ParseError::parse(
                    format!(
                        "unknown parameter '{name}' (expected one of: {})",
                        self.dialect.parameter_names().join(", ")
                    ),
                    line,
                    col,
                )),
            },
            other => Err(ParseError::parse(
                format!("expected parameter name, got {}", other.describe()),
                line,
                col,
            )),
        }
    }

    fn parse_assign_op(&mut self) -> Result<AssignOp, ParseError> {
        let t = self.peek();
        let op = match &t.kind {
            TokenKind::Eq => AssignOp::Set,
            TokenKind::PlusEq => AssignOp::Add,
            other => {
                return Err(ParseError::parse(
                    format!("expected '=' or '+=', got {}", other.describe()),
                    t.line,
                    t.col,
                ));
            }
        };
        self.advance();
        Ok(op)
    }

    // --- Expressions ---

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_additive()
    }

    /// Runs of `+` nest to the right (`a + b + c` → `a + (b + c)`); `-`
    /// closes the current run and folds left.
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut head = self.parse_multiplicative()?;
        let mut run = Vec::new();

        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_multiplicative()?;

            if op == BinaryOp::Add {
                run.push(rhs);
            } else {
                let lhs = nest_sum(head, std::mem::take(&mut run));
                head = Expr::binary(BinaryOp::Subtract, lhs, rhs);
            }
        }

        Ok(nest_sum(head, run))
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(match operand {
                    Expr::Number(n) => Expr::Number(-n),
                    other => Expr::binary(BinaryOp::Subtract, Expr::Number(0.0), other),
                })
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.parse_expr()?;
                self.skip_newlines();
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => match self.peek_at(1).kind {
                TokenKind::LParen => self.parse_call(&name),
                TokenKind::Dot => self.parse_variable(&name),
                _ => Err(ParseError::parse(
                    format!("unknown identifier '{name}'"),
                    t.line,
                    t.col,
                )),
            },
            TokenKind::Period { .. } => Err(ParseError::parse(
                "period literals are only allowed as function arguments",
                t.line,
                t.col,
            )),
            TokenKind::Pitch(_) => Err(ParseError::parse(
                "note names are only allowed at the start of a statement",
                t.line,
                t.col,
            )),
            other => Err(ParseError::parse(
                format!("expected expression, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, ParseError> {
        let (line, col) = self.position();
        if Function::from_name(name).is_none() {
            return Err(ParseError::parse(
                format!("unknown function '{name}'"),
                line,
                col,
            ));
        }
        self.advance(); // name
        self.advance(); // '('
        self.skip_newlines();

        let mut args = Vec::new();
        if self.check(TokenKind::RParen) {
            self.advance();
            return Ok(Expr::call(name, args));
        }

        loop {
            args.push(self.parse_argument()?);
            self.skip_newlines();
            let t = self.peek();
            match &t.kind {
                TokenKind::Comma => {
                    self.advance();
                    self.skip_newlines();
                }
                TokenKind::RParen => {
                    self.advance();
                    break;
                }
                other => {
                    return Err(ParseError::parse(
                        format!("expected ',' or ')' in call to {name}, got {}", other.describe()),
                        t.line,
                        t.col,
                    ));
                }
            }
        }

        Ok(Expr::call(name, args))
    }

    /// A period literal standing alone, or any expression.
    fn parse_argument(&mut self) -> Result<Expr, ParseError> {
        let t = self.peek().clone();
        if let TokenKind::Period { bars, beats } = t.kind {
            let closes = matches!(
                self.peek_at(1).kind,
                TokenKind::Comma | TokenKind::RParen | TokenKind::Newline
            );
            if !closes {
                return Err(ParseError::parse(
                    "a period literal must be a whole function argument",
                    t.line,
                    t.col,
                ));
            }
            self.advance();
            return Ok(Expr::Period { bars, beats });
        }
        self.parse_expr()
    }

    fn parse_variable(&mut self, namespace_name: &str) -> Result<Expr, ParseError> {
        let (line, col) = self.position();
        let namespace = Namespace::from_name(namespace_name).ok_or_else(|| {
            ParseError::parse(
                format!("unknown namespace '{namespace_name}' (expected 'note' or 'audio')"),
                line,
                col,
            )
        })?;
        self.advance(); // namespace
        self.advance(); // '.'
        let name = self.expect_ident()?;
        Ok(Expr::Variable { namespace, name })
    }

    // --- Utility methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    fn position(&self) -> (usize, usize) {
        let t = self.peek();
        (t.line, t.col)
    }

    fn advance(&mut self) -> &Token {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end()
            && std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(&kind)
    }

    fn skip_newlines(&mut self) {
        while !self.is_at_end() && self.peek().kind == TokenKind::Newline {
            self.pos += 1;
        }
    }

    fn skip_separators(&mut self) {
        while !self.is_at_end()
            && matches!(self.peek().kind, TokenKind::Newline | TokenKind::Comma)
        {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token, ParseError> {
        if std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(&kind) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(ParseError::parse(
                format!("expected {}, got {}", kind.describe(), t.kind.describe()),
                t.line,
                t.col,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let t = self.peek();
        match &t.kind {
            TokenKind::Ident(s) => {
                let val = s.clone();
                self.advance();
                Ok(val)
            }
            other => Err(ParseError::parse(
                format!("expected identifier, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn expect_pitch(&mut self) -> Result<u8, ParseError> {
        let t = self.peek();
        match t.kind {
            TokenKind::Pitch(p) => {
                self.advance();
                Ok(p)
            }
            ref other => Err(ParseError::parse(
                format!("expected note name, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn expect_bar_beat(&mut self) -> Result<BarBeat, ParseError> {
        let t = self.peek();
        match t.kind {
            TokenKind::BarBeat { bar, beat } => {
                self.advance();
                Ok(BarBeat::new(bar, beat))
            }
            ref other => Err(ParseError::parse(
                format!("expected bar|beat position, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }
}

/// Right-nest `head + tail[0] + tail[1] + ...`.
fn nest_sum(head: Expr, tail: Vec<Expr>) -> Expr {
    match tail
        .into_iter()
        .rev()
        .reduce(|acc, term| Expr::binary(BinaryOp::Add, term, acc))
    {
        Some(rest) => Expr::binary(BinaryOp::Add, head, rest),
        None => head,
    }
}
