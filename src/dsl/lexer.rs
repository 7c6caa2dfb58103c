//! Lexer for the transform language.
//!
//! Converts source text into a stream of [`Token`]s. Besides ordinary numbers
//! and identifiers it recognizes three musical literals: note names (`C3`,
//! `F#-1`), bar|beat positions (`2|1.5`) and period literals (`1t`, `1/3t`,
//! `/3t`, `2:1.5t`).

use super::error::ParseError;
use super::token::{Token, TokenKind};
use crate::note::{is_note_name, parse_note_name};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            self.skip_comment();
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();

            if ch == '\n' {
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    line: self.line,
                    col: self.col,
                });
                self.advance();
                self.line += 1;
                self.col = 1;
                continue;
            }

            let token = match ch {
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                ',' => self.single_char(TokenKind::Comma),
                '*' => self.single_char(TokenKind::Star),
                '%' => self.single_char(TokenKind::Percent),
                '=' => self.single_char(TokenKind::Eq),
                '-' => self.single_char(TokenKind::Minus),
                '+' if self.peek_next() == Some('=') => {
                    let line = self.line;
                    let col = self.col;
                    self.advance();
                    self.advance();
                    Token {
                        kind: TokenKind::PlusEq,
                        line,
                        col,
                    }
                }
                '+' => self.single_char(TokenKind::Plus),
                '/' => self.lex_slash()?,
                '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => {
                    self.lex_numeric()?
                }
                '.' => self.single_char(TokenKind::Dot),
                '0'..='9' => self.lex_numeric()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_word()?,
                _ => {
                    return Err(ParseError::lex(
                        format!("unexpected character: '{ch}'"),
                        self.line,
                        self.col,
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn check_char(&self, ch: char) -> bool {
        !self.is_at_end() && self.peek() == ch
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch != '\n' {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        if self.check_char('/') && self.peek_next() == Some('/') {
            while !self.is_at_end() && self.peek() != '\n' {
                self.advance();
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        Token { kind, line, col }
    }

    /// `/` is division unless it opens a period literal like `/3t`.
    fn lex_slash(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let col = self.col;
        match self.try_period_tail(1.0)? {
            Some(beats) => Ok(Token {
                kind: TokenKind::Period { bars: 0.0, beats },
                line,
                col,
            }),
            None => Ok(self.single_char(TokenKind::Slash)),
        }
    }

    /// Lex a number, a bar|beat position, or a period literal.
    fn lex_numeric(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let col = self.col;
        let text = self.scan_decimal();
        let value: f64 = text
            .parse()
            .map_err(|_| ParseError::lex(format!("invalid number: {text}"), line, col))?;

        // bar|beat
        if self.check_char('|') {
            if text.contains('.') {
                return Err(ParseError::lex(
                    format!("bar number must be a whole number, got {text}"),
                    line,
                    col,
                ));
            }
            self.advance(); // consume '|'
            let beat_text = self.scan_decimal();
            if beat_text.is_empty() {
                return Err(ParseError::lex("expected beat after '|'", line, col));
            }
            let bar: u32 = text
                .parse()
                .map_err(|_| ParseError::lex(format!("invalid bar number: {text}"), line, col))?;
            let beat: f64 = beat_text.parse().map_err(|_| {
                ParseError::lex(format!("invalid beat number: {beat_text}"), line, col)
            })?;
            if bar == 0 {
                return Err(ParseError::lex("bar numbers start at 1", line, col));
            }
            if beat < 1.0 {
                return Err(ParseError::lex("beat numbers start at 1", line, col));
            }
            return Ok(Token {
                kind: TokenKind::BarBeat { bar, beat },
                line,
                col,
            });
        }

        // bars:beats period
        if self.check_char(':') {
            self.advance(); // consume ':'
            let beats_text = self.scan_decimal();
            let numerator = if beats_text.is_empty() {
                if !self.check_char('/') {
                    return Err(ParseError::lex("invalid period literal", line, col));
                }
                1.0
            } else {
                beats_text.parse().map_err(|_| {
                    ParseError::lex(format!("invalid period beats: {beats_text}"), line, col)
                })?
            };
            return match self.try_period_tail(numerator)? {
                Some(beats) => Ok(Token {
                    kind: TokenKind::Period {
                        bars: value,
                        beats,
                    },
                    line,
                    col,
                }),
                None => Err(ParseError::lex(
                    "invalid period literal, expected 't' suffix",
                    line,
                    col,
                )),
            };
        }

        if let Some(beats) = self.try_period_tail(value)? {
            return Ok(Token {
                kind: TokenKind::Period { bars: 0.0, beats },
                line,
                col,
            });
        }

        Ok(Token {
            kind: TokenKind::Number(value),
            line,
            col,
        })
    }

    /// Try to finish a period literal after its numerator: either `t` or
    /// `/<denominator>t`. Restores the position and returns `None` when the
    /// text is not a period (e.g. a plain division `10/2`).
    fn try_period_tail(&mut self, numerator: f64) -> Result<Option<f64>, ParseError> {
        let saved_pos = self.pos;
        let saved_col = self.col;
        let line = self.line;
        let col = self.col;

        if self.check_char('t') && self.at_word_boundary(1) {
            self.advance(); // consume 't'
            return Ok(Some(numerator));
        }

        if self.check_char('/') {
            self.advance(); // consume '/'
            let denom_text = self.scan_decimal();
            if !denom_text.is_empty() && self.check_char('t') && self.at_word_boundary(1) {
                self.advance(); // consume 't'
                let denom: f64 = denom_text.parse().map_err(|_| {
                    ParseError::lex(format!("invalid period denominator: {denom_text}"), line, col)
                })?;
                if denom == 0.0 {
                    return Err(ParseError::lex(
                        "period denominator must be non-zero",
                        line,
                        col,
                    ));
                }
                return Ok(Some(numerator / denom));
            }
        }

        // Not a period, restore
        self.pos = saved_pos;
        self.col = saved_col;
        Ok(None)
    }

    /// Whether the character `offset` ahead ends a word.
    fn at_word_boundary(&self, offset: usize) -> bool {
        !self
            .chars
            .get(self.pos + offset)
            .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_')
    }

    /// Scan `digits[.digits]`. Returns an empty string when no digits follow.
    fn scan_decimal(&mut self) -> String {
        let mut s = String::new();
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }
        if self.check_char('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            s.push(self.advance()); // consume '.'
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
        }
        s
    }

    /// Lex an identifier or a note name.
    fn lex_word(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end()
            && (self.peek().is_ascii_alphanumeric() || self.peek() == '_' || self.peek() == '#')
        {
            s.push(self.advance());
        }

        // Negative octave: `C-1`, `F#-2`
        if is_bare_pitch_letter(&s)
            && self.check_char('-')
            && self.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            s.push(self.advance()); // consume '-'
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
        }

        if is_note_name(&s) {
            return match parse_note_name(&s) {
                Some(pitch) => Ok(Token {
                    kind: TokenKind::Pitch(pitch),
                    line,
                    col,
                }),
                None => Err(ParseError::lex(
                    format!("note {s} is outside the MIDI range"),
                    line,
                    col,
                )),
            };
        }

        Ok(Token {
            kind: TokenKind::Ident(s),
            line,
            col,
        })
    }
}

/// `C`, `F#`, `Bb`: a pitch letter with optional accidental and no octave.
fn is_bare_pitch_letter(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some('A'..='G') => {}
        _ => return false,
    }
    match chars.next() {
        None => true,
        Some('#' | 'b') => chars.next().is_none(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::error::ErrorKind;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_simple_statement() {
        assert_eq!(
            kinds("velocity += 10"),
            vec![
                TokenKind::Ident("velocity".to_string()),
                TokenKind::PlusEq,
                TokenKind::Number(10.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_operators() {
        assert_eq!(
            kinds("+ - * / % = ( ) ,"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Eq,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_pitch_and_range() {
        assert_eq!(
            kinds("C3-C5"),
            vec![
                TokenKind::Pitch(60),
                TokenKind::Minus,
                TokenKind::Pitch(84),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_negative_octave_pitch() {
        assert_eq!(
            kinds("C-1-C3"),
            vec![
                TokenKind::Pitch(12),
                TokenKind::Minus,
                TokenKind::Pitch(60),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_out_of_range_pitch_is_error() {
        let err = Lexer::new("G#8 velocity = 1").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
    }

    #[test]
    fn lex_bar_beat_range() {
        assert_eq!(
            kinds("1|1-2|1.5"),
            vec![
                TokenKind::BarBeat { bar: 1, beat: 1.0 },
                TokenKind::Minus,
                TokenKind::BarBeat { bar: 2, beat: 1.5 },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_bar_zero_is_error() {
        assert!(Lexer::new("0|1-1|1").tokenize().is_err());
        assert!(Lexer::new("1|0-1|1").tokenize().is_err());
    }

    #[test]
    fn lex_period_beats() {
        assert_eq!(
            kinds("1t"),
            vec![
                TokenKind::Period {
                    bars: 0.0,
                    beats: 1.0
                },
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lex_period_fraction() {
        let k = kinds("1/4t");
        assert_eq!(
            k[0],
            TokenKind::Period {
                bars: 0.0,
                beats: 0.25
            }
        );
    }

    #[test]
    fn lex_period_implicit_numerator() {
        let k = kinds("/4t");
        assert_eq!(
            k[0],
            TokenKind::Period {
                bars: 0.0,
                beats: 0.25
            }
        );
    }

    #[test]
    fn lex_period_bars_and_beats() {
        let k = kinds("2:1.5t");
        assert_eq!(
            k[0],
            TokenKind::Period {
                bars: 2.0,
                beats: 1.5
            }
        );
    }

    #[test]
    fn lex_period_bars_and_fraction() {
        let k = kinds("1:1/2t");
        assert_eq!(
            k[0],
            TokenKind::Period {
                bars: 1.0,
                beats: 0.5
            }
        );
    }

    #[test]
    fn lex_division_is_not_period() {
        assert_eq!(
            kinds("10/2"),
            vec![
                TokenKind::Number(10.0),
                TokenKind::Slash,
                TokenKind::Number(2.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_period_zero_denominator_is_error() {
        assert!(Lexer::new("cos(1/0t)").tokenize().is_err());
    }

    #[test]
    fn lex_bad_period_after_colon() {
        assert!(Lexer::new("cos(2:1)").tokenize().is_err());
    }

    #[test]
    fn lex_leading_dot_number() {
        assert_eq!(kinds(".5")[0], TokenKind::Number(0.5));
    }

    #[test]
    fn lex_variable() {
        assert_eq!(
            kinds("note.pitch"),
            vec![
                TokenKind::Ident("note".to_string()),
                TokenKind::Dot,
                TokenKind::Ident("pitch".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_word_starting_with_t_after_number() {
        // `2to` is not a period literal
        let k = kinds("2to");
        assert_eq!(k[0], TokenKind::Number(2.0));
        assert_eq!(k[1], TokenKind::Ident("to".to_string()));
    }

    #[test]
    fn lex_line_tracking() {
        let mut lexer = Lexer::new("velocity = 1\ntiming = 2");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[3].kind, TokenKind::Newline);
        assert_eq!(tokens[4].line, 2);
        assert_eq!(tokens[4].col, 1);
    }

    #[test]
    fn lex_comment() {
        assert_eq!(
            kinds("velocity = 1 // louder\n"),
            vec![
                TokenKind::Ident("velocity".to_string()),
                TokenKind::Eq,
                TokenKind::Number(1.0),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_error_on_unexpected_char() {
        let err = Lexer::new("invalid @@ syntax").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
        assert_eq!(err.col, 9);
    }

    #[test]
    fn lex_note_with_huge_octave_is_error() {
        let err = Lexer::new("C178956970 velocity += 1").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
        assert_eq!((err.line, err.col), (1, 1));
        assert!(err.message.contains("outside the MIDI range"));
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }
}
