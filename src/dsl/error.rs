//! Error types for the transform language front end.

use std::fmt;

/// An error that occurred while tokenizing or parsing transform source.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
}

impl ParseError {
    pub fn lex(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::LexError,
        }
    }

    pub fn parse(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::ParseError,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {:?}: {}",
            self.line, self.col, self.kind, self.message
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position_and_kind() {
        let err = ParseError::parse("unknown parameter 'volume'", 2, 5);
        assert_eq!(
            err.to_string(),
            "[2:5] ParseError: unknown parameter 'volume'"
        );
    }

    #[test]
    fn lex_constructor_sets_kind() {
        let err = ParseError::lex("unexpected character: '@'", 1, 9);
        assert_eq!(err.kind, ErrorKind::LexError);
    }
}
