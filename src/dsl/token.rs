//! Token types for the transform lexer.

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Ident(String),
    Number(f64),
    /// A note name, already resolved to its MIDI number (e.g. `C3` → 60).
    Pitch(u8),
    /// A 1-based bar|beat position, e.g. `2|1.5`.
    BarBeat { bar: u32, beat: f64 },
    /// A period literal such as `1t`, `1/3t` or `2:1.5t`.
    Period { bars: f64, beats: f64 },

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,     // =
    PlusEq, // +=

    // Delimiters
    LParen,
    RParen,
    Comma,
    Dot,

    // Special
    Newline,
    Eof,
}

impl TokenKind {
    /// Short human-readable form for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(s) => format!("'{s}'"),
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Pitch(p) => format!("pitch {p}"),
            TokenKind::BarBeat { bar, beat } => format!("position {bar}|{beat}"),
            TokenKind::Period { bars, beats } => format!("period {bars}:{beats}t"),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Percent => "'%'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::PlusEq => "'+='".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}
