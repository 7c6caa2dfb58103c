//! Transform language front end — source text → tokens → statement list.

pub mod ast;
pub mod dialect;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use dialect::Dialect;
pub use error::ParseError;

use lexer::Lexer;
use parser::Parser;

/// Parse transform source using the clip-transform parameter names.
pub fn parse(source: &str) -> Result<Vec<Statement>, ParseError> {
    parse_dialect(source, Dialect::Transform)
}

/// Parse transform source using the parameter names of `dialect`.
pub fn parse_dialect(source: &str, dialect: Dialect) -> Result<Vec<Statement>, ParseError> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(tokens, dialect);
    parser.parse()
}
