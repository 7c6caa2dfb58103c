//! Error type for expression evaluation.

use std::fmt;

/// An error raised while evaluating an expression against a context.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
    pub kind: EvalErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// `note.<x>` / `audio.<x>` is not in the supplied variable bag.
    UnknownVariable,
    /// A variable from the wrong namespace for this context.
    NamespaceMismatch,
    UnknownFunction,
    /// Wrong number of arguments.
    Arity,
    /// An argument or result outside what the function accepts.
    InvalidArgument,
    /// `ramp`/`curve` without an active time range.
    MissingTimeRange,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn unknown_variable(namespace: &str, name: &str) -> Self {
        Self::new(
            EvalErrorKind::UnknownVariable,
            format!("variable '{namespace}.{name}' is not available"),
        )
    }

    pub fn namespace_mismatch(namespace: &str, name: &str, context: &str) -> Self {
        Self::new(
            EvalErrorKind::NamespaceMismatch,
            format!("variable '{namespace}.{name}' cannot be used in a {context} context"),
        )
    }

    pub fn unknown_function(name: &str) -> Self {
        Self::new(
            EvalErrorKind::UnknownFunction,
            format!("unknown function '{name}'"),
        )
    }

    pub fn arity(function: &str, expected: impl fmt::Display, got: usize) -> Self {
        Self::new(
            EvalErrorKind::Arity,
            format!("{function}() expects {expected}, got {got}"),
        )
    }

    pub fn invalid_argument(function: &str, message: impl fmt::Display) -> Self {
        Self::new(
            EvalErrorKind::InvalidArgument,
            format!("{function}(): {message}"),
        )
    }

    pub fn missing_time_range(function: &str) -> Self {
        Self::new(
            EvalErrorKind::MissingTimeRange,
            format!("{function}() needs an active time range"),
        )
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for EvalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_variable_names_namespace_and_variable() {
        let err = EvalError::unknown_variable("note", "velocity");
        assert!(err.message.contains("note.velocity"));
        assert_eq!(err.kind, EvalErrorKind::UnknownVariable);
    }

    #[test]
    fn arity_message() {
        let err = EvalError::arity("pow", "2 arguments", 3);
        assert_eq!(
            err.to_string(),
            "Arity: pow() expects 2 arguments, got 3"
        );
    }
}
