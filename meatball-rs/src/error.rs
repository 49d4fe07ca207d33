//! Error types.
//!
//! Most macro failures are *data*: they become a descriptive string at the
//! failure site and the document pass carries on.  The types here are the
//! exceptions to that rule (malformed syntax, unknown functions, unreadable
//! documents) plus [`ResolveError`], whose `Display` form is exactly the
//! string that gets embedded in the output when a variable path can't be
//! resolved.

use thiserror::Error;

/// A malformed expression string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected ')' at offset {0}")]
    UnexpectedClose(usize),
    #[error("missing ')' to close '(' at offset {0}")]
    Unclosed(usize),
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("quote at offset {0} is not followed by an expression")]
    DanglingQuote(usize),
    #[error("unexpected trailing input at offset {0}")]
    Trailing(usize),
}

/// A dot- or bracket-path that could not be followed.
///
/// Renders as `Error: cannot resolve '<name>'`, the form substituted into
/// documents.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Error: cannot resolve '{name}'")]
pub struct ResolveError {
    pub name: String,
}

impl ResolveError {
    pub fn new(name: impl Into<String>) -> Self {
        ResolveError { name: name.into() }
    }
}

/// Failure while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("S-expression parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("{name}: {message}")]
    Function { name: String, message: String },
}

impl EvalError {
    /// Fatal errors abort a preprocessing pass; everything else is rendered
    /// into the document as a string.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EvalError::Parse(_) | EvalError::UnknownFunction(_))
    }

    pub(crate) fn function(name: &str, message: impl Into<String>) -> Self {
        EvalError::Function { name: name.to_owned(), message: message.into() }
    }
}

/// Failure of a whole document pass.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("YAML parse error: {0}")]
    Document(#[from] serde_yaml::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Eval(#[from] EvalError),
}
