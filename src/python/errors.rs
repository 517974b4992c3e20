//! Python exception types raised by the embedded interpreter
//!
//! [`PyError`] pairs an exception class ([`PyErrorKind`]) with the message
//! CPython would print on the last line of a traceback, so the learner sees
//! familiar text such as `NameError: name 'x' is not defined`.

use super::ast::SourceLocation;
use std::fmt;

/// Exception classes the interpreter can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyErrorKind {
    SyntaxError,
    IndentationError,
    NameError,
    TypeError,
    ValueError,
    ZeroDivisionError,
    OverflowError,
    IndexError,
    AttributeError,
    EOFError,
}

impl PyErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            PyErrorKind::SyntaxError => "SyntaxError",
            PyErrorKind::IndentationError => "IndentationError",
            PyErrorKind::NameError => "NameError",
            PyErrorKind::TypeError => "TypeError",
            PyErrorKind::ValueError => "ValueError",
            PyErrorKind::ZeroDivisionError => "ZeroDivisionError",
            PyErrorKind::OverflowError => "OverflowError",
            PyErrorKind::IndexError => "IndexError",
            PyErrorKind::AttributeError => "AttributeError",
            PyErrorKind::EOFError => "EOFError",
        }
    }

    /// Raised at compile time, before anything runs
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            PyErrorKind::SyntaxError | PyErrorKind::IndentationError
        )
    }
}

/// A raised exception with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct PyError {
    pub kind: PyErrorKind,
    pub message: String,
    pub location: SourceLocation,
}

impl PyError {
    pub fn new(kind: PyErrorKind, message: impl Into<String>, location: SourceLocation) -> Self {
        PyError {
            kind,
            message: message.into(),
            location,
        }
    }

    pub fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(PyErrorKind::SyntaxError, message, location)
    }

    pub fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(PyErrorKind::TypeError, message, location)
    }

    pub fn value_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(PyErrorKind::ValueError, message, location)
    }

    pub fn zero_division(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(PyErrorKind::ZeroDivisionError, message, location)
    }

    pub fn overflow(location: SourceLocation) -> Self {
        Self::new(
            PyErrorKind::OverflowError,
            "integer result too large for this interpreter",
            location,
        )
    }

    pub fn undefined_name(name: &str, location: SourceLocation) -> Self {
        Self::new(
            PyErrorKind::NameError,
            format!("name '{}' is not defined", name),
            location,
        )
    }

    pub fn line(&self) -> usize {
        self.location.line
    }
}

impl fmt::Display for PyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for PyError {}
