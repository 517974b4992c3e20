//! Embedded interpreter for the beginner Python subset used by the lessons.
//!
//! ```text
//! Source → Lexer → Parser → AST → Interpreter (globals, stdout, input queue)
//! ```
//!
//! - [`lexer`]: tokens with source locations
//! - [`parser`] / `expressions`: recursive descent into [`ast::Program`]
//! - [`interpreter`]: persistent namespace and statement execution
//! - `builtins`: `print`, `input`, conversions and `str` methods
//! - [`value`]: runtime values and their `str()` / `repr()` forms
//! - [`errors`]: Python exception classes and messages

pub mod ast;
mod builtins;
pub mod errors;
mod expressions;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use errors::{PyError, PyErrorKind};
pub use interpreter::Interpreter;
pub use value::Value;
