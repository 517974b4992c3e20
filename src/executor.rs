//! Code executor contract
//!
//! The step controller talks to the language runtime only through
//! [`CodeExecutor`]: validate the whole source, execute one statement at a
//! time against a persistent namespace, read bindings back as display
//! strings, and read the accumulated stdout. [`PythonExecutor`] implements it
//! on top of the embedded [`crate::python`] interpreter.

use crate::python::{Interpreter, PyError, Value};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Runtime plumbing that never shows up in the memory pane
pub const PLUMBING_NAMES: &[&str] = &["output_buffer", "sys", "io"];

/// Global used to hand an interactively captured value to the interpreter
pub const TEMP_INPUT_NAME: &str = "_temp_input";

/// Ordered `name -> display value` pairs of the visible globals
pub type Snapshot = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// Source failed to compile; nothing ran
    #[error("{message}")]
    Syntax { message: String, line: Option<usize> },
    /// A statement raised while executing
    #[error("{message}")]
    Runtime { message: String, line: Option<usize> },
}

impl ExecError {
    pub fn message(&self) -> &str {
        match self {
            ExecError::Syntax { message, .. } | ExecError::Runtime { message, .. } => message,
        }
    }

    /// 1-based source line, when the runtime reported one
    pub fn line(&self) -> Option<usize> {
        match self {
            ExecError::Syntax { line, .. } | ExecError::Runtime { line, .. } => *line,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, ExecError::Syntax { .. })
    }
}

#[async_trait]
pub trait CodeExecutor: Send {
    /// Compile `code` without executing it.
    async fn validate(&mut self, code: &str) -> Result<(), ExecError>;

    /// Execute exactly one statement in the persistent namespace.
    async fn execute(&mut self, statement: &str) -> Result<(), ExecError>;

    /// Current visible globals, see [`is_visible_binding`].
    fn snapshot(&self) -> Snapshot;

    /// Everything written to stdout since the last [`CodeExecutor::reset_stdout`].
    fn read_stdout(&self) -> String;

    fn reset_stdout(&mut self);

    /// Bind a string global directly, bypassing execution.
    fn set_global(&mut self, name: &str, value: &str);

    /// Start over with an empty namespace and empty stdout.
    fn reset(&mut self);
}

/// Snapshot filter: hides `_`-prefixed names and runtime plumbing.
pub fn is_visible_binding(name: &str) -> bool {
    !name.starts_with('_') && !PLUMBING_NAMES.contains(&name)
}

/// The newest output line: last non-blank line of the accumulated buffer.
pub fn newest_output_line(stdout: &str) -> Option<&str> {
    stdout.lines().filter(|line| !line.trim().is_empty()).last()
}

/// [`CodeExecutor`] backed by the embedded interpreter
#[derive(Default)]
pub struct PythonExecutor {
    interpreter: Interpreter,
}

impl PythonExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line for a bare `input()` call reached during execution
    pub fn queue_input(&mut self, line: impl Into<String>) {
        self.interpreter.push_input(line);
    }

    /// Run a whole program in a fresh namespace, feeding `inputs` to
    /// `input()` in order, and return the captured stdout.
    pub fn run_program(&mut self, code: &str, inputs: &[String]) -> Result<String, ExecError> {
        self.interpreter.reset();
        for line in inputs {
            self.interpreter.push_input(line.clone());
        }
        self.interpreter
            .exec(code)
            .map_err(|e| exec_error(e, true))?;
        Ok(self.interpreter.stdout().to_string())
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }
}

/// Map a Python exception to the executor taxonomy. Compile errors keep
/// their line; single statements always report line 1, so theirs is dropped.
fn exec_error(err: PyError, whole_source: bool) -> ExecError {
    let line = whole_source.then_some(err.line());
    if err.kind.is_syntax() {
        let message = match line {
            Some(n) => format!("{} (line {})", err, n),
            None => err.to_string(),
        };
        ExecError::Syntax { message, line }
    } else {
        ExecError::Runtime {
            message: err.to_string(),
            line,
        }
    }
}

#[async_trait]
impl CodeExecutor for PythonExecutor {
    async fn validate(&mut self, code: &str) -> Result<(), ExecError> {
        Interpreter::check(code).map_err(|e| exec_error(e, true))?;
        Ok(())
    }

    async fn execute(&mut self, statement: &str) -> Result<(), ExecError> {
        debug!(statement, "executing statement");
        self.interpreter.exec(statement).map_err(|e| {
            // Even a compile failure here happens mid-run, so it halts like
            // any other runtime error.
            let message = e.to_string();
            ExecError::Runtime {
                message,
                line: None,
            }
        })
    }

    fn snapshot(&self) -> Snapshot {
        self.interpreter
            .globals()
            .filter(|(name, _)| is_visible_binding(name))
            .map(|(name, value)| (name.to_string(), value.to_str()))
            .collect()
    }

    fn read_stdout(&self) -> String {
        self.interpreter.stdout().to_string()
    }

    fn reset_stdout(&mut self) {
        self.interpreter.clear_stdout();
    }

    fn set_global(&mut self, name: &str, value: &str) {
        self.interpreter.set_global(name, Value::Str(value.to_string()));
    }

    fn reset(&mut self) {
        self.interpreter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_reports_syntax_error_with_line() {
        let mut executor = PythonExecutor::new();
        let err = executor
            .validate("x = 5\ny = (3 +\n")
            .await
            .unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.line(), Some(2));
    }

    #[tokio::test]
    async fn test_validate_does_not_execute() {
        let mut executor = PythonExecutor::new();
        executor.validate("x = 5\nprint(x)").await.expect("valid");
        assert!(executor.snapshot().is_empty());
        assert_eq!(executor.read_stdout(), "");
    }

    #[tokio::test]
    async fn test_globals_persist_between_statements() {
        let mut executor = PythonExecutor::new();
        executor.execute("length = 10").await.expect("exec");
        executor.execute("breadth = 20").await.expect("exec");
        executor.execute("area = length * breadth").await.expect("exec");
        assert_eq!(
            executor.snapshot(),
            vec![
                ("length".to_string(), "10".to_string()),
                ("breadth".to_string(), "20".to_string()),
                ("area".to_string(), "200".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_snapshot_hides_internal_names() {
        let mut executor = PythonExecutor::new();
        executor.set_global(TEMP_INPUT_NAME, "7");
        executor.set_global("sys", "module");
        executor.execute("a = int(_temp_input)").await.expect("exec");
        assert_eq!(executor.snapshot(), vec![("a".to_string(), "7".to_string())]);
    }

    #[tokio::test]
    async fn test_stdout_accumulates_until_reset() {
        let mut executor = PythonExecutor::new();
        executor.execute("print('one')").await.expect("exec");
        executor.execute("print('two')").await.expect("exec");
        assert_eq!(executor.read_stdout(), "one\ntwo\n");
        assert_eq!(newest_output_line(&executor.read_stdout()), Some("two"));
        executor.reset_stdout();
        assert_eq!(executor.read_stdout(), "");
    }

    #[tokio::test]
    async fn test_runtime_error() {
        let mut executor = PythonExecutor::new();
        let err = executor.execute("print(total)").await.unwrap_err();
        assert_eq!(
            err,
            ExecError::Runtime {
                message: "NameError: name 'total' is not defined".to_string(),
                line: None,
            }
        );
    }

    #[test]
    fn test_newest_output_line_skips_blank_lines() {
        assert_eq!(newest_output_line("a\nb\n\n   \n"), Some("b"));
        assert_eq!(newest_output_line(""), None);
    }

    #[test]
    fn test_run_program_with_inputs() {
        let mut executor = PythonExecutor::new();
        let out = executor
            .run_program(
                "a = int(input())\nb = int(input())\nprint(a + b)",
                &["3".to_string(), "4".to_string()],
            )
            .expect("run");
        assert_eq!(out, "7\n");
    }
}
