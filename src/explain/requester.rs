//! Step and error explanations with canned fallbacks

use super::client::{ExplanationTransport, TutorialRequest};
use super::ExplanationOutcome;
use crate::executor::{newest_output_line, ExecError};
use crate::lesson::calls::assignment_target;
use crate::lesson::{LineKind, Step};
use crate::store::VariableStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const PRINT_FALLBACK: &str = "Perfect! Python printed the value from memory to the output screen!";
pub const ERROR_FALLBACK: &str =
    "❌ There's an error in your code. Double-check your spelling and syntax!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationSource {
    Service,
    Fallback,
}

/// Text for the teacher bubble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub text: String,
    pub source: ExplanationSource,
}

impl Explanation {
    fn service(text: String) -> Self {
        Explanation {
            text,
            source: ExplanationSource::Service,
        }
    }

    fn fallback(text: impl Into<String>) -> Self {
        Explanation {
            text: text.into(),
            source: ExplanationSource::Fallback,
        }
    }
}

/// Issues one request per step or error; never retries, never hangs.
#[derive(Clone)]
pub struct ExplanationRequester {
    transport: Arc<dyn ExplanationTransport>,
    timeout: Duration,
}

impl ExplanationRequester {
    pub fn new(transport: Arc<dyn ExplanationTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn transport(&self) -> &Arc<dyn ExplanationTransport> {
        &self.transport
    }

    /// One tutorial round trip, bounded by the requester's timeout
    pub async fn request(&self, code: &str, context: &str) -> ExplanationOutcome {
        let body = TutorialRequest {
            code: code.to_string(),
            output: context.to_string(),
        };
        match tokio::time::timeout(self.timeout, self.transport.tutorial(&body)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "explanation timed out");
                ExplanationOutcome::TransportFailure("request timed out".to_string())
            }
        }
    }

    /// Explain a step that just ran.
    ///
    /// Print steps send the newest output line as context; every other kind
    /// sends the variable store as a JSON object.
    pub async fn explain_step(&self, step: &Step, store: &VariableStore, stdout: &str) -> Explanation {
        let context = step_context(step, store, stdout);
        match self.request(&step.code, &context).await {
            ExplanationOutcome::Ok(text) => Explanation::service(text),
            ExplanationOutcome::Malformed(reason) => {
                debug!(%reason, line = step.line_number + 1, "using generic step explanation");
                Explanation::fallback(format!("Line {} executed successfully!", step.line_number + 1))
            }
            ExplanationOutcome::TransportFailure(_) => {
                Explanation::fallback(step_fallback(step, store))
            }
        }
    }

    /// Explain a syntax or runtime error, using the error text as context.
    pub async fn explain_error(&self, code: &str, error: &ExecError) -> Explanation {
        match self.request(code, error.message()).await {
            ExplanationOutcome::Ok(text) => Explanation::service(text),
            ExplanationOutcome::Malformed(_) => {
                Explanation::fallback(format!("Error: {}", error.message()))
            }
            ExplanationOutcome::TransportFailure(_) => Explanation::fallback(ERROR_FALLBACK),
        }
    }
}

pub fn step_context(step: &Step, store: &VariableStore, stdout: &str) -> String {
    match step.kind {
        LineKind::Print => newest_output_line(stdout).unwrap_or_default().to_string(),
        _ => store.to_json().to_string(),
    }
}

/// Kind-specific text used when the service is unreachable
pub fn step_fallback(step: &Step, store: &VariableStore) -> String {
    match step.kind {
        LineKind::Input => {
            let name = assignment_target(&step.code)
                .or_else(|| store.iter().last().map(|b| b.name.as_str()))
                .unwrap_or("a");
            let value = store.get(name).unwrap_or_default();
            format!(
                "Great! Python asked you for input and stored \"{}\" in the {} variable box!",
                value, name
            )
        }
        LineKind::Print => PRINT_FALLBACK.to_string(),
        _ => format!(
            "Line {}: {} - Executed successfully!",
            step.line_number + 1,
            step.code
        ),
    }
}
