//! Explanation service collaborators
//!
//! Everything the remote explanation service returns is validated once, at
//! the transport boundary, into an [`ExplanationOutcome`]. Callers above the
//! boundary never see HTTP or JSON details and never fail: every consumer
//! has a canned fallback for the non-`Ok` outcomes.
//!
//! - [`client`]: transport trait, HTTP implementation and wire types
//! - [`requester`]: per-step and per-error explanations with fallbacks
//! - [`walkthrough`]: whole-program, per-line explanations
//! - [`chat`]: follow-up questions with a rolling history

pub mod chat;
pub mod client;
pub mod requester;
pub mod walkthrough;

pub use chat::ChatAssistant;
pub use client::{ExplanationTransport, HttpExplanationClient};
pub use requester::{Explanation, ExplanationRequester, ExplanationSource};
pub use walkthrough::{Walkthrough, WalkthroughEntry};

/// Result of one round trip to the explanation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplanationOutcome {
    /// Usable, non-empty text
    Ok(String),
    /// The service answered but the body did not have the expected shape
    Malformed(String),
    /// The service could not be reached, timed out or answered non-2xx
    TransportFailure(String),
}

impl ExplanationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ExplanationOutcome::Ok(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ExplanationOutcome::Ok(text) => Some(text),
            _ => None,
        }
    }
}
