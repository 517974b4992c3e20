//! Follow-up questions about the current program

use super::client::{ChatRequest, ChatRole, ChatTurn, ExplanationTransport};
use super::ExplanationOutcome;
use std::sync::Arc;
use tracing::warn;

/// Turns sent with each question
pub const CONTEXT_TURNS: usize = 4;
pub const CONNECTION_LOST: &str = "Connection lost. Is the server running?";

pub struct ChatAssistant {
    transport: Arc<dyn ExplanationTransport>,
    history: Vec<ChatTurn>,
}

impl ChatAssistant {
    pub fn new(transport: Arc<dyn ExplanationTransport>) -> Self {
        Self {
            transport,
            history: Vec::new(),
        }
    }

    /// The remembered turns, at most [`CONTEXT_TURNS`]
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Ask `query` about `code` and its `output`.
    ///
    /// Only a successful exchange is remembered; a failure answers with
    /// [`CONNECTION_LOST`] and leaves the history untouched.
    pub async fn ask(&mut self, query: &str, code: &str, output: &str) -> String {
        let query = query.trim();
        let request = ChatRequest {
            query: query.to_string(),
            code: code.to_string(),
            output: output.to_string(),
            history: self.history.clone(),
        };

        match self.transport.chat(&request).await {
            ExplanationOutcome::Ok(reply) => {
                self.history.push(ChatTurn::new(ChatRole::User, query));
                self.history.push(ChatTurn::new(ChatRole::Model, reply.clone()));
                let excess = self.history.len().saturating_sub(CONTEXT_TURNS);
                self.history.drain(..excess);
                reply
            }
            ExplanationOutcome::Malformed(reason) | ExplanationOutcome::TransportFailure(reason) => {
                warn!(%reason, "chat request failed");
                CONNECTION_LOST.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::client::{TutorialRequest, WalkthroughRequest};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the query back and records the history length it was sent
    #[derive(Default)]
    struct Echo {
        sent_history: Mutex<Vec<usize>>,
        fail: bool,
    }

    #[async_trait]
    impl ExplanationTransport for Echo {
        async fn tutorial(&self, _: &TutorialRequest) -> ExplanationOutcome {
            ExplanationOutcome::TransportFailure("unused".into())
        }
        async fn walkthrough(&self, _: &WalkthroughRequest) -> ExplanationOutcome {
            ExplanationOutcome::TransportFailure("unused".into())
        }
        async fn chat(&self, request: &ChatRequest) -> ExplanationOutcome {
            if let Ok(mut sent) = self.sent_history.lock() {
                sent.push(request.history.len());
            }
            if self.fail {
                ExplanationOutcome::TransportFailure("refused".into())
            } else {
                ExplanationOutcome::Ok(format!("you asked: {}", request.query))
            }
        }
    }

    #[tokio::test]
    async fn test_history_window_and_growth() {
        let echo = Arc::new(Echo::default());
        let mut chat = ChatAssistant::new(echo.clone());
        for i in 0..4 {
            let reply = chat.ask(&format!("q{}", i), "x = 1", "").await;
            assert_eq!(reply, format!("you asked: q{}", i));
        }
        assert_eq!(chat.history().len(), CONTEXT_TURNS);
        assert_eq!(chat.history()[3].role, ChatRole::Model);
        assert_eq!(chat.history()[2].text(), "q3");
        let sent = echo.sent_history.lock().expect("lock").clone();
        assert_eq!(sent, vec![0, 2, 4, 4]);
    }

    #[tokio::test]
    async fn test_failure_not_recorded() {
        let echo = Arc::new(Echo {
            fail: true,
            ..Echo::default()
        });
        let mut chat = ChatAssistant::new(echo);
        assert_eq!(chat.ask("why?", "", "").await, CONNECTION_LOST);
        assert!(chat.history().is_empty());
    }
}
