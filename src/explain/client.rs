//! Transport to the explanation service

use super::ExplanationOutcome;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const TUTORIAL_PATH: &str = "generate-tutorial-explanation";
pub const WALKTHROUGH_PATH: &str = "generate-explanation";
pub const CHAT_PATH: &str = "chat-with-assistant";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

// Request bodies

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorialRequest {
    pub code: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkthroughRequest {
    pub code: String,
    #[serde(rename = "inputHistory")]
    pub input_history: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub parts: Vec<TextPart>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        ChatTurn {
            role,
            parts: vec![TextPart { text: text.into() }],
        }
    }

    pub fn text(&self) -> &str {
        self.parts.first().map(|p| p.text.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub query: String,
    pub code: String,
    pub output: String,
    pub history: Vec<ChatTurn>,
}

// Response bodies

#[derive(Debug, Deserialize)]
struct CandidatesResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<TextPart>>,
}

impl CandidatesResponse {
    /// `candidates[0].content.parts[0].text`, when present and non-empty
    fn first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()
            .map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    reply: Option<String>,
}

/// The three operations of the explanation service
#[async_trait]
pub trait ExplanationTransport: Send + Sync {
    /// Explain one line (or an error) given its output or variables
    async fn tutorial(&self, request: &TutorialRequest) -> ExplanationOutcome;

    /// Explain a whole program; the text should hold a JSON array of lines
    async fn walkthrough(&self, request: &WalkthroughRequest) -> ExplanationOutcome;

    /// Answer a free-form question
    async fn chat(&self, request: &ChatRequest) -> ExplanationOutcome;
}

/// HTTP transport against the local explanation proxy
pub struct HttpExplanationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExplanationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// POST `body` and decode the response as `R`. The error side is the
    /// non-`Ok` outcome to hand back to the caller.
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ExplanationOutcome>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "explanation request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_failure(path, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport_failure(path, format!("HTTP {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_failure(path, e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| {
            warn!(path, error = %e, "malformed explanation response");
            ExplanationOutcome::Malformed(e.to_string())
        })
    }

    async fn candidates<B: Serialize + Sync>(&self, path: &str, body: &B) -> ExplanationOutcome {
        match self.post::<B, CandidatesResponse>(path, body).await {
            Ok(parsed) => match parsed.first_text() {
                Some(text) => ExplanationOutcome::Ok(text),
                None => ExplanationOutcome::Malformed("no content in response".to_string()),
            },
            Err(outcome) => outcome,
        }
    }
}

fn transport_failure(path: &str, reason: String) -> ExplanationOutcome {
    warn!(path, %reason, "explanation service unreachable");
    ExplanationOutcome::TransportFailure(reason)
}

#[async_trait]
impl ExplanationTransport for HttpExplanationClient {
    async fn tutorial(&self, request: &TutorialRequest) -> ExplanationOutcome {
        self.candidates(TUTORIAL_PATH, request).await
    }

    async fn walkthrough(&self, request: &WalkthroughRequest) -> ExplanationOutcome {
        self.candidates(WALKTHROUGH_PATH, request).await
    }

    async fn chat(&self, request: &ChatRequest) -> ExplanationOutcome {
        match self.post::<_, ChatResponse>(CHAT_PATH, request).await {
            Ok(ChatResponse { reply: Some(reply) }) if !reply.trim().is_empty() => {
                ExplanationOutcome::Ok(reply)
            }
            Ok(_) => ExplanationOutcome::Malformed("no reply in response".to_string()),
            Err(outcome) => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkthrough_request_field_names() {
        let body = WalkthroughRequest {
            code: "x = 1".into(),
            input_history: vec!["5".into()],
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["inputHistory"][0], "5");
    }

    #[test]
    fn test_chat_turn_shape() {
        let turn = ChatTurn::new(ChatRole::Model, "hi");
        let json = serde_json::to_value(&turn).expect("serialize");
        assert_eq!(json, serde_json::json!({"role": "model", "parts": [{"text": "hi"}]}));
    }

    #[test]
    fn test_first_text_extraction() {
        let parsed: CandidatesResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Nice!"}]}}]}"#,
        )
        .expect("parse");
        assert_eq!(parsed.first_text().as_deref(), Some("Nice!"));

        let empty: CandidatesResponse =
            serde_json::from_str(r#"{"candidates":[]}"#).expect("parse");
        assert_eq!(empty.first_text(), None);

        let missing: CandidatesResponse = serde_json::from_str("{}").expect("parse");
        assert_eq!(missing.first_text(), None);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = HttpExplanationClient::new("http://localhost:3000/", Duration::from_secs(1))
            .expect("client");
        assert_eq!(
            client.url(TUTORIAL_PATH),
            "http://localhost:3000/generate-tutorial-explanation"
        );
    }
}
