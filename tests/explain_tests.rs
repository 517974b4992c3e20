//! Explanation service boundary against a mock HTTP server

use chalkstep::executor::ExecError;
use chalkstep::explain::client::{
    ChatRequest, TutorialRequest, CHAT_PATH, TUTORIAL_PATH, WALKTHROUGH_PATH,
};
use chalkstep::explain::requester::ERROR_FALLBACK;
use chalkstep::explain::walkthrough::{VariablePanel, FALLBACK_LINES};
use chalkstep::explain::{
    ChatAssistant, ExplanationOutcome, ExplanationRequester, ExplanationSource,
    ExplanationTransport, HttpExplanationClient, Walkthrough,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn candidates(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

fn client(server: &MockServer) -> HttpExplanationClient {
    HttpExplanationClient::new(server.uri(), Duration::from_secs(5)).expect("client")
}

fn tutorial_request() -> TutorialRequest {
    TutorialRequest {
        code: "print(\"Hello World!\")".into(),
        output: "Hello World!".into(),
    }
}

#[tokio::test]
async fn test_tutorial_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}", TUTORIAL_PATH)))
        .and(body_partial_json(json!({ "code": "print(\"Hello World!\")" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates("Python printed it!")))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).tutorial(&tutorial_request()).await;
    assert_eq!(outcome, ExplanationOutcome::Ok("Python printed it!".into()));
}

#[tokio::test]
async fn test_non_success_status_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}", TUTORIAL_PATH)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = client(&server).tutorial(&tutorial_request()).await;
    assert!(matches!(outcome, ExplanationOutcome::TransportFailure(_)));
}

#[tokio::test]
async fn test_missing_candidates_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}", TUTORIAL_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let outcome = client(&server).tutorial(&tutorial_request()).await;
    assert!(matches!(outcome, ExplanationOutcome::Malformed(_)));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}", TUTORIAL_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let outcome = client(&server).tutorial(&tutorial_request()).await;
    assert!(matches!(outcome, ExplanationOutcome::Malformed(_)));
}

#[tokio::test]
async fn test_unreachable_server_uses_error_fallback() {
    // Nothing listens on the mock server once it is dropped
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let client = HttpExplanationClient::new(uri, Duration::from_secs(2)).expect("client");
    let requester = ExplanationRequester::new(Arc::new(client), Duration::from_secs(2));

    let error = ExecError::Syntax {
        message: "SyntaxError: invalid syntax".into(),
        line: Some(1),
    };
    let explanation = requester.explain_error("x = = 1", &error).await;
    assert_eq!(explanation.source, ExplanationSource::Fallback);
    assert_eq!(explanation.text, ERROR_FALLBACK);
}

#[tokio::test]
async fn test_walkthrough_sends_input_history_and_annotates() {
    let server = MockServer::start().await;
    let text = r#"Here you go: ["Line 1 → Python asks for your name. <VARS>{\"name\": \"Ada\"}</VARS>", "Line 2 → It prints <CHALKBOARD>Hello Ada</CHALKBOARD>."]"#;
    Mock::given(method("POST"))
        .and(path(format!("/{}", WALKTHROUGH_PATH)))
        .and(body_partial_json(json!({ "inputHistory": ["Ada"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates(text)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let code = "name = input(\"Name: \")\nprint(\"Hello\", name)";
    let walkthrough = Walkthrough::request(&client, code, &["Ada".to_string()]).await;

    assert_eq!(walkthrough.len(), 2);
    let first = &walkthrough.entries[0];
    assert_eq!(first.line, Some(1));
    assert_eq!(
        first.variables,
        VariablePanel::Parsed(vec![("name".into(), "Ada".into())])
    );
    assert!(!first.text.contains("<VARS>"));
    assert_eq!(walkthrough.entries[1].highlight.as_deref(), Some("Hello Ada"));
    assert_eq!(walkthrough.entries[1].text, "Line 2 → It prints Hello Ada.");
}

#[tokio::test]
async fn test_walkthrough_falls_back_when_offline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}", WALKTHROUGH_PATH)))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let walkthrough = Walkthrough::request(&client(&server), "x = 1", &[]).await;
    let texts: Vec<&str> = walkthrough.entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, FALLBACK_LINES.to_vec());
}

#[tokio::test]
async fn test_chat_round_trip_keeps_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}", CHAT_PATH)))
        .and(body_partial_json(json!({ "query": "What is a variable?", "history": [] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "A labelled box." })))
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = ChatAssistant::new(Arc::new(client(&server)));
    let reply = chat.ask("What is a variable?", "x = 1", "").await;
    assert_eq!(reply, "A labelled box.");
    assert_eq!(chat.history().len(), 2);
}

#[tokio::test]
async fn test_chat_without_reply_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}", CHAT_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "?" })))
        .mount(&server)
        .await;

    let request = ChatRequest {
        query: "hi".into(),
        code: String::new(),
        output: String::new(),
        history: Vec::new(),
    };
    let outcome = client(&server).chat(&request).await;
    assert!(matches!(outcome, ExplanationOutcome::Malformed(_)));
}
