//! Whole-program walkthrough: one explanation per line, annotated
//!
//! The service text is expected to contain a JSON array of strings. Each
//! entry may start with `Line N →`, may embed `<VARS>{json}</VARS>` for the
//! variable panel and `<CHALKBOARD>text</CHALKBOARD>` marking output to
//! highlight.

use super::client::{ExplanationTransport, WalkthroughRequest};
use super::ExplanationOutcome;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

static VARS_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<VARS>(.*?)</VARS>").expect("valid regex"));
static CHALKBOARD_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<CHALKBOARD>(.*?)</CHALKBOARD>").expect("valid regex"));
static CHALKBOARD_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?CHALKBOARD>").expect("valid regex"));
static LINE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Line (\d+) →").expect("valid regex"));

/// Shown when the service is down or its array does not parse
pub const FALLBACK_LINES: [&str; 3] = [
    "Line 1 → Fallback: A secure connection error occurred, so this is a generic explanation.",
    "Line 2 → Please ensure your backend proxy (server.js) is running in the terminal.",
    "Line 3 → The actual API key is now safe on the server side, where it belongs!",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "variables", rename_all = "lowercase")]
pub enum VariablePanel {
    /// No `<VARS>` tag: the panel keeps its placeholder
    Absent,
    Parsed(Vec<(String, String)>),
    /// The tag held something other than a JSON object
    Invalid,
}

impl VariablePanel {
    pub const PLACEHOLDER: &'static str = "Variables will be initialized here.";
    pub const INVALID: &'static str = "Variable data error";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkthroughEntry {
    /// 1-based line from a leading `Line N →`
    pub line: Option<usize>,
    /// Display text with the markup removed
    pub text: String,
    pub variables: VariablePanel,
    /// Output substring to highlight
    pub highlight: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Walkthrough {
    pub entries: Vec<WalkthroughEntry>,
}

impl Walkthrough {
    /// Ask for the walkthrough of `code`, given the inputs typed while it ran.
    pub async fn request(
        transport: &dyn ExplanationTransport,
        code: &str,
        input_history: &[String],
    ) -> Self {
        let body = WalkthroughRequest {
            code: code.to_string(),
            input_history: input_history.to_vec(),
        };
        let outcome = transport.walkthrough(&body).await;
        Self::from_lines(explanation_lines(outcome))
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Walkthrough {
            entries: lines.iter().map(|l| annotate(l)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn fallback_lines() -> Vec<String> {
    FALLBACK_LINES.iter().map(|l| l.to_string()).collect()
}

/// Split the service text into per-line explanations.
///
/// The array runs from the first `[` to the last `]`; if that does not parse
/// the canned lines are used. Text without brackets is split into its
/// non-blank lines.
pub fn explanation_lines(outcome: ExplanationOutcome) -> Vec<String> {
    let text = match outcome {
        ExplanationOutcome::Ok(text) => text,
        ExplanationOutcome::Malformed(reason) | ExplanationOutcome::TransportFailure(reason) => {
            warn!(%reason, "walkthrough unavailable, using fallback lines");
            return fallback_lines();
        }
    };

    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => {
            match serde_json::from_str::<Vec<serde_json::Value>>(&text[start..=end]) {
                Ok(values) => values
                    .into_iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
                Err(e) => {
                    warn!(error = %e, "walkthrough array did not parse");
                    fallback_lines()
                }
            }
        }
        _ => text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Extract the markup of one explanation line.
pub fn annotate(raw: &str) -> WalkthroughEntry {
    let mut text = raw.to_string();

    let variables = match VARS_TAG.captures(raw).and_then(|c| c.get(1)) {
        Some(m) if !m.as_str().is_empty() => {
            match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(m.as_str()) {
                Ok(map) => {
                    text = VARS_TAG.replace(&text, "").into_owned();
                    VariablePanel::Parsed(
                        map.into_iter()
                            .map(|(name, value)| (name, display_value(value)))
                            .collect(),
                    )
                }
                Err(_) => VariablePanel::Invalid,
            }
        }
        _ => VariablePanel::Absent,
    };

    let highlight = CHALKBOARD_TAG
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|h| !h.is_empty());
    if highlight.is_some() {
        text = CHALKBOARD_MARKUP.replace_all(&text, "").into_owned();
    }

    let line = LINE_PREFIX
        .captures(&text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());

    WalkthroughEntry {
        line,
        text,
        variables,
        highlight,
    }
}

fn display_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_between_outer_brackets() {
        let text = "Sure! Here you go:\n[\"Line 1 → a\", \"Line 2 → b\"]\nEnjoy";
        assert_eq!(
            explanation_lines(ExplanationOutcome::Ok(text.into())),
            vec!["Line 1 → a", "Line 2 → b"]
        );
    }

    #[test]
    fn test_unparseable_array_uses_fallback() {
        let lines = explanation_lines(ExplanationOutcome::Ok("[not json]".into()));
        assert_eq!(lines, FALLBACK_LINES.to_vec());
    }

    #[test]
    fn test_plain_text_split_into_lines() {
        let lines = explanation_lines(ExplanationOutcome::Ok("Line 1 → x\n\n  \nLine 2 → y".into()));
        assert_eq!(lines, vec!["Line 1 → x", "Line 2 → y"]);
    }

    #[test]
    fn test_transport_failure_uses_fallback() {
        let lines = explanation_lines(ExplanationOutcome::TransportFailure("down".into()));
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Line 1 → Fallback"));
    }

    #[test]
    fn test_annotate_vars_and_chalkboard() {
        let entry = annotate(
            "Line 2 → Python prints <CHALKBOARD>Hello</CHALKBOARD>.<VARS>{\"msg\": \"Hello\", \"n\": 3}</VARS>",
        );
        assert_eq!(entry.line, Some(2));
        assert_eq!(entry.text, "Line 2 → Python prints Hello.");
        assert_eq!(entry.highlight.as_deref(), Some("Hello"));
        assert_eq!(
            entry.variables,
            VariablePanel::Parsed(vec![
                ("msg".to_string(), "Hello".to_string()),
                ("n".to_string(), "3".to_string())
            ])
        );
    }

    #[test]
    fn test_invalid_vars_keeps_tag() {
        let entry = annotate("Line 1 → x <VARS>{oops}</VARS>");
        assert_eq!(entry.variables, VariablePanel::Invalid);
        assert!(entry.text.contains("<VARS>"));
    }

    #[test]
    fn test_no_line_prefix() {
        let entry = annotate("Python is done!");
        assert_eq!(entry.line, None);
        assert_eq!(entry.variables, VariablePanel::Absent);
        assert_eq!(entry.highlight, None);
    }
}
