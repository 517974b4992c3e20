//! Line classifier
//!
//! A textual heuristic, not a parser: it only decides which animation a line
//! gets. Priority order is input call, print call, arithmetic operator outside
//! quotes, then plain assignment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

static INPUT_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\binput\s*\(").expect("valid regex"));
static PRINT_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bprint\s*\(").expect("valid regex"));

/// What a source line does, as far as the animations are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Assignment,
    Calculation,
    Print,
    Input,
}

impl LineKind {
    pub fn label(&self) -> &'static str {
        match self {
            LineKind::Assignment => "assignment",
            LineKind::Calculation => "calculation",
            LineKind::Print => "print",
            LineKind::Input => "input",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify one source line.
pub fn classify(line: &str) -> LineKind {
    if INPUT_CALL.is_match(line) {
        LineKind::Input
    } else if PRINT_CALL.is_match(line) {
        LineKind::Print
    } else if has_operator_outside_quotes(line) {
        LineKind::Calculation
    } else {
        LineKind::Assignment
    }
}

/// True when `+ - * /` appears outside any quoted substring.
pub fn has_operator_outside_quotes(line: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in line.chars() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '+' | '-' | '*' | '/' => return true,
                _ => {}
            },
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_cases() {
        assert_eq!(classify("x = 5"), LineKind::Assignment);
        assert_eq!(classify("area = l * w"), LineKind::Calculation);
        assert_eq!(classify("print(x)"), LineKind::Print);
        assert_eq!(classify("name = input(\"q: \")"), LineKind::Input);
    }

    #[test]
    fn test_input_wins_over_print() {
        assert_eq!(classify("print(input('age? '))"), LineKind::Input);
        assert_eq!(classify("n = int(input()) + 1"), LineKind::Input);
    }

    #[test]
    fn test_print_wins_over_arithmetic() {
        assert_eq!(classify("print(a + b)"), LineKind::Print);
    }

    #[test]
    fn test_operators_inside_quotes_are_ignored() {
        assert_eq!(classify("label = 'a-b'"), LineKind::Assignment);
        assert_eq!(classify("path = \"x/y\" + name"), LineKind::Calculation);
        assert_eq!(classify(r#"s = "it\"s-ok""#), LineKind::Assignment);
    }

    #[test]
    fn test_call_tokens_need_word_boundary() {
        assert_eq!(classify("reprint = 3"), LineKind::Assignment);
        assert_eq!(classify("my_input = 2"), LineKind::Assignment);
        assert_eq!(classify("print (x)"), LineKind::Print);
    }
}
