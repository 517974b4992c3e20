//! Lexical helpers for `print(...)` and `input(...)` lines
//!
//! These drive which sub-animations play. They never decide what the program
//! outputs: printed text always comes from the executor's captured stdout.

use crate::store::VariableStore;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static PRINT_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"print\((.*)\)").expect("valid regex"));
static ASSIGN_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z_]\w*)\s*=[^=]").expect("valid regex"));
static CONVERTED_INPUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(int|float)\s*\(\s*input\s*\(").expect("valid regex"));
static CALCULATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*=\s*(\w+)\s*([*+\-/])\s*(\w+)").expect("valid regex"));

/// Prompt shown when an `input()` call has no string literal prompt
pub const DEFAULT_INPUT_PROMPT: &str = "Enter value:";

/// One argument of a `print(...)` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PrintPart {
    /// A quoted literal, taken verbatim (internal commas included)
    #[serde(rename = "string")]
    Literal { value: String },
    /// Any other token, looked up in the variable store at render time
    Variable { name: String },
}

impl PrintPart {
    /// Display text for the spark: literal text, or the variable's current
    /// value falling back to its name when unbound or empty.
    pub fn resolve(&self, store: &VariableStore) -> String {
        match self {
            PrintPart::Literal { value } => value.clone(),
            PrintPart::Variable { name } => store
                .get(name)
                .filter(|v| !v.is_empty())
                .unwrap_or(name)
                .to_string(),
        }
    }
}

/// Greedy `print\((.*)\)` capture: everything between the first `print(` and
/// the last `)` on the line.
pub fn print_content(line: &str) -> Option<&str> {
    PRINT_CONTENT
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Split a print argument list into literal and variable parts.
///
/// Quoted runs are atomic and may contain commas. Outside quotes, spaces are
/// dropped and a comma closes the pending variable token.
pub fn parse_print_args(content: &str) -> Vec<PrintPart> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut quote_char: Option<char> = None;

    for c in content.chars() {
        if (c == '"' || c == '\'') && !in_quote {
            in_quote = true;
            quote_char = Some(c);
            current.clear();
        } else if in_quote && Some(c) == quote_char {
            in_quote = false;
            parts.push(PrintPart::Literal {
                value: std::mem::take(&mut current),
            });
        } else if c == ',' && !in_quote {
            if !current.trim().is_empty() {
                parts.push(PrintPart::Variable {
                    name: current.trim().to_string(),
                });
                current.clear();
            }
        } else if in_quote || c != ' ' {
            current.push(c);
        }
    }

    if !current.trim().is_empty() {
        parts.push(PrintPart::Variable {
            name: current.trim().to_string(),
        });
    }

    parts
}

/// Parts of the print call on `line`, empty when the line has no print call
pub fn print_parts(line: &str) -> Vec<PrintPart> {
    print_content(line).map(parse_print_args).unwrap_or_default()
}

/// Name bound by a simple `name = ...` line
pub fn assignment_target(line: &str) -> Option<&str> {
    ASSIGN_TARGET
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// `int(input())` / `float(input())`: the value is converted on the way in
pub fn input_is_converted(line: &str) -> bool {
    CONVERTED_INPUT.is_match(line)
}

/// Operands and operator of a `target = a <op> b` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationParts {
    pub target: String,
    pub left: String,
    pub operator: char,
    pub right: String,
}

pub fn calculation_parts(line: &str) -> Option<CalculationParts> {
    let caps = CALCULATION.captures(line)?;
    Some(CalculationParts {
        target: caps.get(1)?.as_str().to_string(),
        left: caps.get(2)?.as_str().to_string(),
        operator: caps.get(3)?.as_str().chars().next()?,
        right: caps.get(4)?.as_str().to_string(),
    })
}

/// Byte span of the first `input(...)` call outside quotes, closing
/// parenthesis included.
pub fn input_call_span(line: &str) -> Option<(usize, usize)> {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if b == b'"' || b == b'\'' {
            quote = Some(b);
            i += 1;
            continue;
        }

        let boundary = i == 0 || !(bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_');
        if boundary && bytes[i..].starts_with(b"input") {
            let mut j = i + "input".len();
            while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'(' {
                let close = matching_paren(line, j)?;
                return Some((i, close + 1));
            }
        }
        i += 1;
    }
    None
}

/// Index of the `)` closing the `(` at `open`, honoring nesting and quotes
fn matching_paren(line: &str, open: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Replace the line's `input(...)` call with `replacement`, so an injected
/// value flows through whatever conversion wraps the call.
pub fn substitute_input_call(line: &str, replacement: &str) -> Option<String> {
    let (start, end) = input_call_span(line)?;
    Some(format!("{}{}{}", &line[..start], replacement, &line[end..]))
}

/// First string literal inside the `input(...)` call, used as the prompt
pub fn input_prompt(line: &str) -> String {
    input_call_span(line)
        .and_then(|(start, end)| first_string_literal(&line[start..end]))
        .unwrap_or_else(|| DEFAULT_INPUT_PROMPT.to_string())
}

fn first_string_literal(text: &str) -> Option<String> {
    let start = text.find(['"', '\''])?;
    let quote = text[start..].chars().next()?;
    let body = &text[start + 1..];
    let end = body.find(quote)?;
    Some(body[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(s: &str) -> PrintPart {
        PrintPart::Literal {
            value: s.to_string(),
        }
    }

    fn variable(s: &str) -> PrintPart {
        PrintPart::Variable {
            name: s.to_string(),
        }
    }

    #[test]
    fn test_literal_then_variable() {
        assert_eq!(
            parse_print_args("\"Sum is\", total"),
            vec![literal("Sum is"), variable("total")]
        );
    }

    #[test]
    fn test_comma_inside_quotes_is_not_a_separator() {
        let parts = parse_print_args("\"a,b\", x");
        assert_eq!(parts, vec![literal("a,b"), variable("x")]);
    }

    #[test]
    fn test_single_quotes_and_inner_spaces() {
        assert_eq!(
            parse_print_args("'User Number is',  userNo"),
            vec![literal("User Number is"), variable("userNo")]
        );
    }

    #[test]
    fn test_expression_arguments_lose_spaces() {
        // Spaces outside quotes are dropped, so `a + b` becomes one token.
        assert_eq!(parse_print_args("a + b"), vec![variable("a+b")]);
    }

    #[test]
    fn test_mixed_quote_kinds() {
        assert_eq!(
            parse_print_args(r#""it's", 'say "hi"'"#),
            vec![literal("it's"), literal("say \"hi\"")]
        );
    }

    #[test]
    fn test_print_content_is_greedy() {
        assert_eq!(print_content("print(len(name))"), Some("len(name)"));
        assert_eq!(print_content("x = 5"), None);
    }

    #[test]
    fn test_resolve_against_store() {
        let mut store = VariableStore::new();
        store.apply_snapshot(&[
            ("area".to_string(), "200".to_string()),
            ("blank".to_string(), String::new()),
        ]);
        assert_eq!(variable("area").resolve(&store), "200");
        assert_eq!(variable("missing").resolve(&store), "missing");
        assert_eq!(variable("blank").resolve(&store), "blank");
        assert_eq!(literal("hi").resolve(&store), "hi");
    }

    #[test]
    fn test_substitute_input_call() {
        assert_eq!(
            substitute_input_call("a = int(input())", "_temp_input").as_deref(),
            Some("a = int(_temp_input)")
        );
        assert_eq!(
            substitute_input_call("name = input(\"Enter (your) name: \")", "_v").as_deref(),
            Some("name = _v")
        );
        assert_eq!(substitute_input_call("x = 'input()'", "_v"), None);
    }

    #[test]
    fn test_input_prompt() {
        assert_eq!(input_prompt("name = input(\"Enter your name: \")"), "Enter your name: ");
        assert_eq!(input_prompt("a = input()"), DEFAULT_INPUT_PROMPT);
    }

    #[test]
    fn test_assignment_target() {
        assert_eq!(assignment_target("name = input()"), Some("name"));
        assert_eq!(assignment_target("x == 3"), None);
        assert_eq!(assignment_target("print(x)"), None);
    }

    #[test]
    fn test_calculation_parts() {
        let parts = calculation_parts("area = length * breadth").expect("parts");
        assert_eq!(parts.target, "area");
        assert_eq!(parts.left, "length");
        assert_eq!(parts.operator, '*');
        assert_eq!(parts.right, "breadth");
        assert!(calculation_parts("x = 5").is_none());
    }

    #[test]
    fn test_converted_input() {
        assert!(input_is_converted("a = int(input())"));
        assert!(!input_is_converted("a = input()"));
    }
}
