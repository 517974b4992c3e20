//! Lexer (tokenizer) for the beginner Python subset
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Line breaks are significant and become [`Token::Newline`], except inside
//! brackets where Python joins lines implicitly. The subset has no blocks, so
//! any indentation at the start of a logical line is an `IndentationError`.

use super::ast::SourceLocation;
use super::errors::{PyError, PyErrorKind};
use num_bigint::BigInt;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that syntax errors can report
/// an accurate line and column.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Int(BigInt, SourceLocation),
    Float(f64, SourceLocation),
    Str(String, SourceLocation),
    FStr(String, SourceLocation),

    Ident(String, SourceLocation),

    // Supported keywords
    True(SourceLocation),
    False(SourceLocation),
    NoneKw(SourceLocation),
    And(SourceLocation),
    Or(SourceLocation),
    Not(SourceLocation),
    Pass(SourceLocation),

    /// Any other reserved word (`if`, `for`, `def`, ...). Lexed so the parser
    /// can report a friendly error instead of "invalid syntax".
    Keyword(String, SourceLocation),

    // Arithmetic
    Plus(SourceLocation),        // +
    Minus(SourceLocation),       // -
    Star(SourceLocation),        // *
    DoubleStar(SourceLocation),  // **
    Slash(SourceLocation),       // /
    DoubleSlash(SourceLocation), // //
    Percent(SourceLocation),     // %

    // Comparison
    EqEq(SourceLocation),  // ==
    NotEq(SourceLocation), // !=
    Lt(SourceLocation),    // <
    Le(SourceLocation),    // <=
    Gt(SourceLocation),    // >
    Ge(SourceLocation),    // >=

    // Assignment
    Eq(SourceLocation),            // =
    PlusEq(SourceLocation),        // +=
    MinusEq(SourceLocation),       // -=
    StarEq(SourceLocation),        // *=
    DoubleStarEq(SourceLocation),  // **=
    SlashEq(SourceLocation),       // /=
    DoubleSlashEq(SourceLocation), // //=
    PercentEq(SourceLocation),     // %=

    // Punctuation
    LParen(SourceLocation),
    RParen(SourceLocation),
    LBracket(SourceLocation),
    RBracket(SourceLocation),
    Comma(SourceLocation),
    Dot(SourceLocation),
    Colon(SourceLocation),
    Semicolon(SourceLocation),

    Newline(SourceLocation),
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::Int(_, loc)
            | Token::Float(_, loc)
            | Token::Str(_, loc)
            | Token::FStr(_, loc)
            | Token::Ident(_, loc)
            | Token::Keyword(_, loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::NoneKw(loc)
            | Token::And(loc)
            | Token::Or(loc)
            | Token::Not(loc)
            | Token::Pass(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::DoubleStar(loc)
            | Token::Slash(loc)
            | Token::DoubleSlash(loc)
            | Token::Percent(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::Eq(loc)
            | Token::PlusEq(loc)
            | Token::MinusEq(loc)
            | Token::StarEq(loc)
            | Token::DoubleStarEq(loc)
            | Token::SlashEq(loc)
            | Token::DoubleSlashEq(loc)
            | Token::PercentEq(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Comma(loc)
            | Token::Dot(loc)
            | Token::Colon(loc)
            | Token::Semicolon(loc)
            | Token::Newline(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

const RESERVED_WORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "def", "class", "return", "import", "from", "as",
    "with", "try", "except", "finally", "lambda", "in", "is", "del", "global", "nonlocal",
    "assert", "break", "continue", "yield", "raise", "async", "await",
];

/// Lexer state machine for converting source to tokens
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Open brackets with their locations, innermost last
    brackets: Vec<(char, SourceLocation)>,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            brackets: Vec::new(),
            at_line_start: true,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, PyError> {
        let mut tokens: Vec<Token> = Vec::new();

        loop {
            if self.at_line_start && self.brackets.is_empty() {
                self.check_indentation()?;
            }
            self.skip_inline_whitespace()?;

            let Some(c) = self.peek() else { break };

            if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            if c == '\n' {
                let loc = self.current_location();
                self.advance();
                if self.brackets.is_empty() {
                    let last_is_break = matches!(tokens.last(), None | Some(Token::Newline(_)));
                    if !last_is_break {
                        tokens.push(Token::Newline(loc));
                    }
                    self.at_line_start = true;
                }
                continue;
            }

            self.at_line_start = false;
            let token = self.next_token()?;
            tokens.push(token);
        }

        if let Some((open, loc)) = self.brackets.last() {
            return Err(PyError::syntax(format!("'{}' was never closed", open), *loc));
        }

        let loc = self.current_location();
        if !matches!(tokens.last(), None | Some(Token::Newline(_))) {
            tokens.push(Token::Newline(loc));
        }
        tokens.push(Token::Eof(loc));
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, PyError> {
        let loc = self.current_location();
        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(Token::Eof(loc)),
        };

        let token = match c {
            '+' => self.with_eq(Token::PlusEq(loc), Token::Plus(loc)),
            '-' => self.with_eq(Token::MinusEq(loc), Token::Minus(loc)),
            '%' => self.with_eq(Token::PercentEq(loc), Token::Percent(loc)),
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    self.with_eq(Token::DoubleStarEq(loc), Token::DoubleStar(loc))
                } else {
                    self.with_eq(Token::StarEq(loc), Token::Star(loc))
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    self.with_eq(Token::DoubleSlashEq(loc), Token::DoubleSlash(loc))
                } else {
                    self.with_eq(Token::SlashEq(loc), Token::Slash(loc))
                }
            }
            '=' => self.with_eq(Token::EqEq(loc), Token::Eq(loc)),
            '<' => self.with_eq(Token::Le(loc), Token::Lt(loc)),
            '>' => self.with_eq(Token::Ge(loc), Token::Gt(loc)),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::NotEq(loc)
                } else {
                    return Err(PyError::syntax("invalid syntax", loc));
                }
            }
            '(' => {
                self.brackets.push(('(', loc));
                Token::LParen(loc)
            }
            '[' => {
                self.brackets.push(('[', loc));
                Token::LBracket(loc)
            }
            ')' => {
                self.close_bracket('(', ')', loc)?;
                Token::RParen(loc)
            }
            ']' => {
                self.close_bracket('[', ']', loc)?;
                Token::RBracket(loc)
            }
            ',' => Token::Comma(loc),
            ':' => Token::Colon(loc),
            ';' => Token::Semicolon(loc),
            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.number_literal(c, loc)?
                } else {
                    Token::Dot(loc)
                }
            }
            '"' | '\'' => {
                let text = self.string_literal(c, false, loc)?;
                Token::Str(text, loc)
            }
            '{' | '}' => {
                return Err(PyError::syntax(
                    "dictionaries and sets are not supported in step-by-step lessons",
                    loc,
                ));
            }
            c if c.is_ascii_digit() => self.number_literal(c, loc)?,
            c if c.is_alphabetic() || c == '_' => self.identifier_or_keyword(c, loc)?,
            c if c.is_ascii() => return Err(PyError::syntax("invalid syntax", loc)),
            c => {
                return Err(PyError::syntax(
                    format!("invalid character '{}' (U+{:04X})", c, c as u32),
                    loc,
                ));
            }
        };

        Ok(token)
    }

    fn with_eq(&mut self, with: Token, without: Token) -> Token {
        if self.peek() == Some('=') {
            self.advance();
            with
        } else {
            without
        }
    }

    fn close_bracket(&mut self, open: char, close: char, loc: SourceLocation) -> Result<(), PyError> {
        match self.brackets.pop() {
            Some((o, _)) if o == open => Ok(()),
            Some((o, _)) => Err(PyError::syntax(
                format!(
                    "closing parenthesis '{}' does not match opening parenthesis '{}'",
                    close, o
                ),
                loc,
            )),
            None => Err(PyError::syntax(format!("unmatched '{}'", close), loc)),
        }
    }

    /// Lex a string body after its opening quote. Handles triple quotes and,
    /// unless `raw`, backslash escapes.
    fn string_literal(
        &mut self,
        quote: char,
        raw: bool,
        start: SourceLocation,
    ) -> Result<String, PyError> {
        let triple = self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut text = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.unterminated(triple, start));
            };

            if c == '\n' && !triple {
                return Err(self.unterminated(triple, start));
            }

            if c == quote {
                if !triple {
                    self.advance();
                    return Ok(text);
                }
                if self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote) {
                    self.advance();
                    self.advance();
                    self.advance();
                    return Ok(text);
                }
            }

            self.advance();
            if c != '\\' {
                text.push(c);
                continue;
            }

            let Some(next) = self.advance() else {
                return Err(self.unterminated(triple, start));
            };
            if raw {
                text.push('\\');
                text.push(next);
                continue;
            }
            match next {
                'n' => text.push('\n'),
                't' => text.push('\t'),
                'r' => text.push('\r'),
                '0' => text.push('\0'),
                'a' => text.push('\x07'),
                'b' => text.push('\x08'),
                'f' => text.push('\x0c'),
                'v' => text.push('\x0b'),
                '\\' => text.push('\\'),
                '\'' => text.push('\''),
                '"' => text.push('"'),
                '\n' => {}
                'x' => {
                    let hex: String = [self.advance(), self.advance()]
                        .iter()
                        .flatten()
                        .collect();
                    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        Some(ch) if hex.len() == 2 => text.push(ch),
                        _ => {
                            return Err(PyError::syntax(
                                "(unicode error) truncated \\xXX escape",
                                start,
                            ));
                        }
                    }
                }
                other => {
                    text.push('\\');
                    text.push(other);
                }
            }
        }
    }

    fn unterminated(&self, triple: bool, start: SourceLocation) -> PyError {
        let what = if triple {
            "unterminated triple-quoted string literal"
        } else {
            "unterminated string literal"
        };
        PyError::syntax(
            format!("{} (detected at line {})", what, self.line),
            start,
        )
    }

    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<Token, PyError> {
        // Prefixed integers
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let mut digits = String::new();
                while let Some(c) = self.peek() {
                    if c.is_digit(radix) {
                        digits.push(c);
                    } else if c != '_' {
                        break;
                    }
                    self.advance();
                }
                return BigInt::parse_bytes(digits.as_bytes(), radix)
                    .map(|n| Token::Int(n, loc))
                    .ok_or_else(|| PyError::syntax("invalid number literal", loc));
            }
        }

        let mut text = String::new();
        text.push(first);
        let mut is_float = first == '.';

        self.consume_digits(&mut text);
        if !is_float && self.peek() == Some('.') {
            is_float = true;
            text.push('.');
            self.advance();
            self.consume_digits(&mut text);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = self.peek_ahead(1);
            let digit_at = if matches!(sign, Some('+' | '-')) { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('e');
                self.advance();
                if digit_at == 2 {
                    if let Some(s) = self.advance() {
                        text.push(s);
                    }
                }
                self.consume_digits(&mut text);
            }
        }

        if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            return Err(PyError::syntax("invalid decimal literal", loc));
        }

        if is_float {
            let text = if text.starts_with('.') { format!("0{}", text) } else { text };
            return text
                .parse::<f64>()
                .map(|f| Token::Float(f, loc))
                .map_err(|_| PyError::syntax("invalid decimal literal", loc));
        }

        if text.len() > 1 && text.starts_with('0') && text.chars().any(|c| c != '0') {
            return Err(PyError::syntax(
                "leading zeros in decimal integer literals are not permitted; use an 0o prefix for octal integers",
                loc,
            ));
        }

        text.parse::<BigInt>()
            .map(|n| Token::Int(n, loc))
            .map_err(|_| PyError::syntax("invalid decimal literal", loc))
    }

    fn consume_digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '_' && self.peek_ahead(1).is_some_and(|n| n.is_ascii_digit()) {
                // digit separator
            } else {
                break;
            }
            self.advance();
        }
    }

    fn identifier_or_keyword(&mut self, first: char, loc: SourceLocation) -> Result<Token, PyError> {
        let mut ident = String::new();
        ident.push(first);

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // String prefixes: f"..", r"..", rf"..", u".."
        if let Some(quote @ ('"' | '\'')) = self.peek() {
            let prefix = ident.to_ascii_lowercase();
            if matches!(prefix.as_str(), "f" | "r" | "u" | "rf" | "fr") {
                self.advance();
                let raw = prefix.contains('r');
                let text = self.string_literal(quote, raw, loc)?;
                return Ok(if prefix.contains('f') {
                    Token::FStr(text, loc)
                } else {
                    Token::Str(text, loc)
                });
            }
        }

        let token = match ident.as_str() {
            "True" => Token::True(loc),
            "False" => Token::False(loc),
            "None" => Token::NoneKw(loc),
            "and" => Token::And(loc),
            "or" => Token::Or(loc),
            "not" => Token::Not(loc),
            "pass" => Token::Pass(loc),
            word if RESERVED_WORDS.contains(&word) => Token::Keyword(ident, loc),
            _ => Token::Ident(ident, loc),
        };

        Ok(token)
    }

    fn check_indentation(&mut self) -> Result<(), PyError> {
        let mut indent = 0;
        while matches!(self.peek_ahead(indent), Some(' ' | '\t' | '\x0c')) {
            indent += 1;
        }
        let next = self.peek_ahead(indent);
        let blank = matches!(next, None | Some('\n' | '\r' | '#'));
        if indent > 0 && !blank {
            for _ in 0..indent {
                self.advance();
            }
            return Err(PyError::new(
                PyErrorKind::IndentationError,
                "unexpected indent",
                self.current_location(),
            ));
        }
        Ok(())
    }

    fn skip_inline_whitespace(&mut self) -> Result<(), PyError> {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.advance();
                }
                '\\' => {
                    let loc = self.current_location();
                    let next = self.peek_ahead(1);
                    let next = if next == Some('\r') { self.peek_ahead(2) } else { next };
                    if next != Some('\n') {
                        return Err(PyError::syntax(
                            "unexpected character after line continuation character",
                            loc,
                        ));
                    }
                    while self.peek() != Some('\n') {
                        self.advance();
                    }
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.input.get(self.position).copied()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}
