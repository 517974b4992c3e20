//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct, its token helpers, and statement
//! parsing. Expression parsing lives in `expressions` as a second `impl Parser`
//! block so both halves share the same cursor state.
//!
//! The subset is deliberately flat: one simple statement per logical line
//! (assignment, augmented assignment, expression, `pass`). Block statements
//! are rejected with a message the learner can act on.

use super::ast::*;
use super::errors::PyError;
use super::lexer::{Lexer, Token};

/// Recursive descent parser for the Python subset
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, PyError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse every statement in the source
    pub fn parse_program(&mut self) -> Result<Program, PyError> {
        let mut program = Program::default();

        loop {
            while matches!(self.peek(), Token::Newline(_) | Token::Semicolon(_)) {
                self.advance();
            }
            if self.is_at_end() {
                break;
            }

            let statement = self.parse_statement()?;
            program.statements.push(statement);
            self.expect_statement_end()?;
        }

        Ok(program)
    }

    fn parse_statement(&mut self) -> Result<Stmt, PyError> {
        match self.peek().clone() {
            Token::Pass(loc) => {
                self.advance();
                return Ok(Stmt::Pass(loc));
            }
            Token::Keyword(word, loc) => return Err(unsupported_keyword(&word, loc)),
            _ => {}
        }

        let location = self.current_location();
        let expr = self.parse_expression()?;

        if let Some(op) = self.augmented_operator() {
            self.advance();
            let ExprKind::Name(target) = expr.kind else {
                return Err(PyError::syntax(
                    format!(
                        "'{}' is an illegal expression for augmented assignment",
                        expr.describe()
                    ),
                    expr.location,
                ));
            };
            let value = self.parse_expression()?;
            return Ok(Stmt::AugAssign {
                target,
                op,
                value,
                location,
            });
        }

        if !self.check(&Token::Eq(location)) {
            return Ok(Stmt::Expr(expr));
        }

        let mut chain = vec![expr];
        while self.match_token(&Token::Eq(location)) {
            chain.push(self.parse_expression()?);
        }
        let value = chain.pop().ok_or_else(|| PyError::syntax("invalid syntax", location))?;

        let mut targets = Vec::with_capacity(chain.len());
        for target in chain {
            match target.kind {
                ExprKind::Name(name) => targets.push(name),
                _ => {
                    return Err(PyError::syntax(
                        format!(
                            "cannot assign to {} here. Maybe you meant '==' instead of '='?",
                            target.describe()
                        ),
                        target.location,
                    ));
                }
            }
        }

        Ok(Stmt::Assign {
            targets,
            value,
            location,
        })
    }

    fn augmented_operator(&self) -> Option<BinOp> {
        match self.peek() {
            Token::PlusEq(_) => Some(BinOp::Add),
            Token::MinusEq(_) => Some(BinOp::Sub),
            Token::StarEq(_) => Some(BinOp::Mul),
            Token::DoubleStarEq(_) => Some(BinOp::Pow),
            Token::SlashEq(_) => Some(BinOp::Div),
            Token::DoubleSlashEq(_) => Some(BinOp::FloorDiv),
            Token::PercentEq(_) => Some(BinOp::Mod),
            _ => None,
        }
    }

    fn expect_statement_end(&mut self) -> Result<(), PyError> {
        match self.peek().clone() {
            Token::Newline(_) | Token::Semicolon(_) | Token::Eof(_) => Ok(()),
            Token::Comma(loc) => Err(PyError::syntax(
                "tuples and multiple assignment are not supported in step-by-step lessons",
                loc,
            )),
            Token::Keyword(word, loc) => Err(unsupported_keyword(&word, loc)),
            other => Err(PyError::syntax("invalid syntax", other.location())),
        }
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof, and `advance`
        // never moves past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn expect_token(&mut self, token: &Token, message: &str) -> Result<(), PyError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(PyError::syntax(message, self.current_location()))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, PyError> {
        match self.peek().clone() {
            Token::Ident(name, _) => {
                self.advance();
                Ok(name)
            }
            other => Err(PyError::syntax("invalid syntax", other.location())),
        }
    }
}

pub(crate) fn unsupported_keyword(word: &str, location: SourceLocation) -> PyError {
    let message = match word {
        "if" | "elif" | "else" | "for" | "while" | "def" | "class" | "try" | "except"
        | "finally" | "with" => format!(
            "'{}' blocks are not supported in step-by-step lessons; write one simple statement per line",
            word
        ),
        _ => format!("'{}' is not supported in step-by-step lessons", word),
    };
    PyError::syntax(message, location)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source)
            .and_then(|mut p| p.parse_program())
            .expect("parse failed")
    }

    fn parse_err(source: &str) -> PyError {
        match Parser::new(source).and_then(|mut p| p.parse_program()) {
            Ok(program) => panic!("expected error, got {:?}", program),
            Err(e) => e,
        }
    }

    #[test]
    fn test_simple_assignment() {
        let program = parse("length = 10");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Assign { targets, value, .. } => {
                assert_eq!(targets, &vec!["length".to_string()]);
                assert_eq!(value.kind, ExprKind::Int(10.into()));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_chained_assignment() {
        let program = parse("a = b = 5");
        assert!(matches!(
            &program.statements[0],
            Stmt::Assign { targets, .. } if targets.len() == 2
        ));
    }

    #[test]
    fn test_augmented_assignment() {
        let program = parse("total += 3");
        assert!(matches!(
            &program.statements[0],
            Stmt::AugAssign { op: BinOp::Add, .. }
        ));
    }

    #[test]
    fn test_semicolons_and_blank_lines() {
        let program = parse("a = 1; b = 2\n\n\nprint(a)\n");
        assert_eq!(program.statements.len(), 3);
    }

    #[test]
    fn test_assign_to_call_is_rejected() {
        let err = parse_err("print(x) = 5");
        assert_eq!(
            err.message,
            "cannot assign to function call here. Maybe you meant '==' instead of '='?"
        );
    }

    #[test]
    fn test_blocks_are_rejected() {
        let err = parse_err("if x > 3:\n    print(x)");
        assert!(err.message.starts_with("'if' blocks are not supported"));
    }

    #[test]
    fn test_missing_operand() {
        let err = parse_err("x = 5 +");
        assert_eq!(err.message, "invalid syntax");
    }

    #[test]
    fn test_tuple_assignment_rejected() {
        let err = parse_err("a, b = 1, 2");
        assert!(err.message.contains("not supported"));
    }
}
