//! Expression parsing with precedence climbing
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparisons, `+ -`,
//! `* / // %`, unary `+ -`, `**`, then calls / method calls / indexing.

use super::ast::*;
use super::errors::PyError;
use super::lexer::Token;
use super::parser::{unsupported_keyword, Parser};

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, PyError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, PyError> {
        let mut left = self.parse_and()?;
        while let Token::Or(loc) = *self.peek() {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::new(
                ExprKind::Logical {
                    op: BoolOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                loc,
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, PyError> {
        let mut left = self.parse_not()?;
        while let Token::And(loc) = *self.peek() {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::new(
                ExprKind::Logical {
                    op: BoolOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                loc,
            );
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, PyError> {
        if let Token::Not(loc) = *self.peek() {
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                loc,
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, PyError> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.peek() {
                Token::EqEq(_) => CmpOp::Eq,
                Token::NotEq(_) => CmpOp::NotEq,
                Token::Lt(_) => CmpOp::Lt,
                Token::Le(_) => CmpOp::Le,
                Token::Gt(_) => CmpOp::Gt,
                Token::Ge(_) => CmpOp::Ge,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_additive()?));
        }

        if rest.is_empty() {
            return Ok(first);
        }
        let location = first.location;
        Ok(Expr::new(
            ExprKind::Compare {
                first: Box::new(first),
                rest,
            },
            location,
        ))
    }

    fn parse_additive(&mut self) -> Result<Expr, PyError> {
        let mut left = self.parse_term()?;
        loop {
            let (op, loc) = match *self.peek() {
                Token::Plus(loc) => (BinOp::Add, loc),
                Token::Minus(loc) => (BinOp::Sub, loc),
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right, loc);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, PyError> {
        let mut left = self.parse_unary()?;
        loop {
            let (op, loc) = match *self.peek() {
                Token::Star(loc) => (BinOp::Mul, loc),
                Token::Slash(loc) => (BinOp::Div, loc),
                Token::DoubleSlash(loc) => (BinOp::FloorDiv, loc),
                Token::Percent(loc) => (BinOp::Mod, loc),
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right, loc);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, PyError> {
        let (op, loc) = match *self.peek() {
            Token::Minus(loc) => (UnaryOp::Neg, loc),
            Token::Plus(loc) => (UnaryOp::Pos, loc),
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            loc,
        ))
    }

    /// `**` is right-associative and binds tighter than a unary minus on its
    /// left, so `-2 ** 2 == -4` and `2 ** -1 == 0.5`.
    fn parse_power(&mut self) -> Result<Expr, PyError> {
        let base = self.parse_postfix()?;
        if let Token::DoubleStar(loc) = *self.peek() {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(binary(BinOp::Pow, base, exponent, loc));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, PyError> {
        let mut expr = self.parse_atom()?;

        loop {
            match self.peek().clone() {
                Token::Dot(loc) => {
                    self.advance();
                    let method = self.expect_identifier()?;
                    if !self.check(&Token::LParen(loc)) {
                        return Err(PyError::syntax(
                            format!(
                                "attribute access ('.{}') is not supported in step-by-step lessons",
                                method
                            ),
                            loc,
                        ));
                    }
                    self.advance();
                    let (args, kwargs) = self.parse_call_arguments()?;
                    if let Some((name, _)) = kwargs.first() {
                        return Err(PyError::syntax(
                            format!("keyword argument '{}' is not supported for methods", name),
                            loc,
                        ));
                    }
                    expr = Expr::new(
                        ExprKind::MethodCall {
                            receiver: Box::new(expr),
                            method,
                            args,
                        },
                        loc,
                    );
                }
                Token::LBracket(loc) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    if let Token::Colon(colon) = *self.peek() {
                        return Err(PyError::syntax(
                            "slicing is not supported in step-by-step lessons",
                            colon,
                        ));
                    }
                    self.expect_token(&Token::RBracket(loc), "invalid syntax")?;
                    expr = Expr::new(
                        ExprKind::Index {
                            target: Box::new(expr),
                            index: Box::new(index),
                        },
                        loc,
                    );
                }
                Token::LParen(loc) => {
                    let ExprKind::Name(func) = &expr.kind else {
                        return Err(PyError::syntax(
                            format!("'{}' is not callable", expr.describe()),
                            loc,
                        ));
                    };
                    let func = func.clone();
                    self.advance();
                    let (args, kwargs) = self.parse_call_arguments()?;
                    expr = Expr::new(ExprKind::Call { func, args, kwargs }, expr.location);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse arguments after an opening parenthesis, through the closing one.
    fn parse_call_arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), PyError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        loop {
            if let Token::RParen(_) = self.peek() {
                self.advance();
                break;
            }

            if let Token::Star(loc) | Token::DoubleStar(loc) = *self.peek() {
                return Err(PyError::syntax(
                    "argument unpacking is not supported in step-by-step lessons",
                    loc,
                ));
            }

            let is_keyword = matches!(self.peek(), Token::Ident(..))
                && matches!(self.peek_ahead(1), Some(Token::Eq(_)));
            if is_keyword {
                let location = self.current_location();
                let name = self.expect_identifier()?;
                self.advance();
                if kwargs.iter().any(|(k, _)| *k == name) {
                    return Err(PyError::syntax(
                        format!("keyword argument repeated: {}", name),
                        location,
                    ));
                }
                kwargs.push((name, self.parse_expression()?));
            } else {
                let arg = self.parse_expression()?;
                if !kwargs.is_empty() {
                    return Err(PyError::syntax(
                        "positional argument follows keyword argument",
                        arg.location,
                    ));
                }
                args.push(arg);
            }

            match self.peek() {
                Token::Comma(_) => {
                    self.advance();
                }
                Token::RParen(_) => {}
                other => {
                    return Err(PyError::syntax(
                        "invalid syntax. Perhaps you forgot a comma?",
                        other.location(),
                    ));
                }
            }
        }

        Ok((args, kwargs))
    }

    fn parse_atom(&mut self) -> Result<Expr, PyError> {
        let token = self.peek().clone();
        let location = token.location();

        let kind = match token {
            Token::Int(n, _) => ExprKind::Int(n),
            Token::Float(f, _) => ExprKind::Float(f),
            Token::True(_) => ExprKind::Bool(true),
            Token::False(_) => ExprKind::Bool(false),
            Token::NoneKw(_) => ExprKind::NoneLit,
            Token::Ident(name, _) => ExprKind::Name(name),
            Token::Str(..) | Token::FStr(..) => return self.parse_string_sequence(),
            Token::LParen(_) => {
                self.advance();
                if let Token::RParen(loc) = *self.peek() {
                    return Err(PyError::syntax(
                        "tuples are not supported in step-by-step lessons",
                        loc,
                    ));
                }
                let inner = self.parse_expression()?;
                if let Token::Comma(loc) = *self.peek() {
                    return Err(PyError::syntax(
                        "tuples are not supported in step-by-step lessons",
                        loc,
                    ));
                }
                self.expect_token(&Token::RParen(location), "invalid syntax")?;
                return Ok(inner);
            }
            Token::LBracket(_) => {
                return Err(PyError::syntax(
                    "lists are not supported in step-by-step lessons",
                    location,
                ));
            }
            Token::Keyword(word, _) => return Err(unsupported_keyword(&word, location)),
            _ => return Err(PyError::syntax("invalid syntax", location)),
        };

        self.advance();
        Ok(Expr::new(kind, location))
    }

    /// Adjacent string literals concatenate; any f-string among them turns
    /// the whole run into an f-string.
    fn parse_string_sequence(&mut self) -> Result<Expr, PyError> {
        let location = self.current_location();
        let mut parts: Vec<FStringPart> = Vec::new();
        let mut formatted = false;

        loop {
            match self.peek().clone() {
                Token::Str(text, _) => {
                    self.advance();
                    push_literal(&mut parts, &text);
                }
                Token::FStr(text, loc) => {
                    self.advance();
                    formatted = true;
                    for part in parse_fstring(&text, loc)? {
                        match part {
                            FStringPart::Literal(text) => push_literal(&mut parts, &text),
                            field => parts.push(field),
                        }
                    }
                }
                _ => break,
            }
        }

        if formatted {
            return Ok(Expr::new(ExprKind::FString(parts), location));
        }
        let text = match parts.pop() {
            Some(FStringPart::Literal(text)) => text,
            _ => String::new(),
        };
        Ok(Expr::new(ExprKind::Str(text), location))
    }
}

fn binary(op: BinOp, left: Expr, right: Expr, location: SourceLocation) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        location,
    )
}

fn push_literal(parts: &mut Vec<FStringPart>, text: &str) {
    if let Some(FStringPart::Literal(last)) = parts.last_mut() {
        last.push_str(text);
    } else {
        parts.push(FStringPart::Literal(text.to_string()));
    }
}

/// Split an f-string body into literal text and replacement fields.
fn parse_fstring(body: &str, location: SourceLocation) -> Result<Vec<FStringPart>, PyError> {
    let chars: Vec<char> = body.chars().collect();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '}' {
            if chars.get(i + 1) == Some(&'}') {
                literal.push('}');
                i += 2;
                continue;
            }
            return Err(PyError::syntax(
                "f-string: single '}' is not allowed",
                location,
            ));
        }
        if c != '{' {
            literal.push(c);
            i += 1;
            continue;
        }
        if chars.get(i + 1) == Some(&'{') {
            literal.push('{');
            i += 2;
            continue;
        }

        // Find the matching close brace, skipping nested brackets and quotes
        let start = i + 1;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut end = None;
        let mut j = start;
        while j < chars.len() {
            let ch = chars[j];
            match quote {
                Some(q) if ch == q => quote = None,
                Some(_) => {}
                None => match ch {
                    '\'' | '"' => quote = Some(ch),
                    '(' | '[' | '{' => depth += 1,
                    ')' | ']' => depth = depth.saturating_sub(1),
                    '}' if depth == 0 => {
                        end = Some(j);
                        break;
                    }
                    '}' => depth -= 1,
                    _ => {}
                },
            }
            j += 1;
        }
        let end = end.ok_or_else(|| PyError::syntax("f-string: expecting '}'", location))?;

        if !literal.is_empty() {
            parts.push(FStringPart::Literal(std::mem::take(&mut literal)));
        }
        parts.push(parse_field(&chars[start..end], location)?);
        i = end + 1;
    }

    if !literal.is_empty() {
        parts.push(FStringPart::Literal(literal));
    }
    Ok(parts)
}

fn parse_field(field: &[char], location: SourceLocation) -> Result<FStringPart, PyError> {
    // Locate top-level `!conv` and `:spec` separators
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut expr_end = field.len();
    let mut conversion = None;
    let mut spec = String::new();

    let mut i = 0;
    while i < field.len() {
        let ch = field[i];
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                '!' if depth == 0 && field.get(i + 1) != Some(&'=') => {
                    expr_end = expr_end.min(i);
                    conversion = field.get(i + 1).copied();
                    if !matches!(conversion, Some('r' | 's' | 'a')) {
                        return Err(PyError::syntax(
                            "f-string: invalid conversion character: expected 's', 'r', or 'a'",
                            location,
                        ));
                    }
                    i += 2;
                    if i < field.len() && field[i] != ':' {
                        return Err(PyError::syntax("f-string: expecting '}'", location));
                    }
                    continue;
                }
                ':' if depth == 0 => {
                    expr_end = expr_end.min(i);
                    spec = field[i + 1..].iter().collect();
                    break;
                }
                _ => {}
            },
        }
        i += 1;
    }

    let source: String = field[..expr_end].iter().collect();
    if source.trim().is_empty() {
        return Err(PyError::syntax(
            "f-string: empty expression not allowed",
            location,
        ));
    }

    let relocate = |mut e: PyError| {
        e.location = location;
        e.message = format!("f-string: {}", e.message);
        e
    };
    let mut parser = Parser::new(source.trim()).map_err(relocate)?;
    let expr = parser.parse_expression().map_err(relocate)?;
    if !matches!(parser.peek(), Token::Newline(_) | Token::Eof(_)) {
        return Err(PyError::syntax("f-string: invalid syntax", location));
    }

    Ok(FStringPart::Field {
        expr: relocate_expr(expr, location),
        conversion,
        spec,
    })
}

/// Field expressions are parsed standalone; pin their locations to the
/// enclosing literal so runtime errors point at the right line.
fn relocate_expr(mut expr: Expr, location: SourceLocation) -> Expr {
    expr.location = location;
    match &mut expr.kind {
        ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
            **left = relocate_expr((**left).clone(), location);
            **right = relocate_expr((**right).clone(), location);
        }
        ExprKind::Unary { operand, .. } => {
            **operand = relocate_expr((**operand).clone(), location);
        }
        ExprKind::Compare { first, rest } => {
            **first = relocate_expr((**first).clone(), location);
            for (_, e) in rest.iter_mut() {
                *e = relocate_expr(e.clone(), location);
            }
        }
        ExprKind::Call { args, kwargs, .. } => {
            for a in args.iter_mut() {
                *a = relocate_expr(a.clone(), location);
            }
            for (_, a) in kwargs.iter_mut() {
                *a = relocate_expr(a.clone(), location);
            }
        }
        ExprKind::MethodCall { receiver, args, .. } => {
            **receiver = relocate_expr((**receiver).clone(), location);
            for a in args.iter_mut() {
                *a = relocate_expr(a.clone(), location);
            }
        }
        ExprKind::Index { target, index } => {
            **target = relocate_expr((**target).clone(), location);
            **index = relocate_expr((**index).clone(), location);
        }
        _ => {}
    }
    expr
}
