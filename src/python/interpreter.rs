//! Tree-walking interpreter for the Python subset
//!
//! The [`Interpreter`] owns a persistent global namespace, an accumulating
//! stdout buffer, and a queue of pending `input()` lines. Globals keep their
//! first-binding order so snapshots list variables the way the learner
//! created them.

use super::ast::*;
use super::errors::{PyError, PyErrorKind};
use super::parser::Parser;
use super::value::Value;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Names resolvable without a global binding
pub const BUILTIN_NAMES: &[&str] = &[
    "print", "input", "int", "float", "str", "bool", "len", "abs", "round", "max", "min",
];

pub struct Interpreter {
    globals: FxHashMap<String, Value>,
    /// First-binding order of `globals`
    order: Vec<String>,
    stdout: String,
    pending_input: VecDeque<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            globals: FxHashMap::default(),
            order: Vec::new(),
            stdout: String::new(),
            pending_input: VecDeque::new(),
        }
    }

    /// Compile without executing
    pub fn check(source: &str) -> Result<Program, PyError> {
        Parser::new(source)?.parse_program()
    }

    /// Compile and run `source` against the persistent namespace.
    ///
    /// Statements before a failing one keep their effects, matching how a
    /// Python module behaves when it raises halfway through.
    pub fn exec(&mut self, source: &str) -> Result<(), PyError> {
        let program = Self::check(source)?;
        for statement in &program.statements {
            self.exec_statement(statement)?;
        }
        Ok(())
    }

    /// Bound globals in first-binding order
    pub fn globals(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.order
            .iter()
            .filter_map(|name| self.globals.get(name).map(|v| (name.as_str(), v)))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        if self.globals.insert(name.to_string(), value).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn clear_stdout(&mut self) {
        self.stdout.clear();
    }

    pub(crate) fn write_stdout(&mut self, text: &str) {
        self.stdout.push_str(text);
    }

    /// Queue a line for the next `input()` call
    pub fn push_input(&mut self, line: impl Into<String>) {
        self.pending_input.push_back(line.into());
    }

    pub(crate) fn next_input(&mut self) -> Option<String> {
        self.pending_input.pop_front()
    }

    /// Drop all bindings, output and queued input
    pub fn reset(&mut self) {
        self.globals.clear();
        self.order.clear();
        self.stdout.clear();
        self.pending_input.clear();
    }

    fn exec_statement(&mut self, statement: &Stmt) -> Result<(), PyError> {
        match statement {
            Stmt::Assign { targets, value, .. } => {
                let value = self.eval(value)?;
                for target in targets {
                    self.set_global(target, value.clone());
                }
            }
            Stmt::AugAssign {
                target,
                op,
                value,
                location,
            } => {
                let current = self
                    .globals
                    .get(target)
                    .cloned()
                    .ok_or_else(|| PyError::undefined_name(target, *location))?;
                let rhs = self.eval(value)?;
                let result = binary_op(*op, &current, &rhs, *location)?;
                self.set_global(target, result);
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
            Stmt::Pass(_) => {}
        }
        Ok(())
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value, PyError> {
        let loc = expr.location;
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(n.clone())),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::NoneLit => Ok(Value::None),
            ExprKind::Name(name) => self.lookup(name, loc),
            ExprKind::FString(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        FStringPart::Literal(text) => out.push_str(text),
                        FStringPart::Field {
                            expr,
                            conversion,
                            spec,
                        } => {
                            let value = self.eval(expr)?;
                            let value = match conversion {
                                Some('r') | Some('a') => Value::Str(value.repr()),
                                Some(_) => Value::Str(value.to_str()),
                                None => value,
                            };
                            out.push_str(&format_spec(&value, spec, loc)?);
                        }
                    }
                }
                Ok(Value::Str(out))
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                binary_op(*op, &l, &r, loc)
            }
            ExprKind::Unary { op, operand } => {
                let v = self.eval(operand)?;
                unary_op(*op, &v, loc)
            }
            ExprKind::Logical { op, left, right } => {
                let l = self.eval(left)?;
                match (op, l.is_truthy()) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(l),
                    _ => self.eval(right),
                }
            }
            ExprKind::Compare { first, rest } => {
                let mut left = self.eval(first)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !compare(*op, &left, &right, loc)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            ExprKind::Call { func, args, kwargs } => {
                let callee = match self.globals.get(func) {
                    Some(Value::Builtin(name)) => *name,
                    Some(other) => {
                        return Err(PyError::type_error(
                            format!("'{}' object is not callable", other.type_name()),
                            loc,
                        ));
                    }
                    None => builtin_name(func).ok_or_else(|| PyError::undefined_name(func, loc))?,
                };
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval(arg)?);
                }
                let mut kwarg_values = Vec::with_capacity(kwargs.len());
                for (name, arg) in kwargs {
                    kwarg_values.push((name.clone(), self.eval(arg)?));
                }
                self.call_builtin(callee, arg_values, kwarg_values, loc)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval(arg)?);
                }
                super::builtins::call_method(&receiver, method, arg_values, loc)
            }
            ExprKind::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                index_value(&target, &index, loc)
            }
        }
    }

    fn lookup(&self, name: &str, loc: SourceLocation) -> Result<Value, PyError> {
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        builtin_name(name)
            .map(Value::Builtin)
            .ok_or_else(|| PyError::undefined_name(name, loc))
    }
}

fn builtin_name(name: &str) -> Option<&'static str> {
    BUILTIN_NAMES.iter().copied().find(|b| *b == name)
}

fn unsupported(op: BinOp, l: &Value, r: &Value, loc: SourceLocation) -> PyError {
    PyError::type_error(
        format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            l.type_name(),
            r.type_name()
        ),
        loc,
    )
}

/// Largest int result `**` will build, in bits
const MAX_POW_BITS: u64 = 1 << 20;

/// Python floor division / modulo on ints (result takes the divisor's sign)
pub(crate) fn int_floor_div_mod(
    a: &BigInt,
    b: &BigInt,
    loc: SourceLocation,
) -> Result<(BigInt, BigInt), PyError> {
    if b.is_zero() {
        return Err(PyError::zero_division(
            "integer division or modulo by zero",
            loc,
        ));
    }
    let q = a / b;
    let r = a - &q * b;
    if !r.is_zero() && (r.is_negative() != b.is_negative()) {
        Ok((q - 1, r + b))
    } else {
        Ok((q, r))
    }
}

fn int_true_div(a: &BigInt, b: &BigInt, loc: SourceLocation) -> Result<f64, PyError> {
    if b.is_zero() {
        return Err(PyError::zero_division("division by zero", loc));
    }
    match (a.to_f64(), b.to_f64()) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Ok(x / y),
        _ => Err(PyError::new(
            PyErrorKind::OverflowError,
            "integer division result too large for a float",
            loc,
        )),
    }
}

fn int_pow(a: &BigInt, b: &BigInt, loc: SourceLocation) -> Result<Value, PyError> {
    if b.is_negative() {
        if a.is_zero() {
            return Err(PyError::zero_division(
                "0.0 cannot be raised to a negative power",
                loc,
            ));
        }
        let base = a.to_f64().unwrap_or(f64::INFINITY);
        let exponent = b.to_f64().unwrap_or(f64::NEG_INFINITY);
        return Ok(Value::Float(base.powf(exponent)));
    }
    // 0, 1 and -1 stay small whatever the exponent
    if a.abs() <= BigInt::from(1) {
        let odd = !(b % 2u32).is_zero();
        return Ok(match a.to_i64() {
            Some(-1) if odd => Value::int(-1),
            Some(-1) => Value::int(1),
            _ if b.is_zero() => Value::int(1),
            _ => Value::Int(a.clone()),
        });
    }
    let exponent = b
        .to_u32()
        .filter(|e| a.bits().saturating_mul(u64::from(*e)) <= MAX_POW_BITS)
        .ok_or_else(|| PyError::overflow(loc))?;
    Ok(Value::Int(a.pow(exponent)))
}

pub(crate) fn binary_op(op: BinOp, l: &Value, r: &Value, loc: SourceLocation) -> Result<Value, PyError> {
    // str operations
    match (op, l, r) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{}{}", a, b))),
        (BinOp::Add, Value::Str(_), other) => {
            return Err(PyError::type_error(
                format!(
                    "can only concatenate str (not \"{}\") to str",
                    other.type_name()
                ),
                loc,
            ));
        }
        (BinOp::Mul, Value::Str(s), n) | (BinOp::Mul, n, Value::Str(s)) => {
            let Some(count) = n.as_int() else {
                return Err(PyError::type_error(
                    format!(
                        "can't multiply sequence by non-int of type '{}'",
                        n.type_name()
                    ),
                    loc,
                ));
            };
            let count = if count.is_negative() {
                0
            } else {
                count.to_usize().unwrap_or(usize::MAX)
            };
            if s.len().saturating_mul(count) > 10_000_000 {
                return Err(PyError::new(
                    PyErrorKind::OverflowError,
                    "repeated string is too long",
                    loc,
                ));
            }
            return Ok(Value::Str(s.repeat(count)));
        }
        _ => {}
    }

    if !l.is_number() || !r.is_number() {
        return Err(unsupported(op, l, r, loc));
    }

    // int (and bool) arithmetic
    if let (Some(a), Some(b)) = (l.as_int(), r.as_int()) {
        return match op {
            BinOp::Add => Ok(Value::Int(a + b)),
            BinOp::Sub => Ok(Value::Int(a - b)),
            BinOp::Mul => Ok(Value::Int(a * b)),
            BinOp::Div => int_true_div(&a, &b, loc).map(Value::Float),
            BinOp::FloorDiv => int_floor_div_mod(&a, &b, loc).map(|(q, _)| Value::Int(q)),
            BinOp::Mod => int_floor_div_mod(&a, &b, loc).map(|(_, r)| Value::Int(r)),
            BinOp::Pow => int_pow(&a, &b, loc),
        };
    }

    let (a, b) = match (l.as_float(), r.as_float()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(unsupported(op, l, r, loc)),
    };
    let int_out_of_range = |v: &Value, f: f64| matches!(v, Value::Int(_)) && f.is_infinite();
    if int_out_of_range(l, a) || int_out_of_range(r, b) {
        return Err(PyError::new(
            PyErrorKind::OverflowError,
            "int too large to convert to float",
            loc,
        ));
    }
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(PyError::zero_division("float division by zero", loc));
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(PyError::zero_division("float floor division by zero", loc));
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(PyError::zero_division("float modulo", loc));
            }
            let m = a % b;
            if m != 0.0 && ((m < 0.0) != (b < 0.0)) {
                m + b
            } else {
                m
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(PyError::zero_division(
                    "0.0 cannot be raised to a negative power",
                    loc,
                ));
            }
            let p = a.powf(b);
            if p.is_nan() && a < 0.0 {
                return Err(PyError::value_error(
                    "complex results are not supported in step-by-step lessons",
                    loc,
                ));
            }
            p
        }
    };
    if result.is_infinite() && a.is_finite() && b.is_finite() {
        return Err(PyError::new(
            PyErrorKind::OverflowError,
            "(34, 'Numerical result out of range')",
            loc,
        ));
    }
    Ok(Value::Float(result))
}

fn unary_op(op: UnaryOp, v: &Value, loc: SourceLocation) -> Result<Value, PyError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
        UnaryOp::Neg | UnaryOp::Pos => {
            let symbol = if op == UnaryOp::Neg { "-" } else { "+" };
            match v {
                Value::Float(f) => Ok(Value::Float(if op == UnaryOp::Neg { -f } else { *f })),
                other => match other.as_int() {
                    Some(n) if op == UnaryOp::Neg => Ok(Value::Int(-n)),
                    Some(n) => Ok(Value::Int(n)),
                    None => Err(PyError::type_error(
                        format!("bad operand type for unary {}: '{}'", symbol, other.type_name()),
                        loc,
                    )),
                },
            }
        }
    }
}

/// Ordering of two numbers, exact for ints; `None` when either is NaN or
/// not a number
pub(crate) fn numeric_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    if !a.is_number() || !b.is_number() {
        return None;
    }
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a
            .as_float()
            .zip(b.as_float())
            .and_then(|(x, y)| x.partial_cmp(&y)),
    }
}

fn compare(op: CmpOp, l: &Value, r: &Value, loc: SourceLocation) -> Result<bool, PyError> {
    let ordering = match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (a, b) => numeric_cmp(a, b),
    };

    match op {
        CmpOp::Eq => Ok(values_equal(l, r, ordering)),
        CmpOp::NotEq => Ok(!values_equal(l, r, ordering)),
        _ => {
            let both_numbers = l.is_number() && r.is_number();
            let both_strings = matches!((l, r), (Value::Str(_), Value::Str(_)));
            if !both_numbers && !both_strings {
                return Err(PyError::type_error(
                    format!(
                        "'{}' not supported between instances of '{}' and '{}'",
                        op.symbol(),
                        l.type_name(),
                        r.type_name()
                    ),
                    loc,
                ));
            }
            // NaN compares false for every ordering
            Ok(match (op, ordering) {
                (_, None) => false,
                (CmpOp::Lt, Some(o)) => o == Ordering::Less,
                (CmpOp::Le, Some(o)) => o != Ordering::Greater,
                (CmpOp::Gt, Some(o)) => o == Ordering::Greater,
                (CmpOp::Ge, Some(o)) => o != Ordering::Less,
                _ => false,
            })
        }
    }
}

fn values_equal(l: &Value, r: &Value, ordering: Option<Ordering>) -> bool {
    if l.is_number() && r.is_number() || matches!((l, r), (Value::Str(_), Value::Str(_))) {
        return ordering == Some(Ordering::Equal);
    }
    l == r
}

fn index_value(target: &Value, index: &Value, loc: SourceLocation) -> Result<Value, PyError> {
    let Value::Str(s) = target else {
        return Err(PyError::type_error(
            format!("'{}' object is not subscriptable", target.type_name()),
            loc,
        ));
    };
    if !matches!(index, Value::Int(_) | Value::Bool(_)) {
        return Err(PyError::type_error(
            format!("string indices must be integers, not '{}'", index.type_name()),
            loc,
        ));
    }
    let len = s.chars().count() as i64;
    let position = index
        .as_small_int()
        .map(|i| if i < 0 { i + len } else { i })
        .unwrap_or(-1);
    if position < 0 || position >= len {
        return Err(PyError::new(
            PyErrorKind::IndexError,
            "string index out of range",
            loc,
        ));
    }
    Ok(s.chars()
        .nth(position as usize)
        .map(|c| Value::Str(c.to_string()))
        .unwrap_or(Value::Str(String::new())))
}

/// Apply an f-string format spec: `[width][,][.precision][type]` with optional
/// `<`, `>` or `^` alignment.
fn format_spec(value: &Value, spec: &str, loc: SourceLocation) -> Result<String, PyError> {
    if spec.is_empty() {
        return Ok(value.to_str());
    }
    let invalid = || {
        PyError::value_error(
            format!(
                "Invalid format specifier '{}' for object of type '{}'",
                spec,
                value.type_name()
            ),
            loc,
        )
    };

    let mut rest = spec;
    let align = match rest.chars().next() {
        Some(c @ ('<' | '>' | '^')) => {
            rest = &rest[1..];
            Some(c)
        }
        _ => None,
    };
    let width_digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    rest = &rest[width_digits.len()..];
    let width: usize = if width_digits.is_empty() {
        0
    } else {
        width_digits.parse().map_err(|_| invalid())?
    };
    let grouping = rest.starts_with(',');
    if grouping {
        rest = &rest[1..];
    }
    let mut precision = None;
    if let Some(after_dot) = rest.strip_prefix('.') {
        let digits: String = after_dot.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(invalid());
        }
        precision = Some(digits.parse::<usize>().map_err(|_| invalid())?);
        rest = &after_dot[digits.len()..];
    }
    let kind = match rest {
        "" => None,
        "f" | "d" | "s" | "%" => rest.chars().next(),
        _ => return Err(invalid()),
    };

    let fixed = |precision: usize| -> Result<String, PyError> {
        let f = value.as_float().ok_or_else(invalid)?;
        Ok(format!("{:.*}", precision, f))
    };
    let body = match kind {
        Some('f') => fixed(precision.unwrap_or(6))?,
        Some('%') => {
            let f = value.as_float().ok_or_else(invalid)?;
            format!("{:.*}%", precision.unwrap_or(6), f * 100.0)
        }
        Some('d') => match value {
            Value::Int(n) => n.to_string(),
            _ => return Err(invalid()),
        },
        Some('s') | None => match (value, precision) {
            (Value::Str(s), Some(p)) => s.chars().take(p).collect(),
            (_, Some(_)) => return Err(invalid()),
            (Value::Str(s), None) => s.clone(),
            (_, None) if kind == Some('s') => return Err(invalid()),
            (v, None) => v.to_str(),
        },
        Some(_) => return Err(invalid()),
    };
    let body = if grouping { group_thousands(&body) } else { body };

    let numeric = value.is_number();
    let padding = width.saturating_sub(body.chars().count());
    let padded = match align.unwrap_or(if numeric { '>' } else { '<' }) {
        '>' => format!("{}{}", " ".repeat(padding), body),
        '^' => format!(
            "{}{}{}",
            " ".repeat(padding / 2),
            body,
            " ".repeat(padding - padding / 2)
        ),
        _ => format!("{}{}", body, " ".repeat(padding)),
    };
    Ok(padded)
}

fn group_thousands(number: &str) -> String {
    let (sign, rest) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac) = match rest.find('.') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}{}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Interpreter {
        let mut interp = Interpreter::new();
        interp.exec(source).expect("execution failed");
        interp
    }

    fn run_err(source: &str) -> PyError {
        let mut interp = Interpreter::new();
        interp.exec(source).unwrap_err()
    }

    #[test]
    fn test_area_lesson() {
        let interp = run("length = 10\nbreadth = 20\narea = length * breadth\nprint(area)");
        assert_eq!(interp.stdout(), "200\n");
        assert_eq!(interp.get("area"), Some(&Value::int(200)));
    }

    #[test]
    fn test_globals_keep_binding_order() {
        let interp = run("b = 1\na = 2\nb = 3");
        let names: Vec<&str> = interp.globals().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_floor_division_and_modulo_signs() {
        let interp = run("a = -7 // 2\nb = -7 % 2\nc = 7 % -2\nd = 7 / 2");
        assert_eq!(interp.get("a"), Some(&Value::int(-4)));
        assert_eq!(interp.get("b"), Some(&Value::int(1)));
        assert_eq!(interp.get("c"), Some(&Value::int(-1)));
        assert_eq!(interp.get("d"), Some(&Value::Float(3.5)));
    }

    #[test]
    fn test_integers_grow_past_machine_words() {
        let interp = run(
            "big = 10 ** 20\nwide = 2 ** 64 - 1\nq = -big // 3\nr = -big % 3\nneg = (-1) ** 101",
        );
        assert_eq!(interp.get("big").map(Value::to_str).as_deref(), Some("100000000000000000000"));
        assert_eq!(interp.get("wide").map(Value::to_str).as_deref(), Some("18446744073709551615"));
        assert_eq!(interp.get("q").map(Value::to_str).as_deref(), Some("-33333333333333333334"));
        assert_eq!(interp.get("r"), Some(&Value::int(2)));
        assert_eq!(interp.get("neg"), Some(&Value::int(-1)));
    }

    #[test]
    fn test_big_int_mixed_with_float() {
        let interp = run("half = 10 ** 20 / 4\nbigger = 10 ** 20 > 1.5");
        assert_eq!(interp.get("half"), Some(&Value::Float(2.5e19)));
        assert_eq!(interp.get("bigger"), Some(&Value::Bool(true)));

        let err = run_err("x = 10 ** 400 * 1.0");
        assert_eq!(err.kind, PyErrorKind::OverflowError);
        assert_eq!(err.message, "int too large to convert to float");
    }

    #[test]
    fn test_string_plus_int_error() {
        let err = run_err("x = '3' + 4");
        assert_eq!(err.kind, PyErrorKind::TypeError);
        assert_eq!(err.message, "can only concatenate str (not \"int\") to str");
    }

    #[test]
    fn test_int_plus_string_error() {
        let err = run_err("x = 4 + '3'");
        assert_eq!(
            err.message,
            "unsupported operand type(s) for +: 'int' and 'str'"
        );
    }

    #[test]
    fn test_undefined_name() {
        let err = run_err("print(totl)");
        assert_eq!(err.to_string(), "NameError: name 'totl' is not defined");
    }

    #[test]
    fn test_division_by_zero() {
        let err = run_err("x = 1 / 0");
        assert_eq!(err.kind, PyErrorKind::ZeroDivisionError);
        assert_eq!(err.message, "division by zero");
    }

    #[test]
    fn test_chained_comparison_and_logic() {
        let interp = run("ok = 1 < 2 <= 2\nx = 0 or 'fallback'\ny = 5 and 0");
        assert_eq!(interp.get("ok"), Some(&Value::Bool(true)));
        assert_eq!(interp.get("x"), Some(&Value::Str("fallback".into())));
        assert_eq!(interp.get("y"), Some(&Value::int(0)));
    }

    #[test]
    fn test_fstring_formatting() {
        let interp = run("price = 3.14159\nname = 'Ada'\nmsg = f'{name!r} pays {price:.2f} ({1000000:,})'");
        assert_eq!(
            interp.get("msg"),
            Some(&Value::Str("'Ada' pays 3.14 (1,000,000)".into()))
        );
    }

    #[test]
    fn test_augmented_assignment_requires_binding() {
        let err = run_err("count += 1");
        assert_eq!(err.kind, PyErrorKind::NameError);
    }

    #[test]
    fn test_string_indexing() {
        let interp = run("word = 'python'\nfirst = word[0]\nlast = word[-1]");
        assert_eq!(interp.get("first"), Some(&Value::Str("p".into())));
        assert_eq!(interp.get("last"), Some(&Value::Str("n".into())));
        assert_eq!(run_err("c = 'ab'[5]").kind, PyErrorKind::IndexError);
    }

    #[test]
    fn test_rebinding_builtin_name() {
        let interp = run("show = print\nshow('hi')");
        assert_eq!(interp.stdout(), "hi\n");
        assert_eq!(interp.get("show"), Some(&Value::Builtin("print")));
    }

    #[test]
    fn test_calling_non_callable() {
        let err = run_err("x = 5\nx(1)");
        assert_eq!(err.message, "'int' object is not callable");
    }
}
