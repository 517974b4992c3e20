//! Runtime value representation
//!
//! This module defines the [`Value`] enum, the tagged runtime values of the
//! Python subset, together with Python's two display forms:
//!
//! - [`Value::to_str`]: what `str()` / `print()` produce (`Keep Smiling`, `200.0`)
//! - [`Value::repr`]: what `repr()` / `!r` produce (`'Keep Smiling'`)
//!
//! Integers are arbitrary precision, like CPython's.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

/// Runtime values in the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(BigInt),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    /// A builtin function bound to a name, e.g. after `show = print`
    Builtin(&'static str),
}

impl Value {
    pub fn int(n: impl Into<BigInt>) -> Self {
        Value::Int(n.into())
    }

    /// Python type name, as used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
            Value::None => "NoneType",
            Value::Builtin(_) => "builtin_function_or_method",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => !n.is_zero(),
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::None => false,
            Value::Builtin(_) => true,
        }
    }

    /// Numeric view for int/bool operands; `None` for everything else
    pub fn as_int(&self) -> Option<BigInt> {
        match self {
            Value::Int(n) => Some(n.clone()),
            Value::Bool(b) => Some(BigInt::from(*b as u8)),
            _ => None,
        }
    }

    /// Int/bool operand that fits a machine word (counts, indices, digits)
    pub fn as_small_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => n.to_i64(),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Numeric view for any number, widening ints to float. Ints beyond the
    /// float range come back infinite.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(n.to_f64().unwrap_or(f64::INFINITY)),
            Value::Bool(b) => Some(*b as u8 as f64),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Bool(_))
    }

    /// `str(value)`
    pub fn to_str(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => s.clone(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::None => "None".to_string(),
            Value::Builtin(name) => format!("<built-in function {}>", name),
        }
    }

    /// `repr(value)`
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => repr_str(s),
            other => other.to_str(),
        }
    }
}

/// Format a float the way CPython's `repr` does: shortest round-trip digits,
/// always with a decimal point or exponent, exponent form outside
/// `1e-4 <= |f| < 1e16`.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // Rust renders `1e16` / `1.5e-5`; CPython wants `1e+16` / `1.5e-05`
        let rendered = format!("{:e}", f);
        let (mantissa, exponent) = rendered.split_once('e').unwrap_or((&rendered, "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{}e{}{:0>2}", mantissa, sign, digits);
    }

    let rendered = f.to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}

/// Quote a string like CPython: prefer single quotes unless the text contains
/// a single quote and no double quote.
pub fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_display() {
        assert_eq!(format_float(200.0), "200.0");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-5), "1.5e-05");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn test_repr_quotes() {
        assert_eq!(repr_str("abc"), "'abc'");
        assert_eq!(repr_str("it's"), "\"it's\"");
        assert_eq!(repr_str("a\nb"), "'a\\nb'");
    }

    #[test]
    fn test_bool_display_and_truthiness() {
        assert_eq!(Value::Bool(true).to_str(), "True");
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::int(-1).is_truthy());
        assert!(!Value::int(0).is_truthy());
        assert_eq!(Value::None.to_str(), "None");
    }

    #[test]
    fn test_big_int_views() {
        let big = Value::Int(BigInt::from(10).pow(20));
        assert_eq!(big.to_str(), "100000000000000000000");
        assert_eq!(big.as_small_int(), None);
        assert_eq!(big.as_float(), Some(1e20));
        assert_eq!(Value::Bool(true).as_small_int(), Some(1));
    }
}
