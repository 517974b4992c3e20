//! Built-in functions and `str` methods
//!
//! `print` and `input` talk to the interpreter's stdout buffer and input
//! queue; everything else is a pure function of its arguments.

use super::ast::SourceLocation;
use super::errors::{PyError, PyErrorKind};
use super::interpreter::{int_floor_div_mod, numeric_cmp, Interpreter};
use super::value::{format_float, Value};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;

impl Interpreter {
    pub(crate) fn call_builtin(
        &mut self,
        name: &'static str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        loc: SourceLocation,
    ) -> Result<Value, PyError> {
        if name != "print" {
            if let Some((key, _)) = kwargs.first() {
                return Err(PyError::type_error(
                    format!("'{}' is an invalid keyword argument for {}()", key, name),
                    loc,
                ));
            }
        }

        match name {
            "print" => self.builtin_print(args, kwargs, loc),
            "input" => {
                expect_arity(name, &args, 0, 1, loc)?;
                if let Some(prompt) = args.first() {
                    self.write_stdout(&prompt.to_str());
                }
                let line = self.next_input().ok_or_else(|| {
                    PyError::new(PyErrorKind::EOFError, "EOF when reading a line", loc)
                })?;
                Ok(Value::Str(line))
            }
            "int" => {
                expect_arity(name, &args, 0, 1, loc)?;
                match args.first() {
                    None => Ok(Value::int(0)),
                    Some(v) => to_int(v, loc),
                }
            }
            "float" => {
                expect_arity(name, &args, 0, 1, loc)?;
                match args.first() {
                    None => Ok(Value::Float(0.0)),
                    Some(v) => to_float(v, loc),
                }
            }
            "str" => {
                expect_arity(name, &args, 0, 1, loc)?;
                Ok(Value::Str(args.first().map(Value::to_str).unwrap_or_default()))
            }
            "bool" => {
                expect_arity(name, &args, 0, 1, loc)?;
                Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
            }
            "len" => {
                expect_exactly_one(name, &args, loc)?;
                match &args[0] {
                    Value::Str(s) => Ok(Value::int(s.chars().count())),
                    other => Err(PyError::type_error(
                        format!("object of type '{}' has no len()", other.type_name()),
                        loc,
                    )),
                }
            }
            "abs" => {
                expect_exactly_one(name, &args, loc)?;
                match &args[0] {
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => match other.as_int() {
                        Some(n) => Ok(Value::Int(n.abs())),
                        None => Err(PyError::type_error(
                            format!("bad operand type for abs(): '{}'", other.type_name()),
                            loc,
                        )),
                    },
                }
            }
            "round" => {
                expect_arity(name, &args, 1, 2, loc)?;
                round(&args[0], args.get(1), loc)
            }
            "max" | "min" => extremum(name, args, loc),
            _ => Err(PyError::undefined_name(name, loc)),
        }
    }

    fn builtin_print(
        &mut self,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        loc: SourceLocation,
    ) -> Result<Value, PyError> {
        let mut sep = " ".to_string();
        let mut end = "\n".to_string();

        for (key, value) in kwargs {
            let slot = match key.as_str() {
                "sep" => &mut sep,
                "end" => &mut end,
                _ => {
                    return Err(PyError::type_error(
                        format!("'{}' is an invalid keyword argument for print()", key),
                        loc,
                    ));
                }
            };
            match value {
                Value::Str(s) => *slot = s,
                Value::None => {}
                other => {
                    return Err(PyError::type_error(
                        format!("{} must be None or a string, not {}", key, other.type_name()),
                        loc,
                    ));
                }
            }
        }

        let text = args
            .iter()
            .map(Value::to_str)
            .collect::<Vec<_>>()
            .join(&sep);
        self.write_stdout(&text);
        self.write_stdout(&end);
        Ok(Value::None)
    }
}

fn expect_arity(
    name: &str,
    args: &[Value],
    min: usize,
    max: usize,
    loc: SourceLocation,
) -> Result<(), PyError> {
    if args.len() < min {
        return Err(PyError::type_error(
            format!(
                "{}() missing required argument (expected at least {}, got {})",
                name,
                min,
                args.len()
            ),
            loc,
        ));
    }
    if args.len() > max {
        return Err(PyError::type_error(
            format!(
                "{}() takes at most {} argument{} ({} given)",
                name,
                max,
                if max == 1 { "" } else { "s" },
                args.len()
            ),
            loc,
        ));
    }
    Ok(())
}

fn expect_exactly_one(name: &str, args: &[Value], loc: SourceLocation) -> Result<(), PyError> {
    if args.len() != 1 {
        return Err(PyError::type_error(
            format!("{}() takes exactly one argument ({} given)", name, args.len()),
            loc,
        ));
    }
    Ok(())
}

fn to_int(value: &Value, loc: SourceLocation) -> Result<Value, PyError> {
    match value {
        Value::Int(n) => Ok(Value::Int(n.clone())),
        Value::Bool(b) => Ok(Value::int(*b as u8)),
        Value::Float(f) => {
            if f.is_nan() {
                return Err(PyError::value_error("cannot convert float NaN to integer", loc));
            }
            if f.is_infinite() {
                return Err(PyError::new(
                    PyErrorKind::OverflowError,
                    "cannot convert float infinity to integer",
                    loc,
                ));
            }
            BigInt::from_f64(f.trunc())
                .map(Value::Int)
                .ok_or_else(|| PyError::overflow(loc))
        }
        Value::Str(s) => parse_int_literal(s.trim())
            .map(Value::Int)
            .ok_or_else(|| {
                PyError::value_error(
                    format!("invalid literal for int() with base 10: {}", value.repr()),
                    loc,
                )
            }),
        other => Err(PyError::type_error(
            format!(
                "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                other.type_name()
            ),
            loc,
        )),
    }
}

/// Decimal integer text as `int()` accepts it: optional sign, digits with
/// single underscores between them.
fn parse_int_literal(text: &str) -> Option<BigInt> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '_')
    {
        return None;
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let magnitude: BigInt = cleaned.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn to_float(value: &Value, loc: SourceLocation) -> Result<Value, PyError> {
    match value {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Str(s) => {
            let text = s.trim();
            let lowered = text.to_ascii_lowercase();
            let unsigned = lowered.trim_start_matches(['+', '-']);
            let parsed = match unsigned {
                "inf" | "infinity" | "nan" => lowered.replace("infinity", "inf").parse::<f64>().ok(),
                _ if text.chars().all(|c| c.is_ascii_digit() || "+-.eE_".contains(c)) => {
                    text.replace('_', "").parse::<f64>().ok()
                }
                _ => None,
            };
            parsed.map(Value::Float).ok_or_else(|| {
                PyError::value_error(
                    format!("could not convert string to float: {}", value.repr()),
                    loc,
                )
            })
        }
        other => other.as_float().map(Value::Float).ok_or_else(|| {
            PyError::type_error(
                format!(
                    "float() argument must be a string or a real number, not '{}'",
                    other.type_name()
                ),
                loc,
            )
        }),
    }
}

fn round(value: &Value, ndigits: Option<&Value>, loc: SourceLocation) -> Result<Value, PyError> {
    let digits = match ndigits {
        None | Some(Value::None) => None,
        Some(v) => match v.as_int() {
            // Digit counts beyond a machine word keep everything or nothing
            Some(n) => Some(n.to_i64().unwrap_or(if n.is_negative() { i64::MIN } else { i64::MAX })),
            None => {
                return Err(PyError::type_error(
                    format!("'{}' object cannot be interpreted as an integer", v.type_name()),
                    loc,
                ));
            }
        },
    };

    match (value, digits) {
        (Value::Float(f), None) => {
            if !f.is_finite() {
                return to_int(value, loc);
            }
            BigInt::from_f64(f.round_ties_even())
                .map(Value::Int)
                .ok_or_else(|| PyError::overflow(loc))
        }
        (Value::Float(f), Some(d)) => {
            let d = d.clamp(-308, 308) as i32;
            let scale = 10f64.powi(d);
            let rounded = (f * scale).round_ties_even() / scale;
            // Re-parse the shortest decimal to drop representation noise
            let cleaned = format_float(rounded).parse::<f64>().unwrap_or(rounded);
            Ok(Value::Float(cleaned))
        }
        (other, d) => match other.as_int() {
            Some(n) => match d {
                Some(d) if d < 0 => round_int(&n, d.unsigned_abs(), loc).map(Value::Int),
                _ => Ok(Value::Int(n)),
            },
            None => Err(PyError::type_error(
                format!(
                    "type {} doesn't define __round__ method",
                    other.type_name()
                ),
                loc,
            )),
        },
    }
}

/// `round(n, -digits)` on ints: nearest multiple of `10**digits`, ties to even
fn round_int(n: &BigInt, digits: u64, loc: SourceLocation) -> Result<BigInt, PyError> {
    // 10**digits is more than twice |n| once digits exceeds the bit length
    if digits > n.bits() {
        return Ok(BigInt::zero());
    }
    let exponent = u32::try_from(digits).map_err(|_| PyError::overflow(loc))?;
    let scale = BigInt::from(10u32).pow(exponent);
    let (q, r) = int_floor_div_mod(n, &scale, loc)?;
    let q = match (r * 2u32).cmp(&scale) {
        Ordering::Greater => q + 1,
        Ordering::Equal if !(&q % 2u32).is_zero() => q + 1,
        _ => q,
    };
    Ok(q * scale)
}

fn extremum(name: &str, args: Vec<Value>, loc: SourceLocation) -> Result<Value, PyError> {
    if args.is_empty() {
        return Err(PyError::type_error(
            format!("{} expected at least 1 argument, got 0", name),
            loc,
        ));
    }
    let candidates: Vec<Value> = if args.len() == 1 {
        match &args[0] {
            Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
            other => {
                return Err(PyError::type_error(
                    format!("'{}' object is not iterable", other.type_name()),
                    loc,
                ));
            }
        }
    } else {
        args
    };

    let mut iter = candidates.into_iter();
    let mut best = iter.next().ok_or_else(|| {
        PyError::value_error(format!("{}() arg is an empty sequence", name), loc)
    })?;
    for candidate in iter {
        let better = match (&candidate, &best) {
            (Value::Str(a), Value::Str(b)) => {
                if name == "max" { a > b } else { a < b }
            }
            (a, b) if a.is_number() && b.is_number() => {
                let wanted = if name == "max" { Ordering::Greater } else { Ordering::Less };
                numeric_cmp(a, b) == Some(wanted)
            }
            (a, b) => {
                return Err(PyError::type_error(
                    format!(
                        "'{}' not supported between instances of '{}' and '{}'",
                        if name == "max" { ">" } else { "<" },
                        a.type_name(),
                        b.type_name()
                    ),
                    loc,
                ));
            }
        };
        if better {
            best = candidate;
        }
    }
    Ok(best)
}

fn str_arg<'a>(
    args: &'a [Value],
    index: usize,
    method: &str,
    loc: SourceLocation,
) -> Result<&'a str, PyError> {
    match args.get(index) {
        Some(Value::Str(a)) => Ok(a.as_str()),
        Some(other) => Err(PyError::type_error(
            format!("must be str, not {}", other.type_name()),
            loc,
        )),
        None => Err(PyError::type_error(
            format!("str.{}() missing required argument", method),
            loc,
        )),
    }
}

/// Call a method on a value. Only `str` has methods in the subset.
pub(crate) fn call_method(
    receiver: &Value,
    method: &str,
    args: Vec<Value>,
    loc: SourceLocation,
) -> Result<Value, PyError> {
    let no_attribute = || {
        PyError::new(
            PyErrorKind::AttributeError,
            format!(
                "'{}' object has no attribute '{}'",
                receiver.type_name(),
                method
            ),
            loc,
        )
    };
    let Value::Str(s) = receiver else {
        return Err(no_attribute());
    };

    let result = match method {
        "upper" => Value::Str(s.to_uppercase()),
        "lower" => Value::Str(s.to_lowercase()),
        "strip" | "lstrip" | "rstrip" => {
            let chars: Vec<char> = match args.first() {
                None | Some(Value::None) => Vec::new(),
                Some(_) => str_arg(&args, 0, method, loc)?.chars().collect(),
            };
            let matches = |c: char| {
                if chars.is_empty() {
                    c.is_whitespace()
                } else {
                    chars.contains(&c)
                }
            };
            let stripped = match method {
                "strip" => s.trim_matches(matches),
                "lstrip" => s.trim_start_matches(matches),
                _ => s.trim_end_matches(matches),
            };
            Value::Str(stripped.to_string())
        }
        "title" => {
            let mut out = String::with_capacity(s.len());
            let mut previous_cased = false;
            for c in s.chars() {
                if previous_cased {
                    out.extend(c.to_lowercase());
                } else {
                    out.extend(c.to_uppercase());
                }
                previous_cased = c.is_alphabetic();
            }
            Value::Str(out)
        }
        "capitalize" => {
            let mut chars = s.chars();
            let out = match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            };
            Value::Str(out)
        }
        "replace" => {
            let (old, new) = (str_arg(&args, 0, method, loc)?, str_arg(&args, 1, method, loc)?);
            Value::Str(s.replace(old, new))
        }
        "isdigit" => Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())),
        "count" => {
            let needle = str_arg(&args, 0, method, loc)?;
            let count = if needle.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(needle).count()
            };
            Value::int(count)
        }
        _ => return Err(no_attribute()),
    };
    Ok(result)
}
