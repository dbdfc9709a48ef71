//! Number built-in.
//!
//! Provides the `Number` and `Boolean` functions, number prototype methods
//! and the global numeric helpers (`parseInt`, `parseFloat`, `isNaN`,
//! `isFinite`).

use crate::parser::format_number;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_boolean, to_int32, to_integer, to_number, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

/// Register Number, Boolean and the global numeric functions.
pub fn register(registry: &mut BuiltInRegistry) {
    let number = BuiltInObject::new("Number")
        .with_constructor(number_constructor)
        .add_property("MAX_VALUE", JsValue::Number(f64::MAX))
        .add_property("MIN_VALUE", JsValue::Number(5e-324))
        .add_property("POSITIVE_INFINITY", JsValue::Number(f64::INFINITY))
        .add_property("NEGATIVE_INFINITY", JsValue::Number(f64::NEG_INFINITY))
        .add_property("NaN", JsValue::Number(f64::NAN))
        .add_property("MAX_SAFE_INTEGER", JsValue::Number(MAX_SAFE_INTEGER))
        .add_property("MIN_SAFE_INTEGER", JsValue::Number(-MAX_SAFE_INTEGER))
        .add_property("EPSILON", JsValue::Number(f64::EPSILON))
        .add_method("isNaN", number_is_nan)
        .add_method("isFinite", number_is_finite)
        .add_method("isInteger", number_is_integer)
        .add_method("isSafeInteger", number_is_safe_integer)
        .add_method("parseFloat", global_parse_float)
        .add_method("parseInt", global_parse_int)
        .add_prototype_method("toString", number_to_string)
        .add_prototype_method("toFixed", number_to_fixed)
        .add_prototype_method("valueOf", number_value_of);
    registry.register_object(number);

    let boolean = BuiltInObject::new("Boolean")
        .with_constructor(boolean_constructor)
        .add_prototype_method("toString", boolean_to_string)
        .add_prototype_method("valueOf", boolean_value_of);
    registry.register_object(boolean);

    registry.register_object(BuiltInObject::new("parseInt").with_function(global_parse_int));
    registry.register_object(BuiltInObject::new("parseFloat").with_function(global_parse_float));
    registry.register_object(BuiltInObject::new("isNaN").with_function(global_is_nan));
    registry.register_object(BuiltInObject::new("isFinite").with_function(global_is_finite));
}

fn this_number(this: &JsValue, method: &str) -> Result<f64, JErrorType> {
    match this {
        JsValue::Number(n) => Ok(*n),
        _ => Err(JErrorType::TypeError(format!(
            "Number.prototype.{} requires that 'this' be a Number",
            method
        ))),
    }
}

/// Number(value)
fn number_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(match args.first() {
        None => 0.0,
        Some(v) => to_number(v),
    }))
}

/// Boolean(value)
fn boolean_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_boolean(&arg(&args, 0))))
}

/// Number.isNaN: no coercion.
fn number_is_nan(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(matches!(arg(&args, 0), JsValue::Number(n) if n.is_nan())))
}

/// Number.isFinite: no coercion.
fn number_is_finite(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(matches!(arg(&args, 0), JsValue::Number(n) if n.is_finite())))
}

/// Number.isInteger
fn number_is_integer(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        matches!(arg(&args, 0), JsValue::Number(n) if n.is_finite() && n.trunc() == n),
    ))
}

/// Number.isSafeInteger
fn number_is_safe_integer(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(matches!(
        arg(&args, 0),
        JsValue::Number(n) if n.is_finite() && n.trunc() == n && n.abs() <= MAX_SAFE_INTEGER
    )))
}

/// isNaN(value): coerces first.
fn global_is_nan(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_number(&arg(&args, 0)).is_nan()))
}

/// isFinite(value): coerces first.
fn global_is_finite(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_number(&arg(&args, 0)).is_finite()))
}

/// parseInt(string, radix)
fn global_parse_int(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let input = to_string(&arg(&args, 0));
    let radix = match arg(&args, 1) {
        JsValue::Undefined => 0,
        v => to_int32(&v),
    };
    Ok(JsValue::Number(parse_int(&input, radix)))
}

/// parseFloat(string)
fn global_parse_float(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(parse_float(&to_string(&arg(&args, 0)))))
}

/// Parse the longest run of digits in `radix` at the start of `input`.
/// A radix of zero means 10, or 16 with a `0x` prefix.
pub fn parse_int(input: &str, radix: i32) -> f64 {
    let s = input.trim_start();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let hex_prefixed = s.starts_with("0x") || s.starts_with("0X");
    let (radix, s) = match radix {
        0 if hex_prefixed => (16, &s[2..]),
        0 => (10, s),
        16 if hex_prefixed => (16, &s[2..]),
        r if (2..=36).contains(&r) => (r as u32, s),
        _ => return f64::NAN,
    };
    let digits: Vec<u32> = s.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let value = digits
        .iter()
        .fold(0f64, |acc, d| acc * radix as f64 + *d as f64);
    if negative {
        -value
    } else {
        value
    }
}

/// Parse the longest decimal literal prefix of `input`.
pub fn parse_float(input: &str) -> f64 {
    let s = input.trim_start();
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    s[..end].trim_end_matches('.').parse::<f64>().unwrap_or(f64::NAN)
}

/// Number.prototype.toString(radix)
fn number_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toString")?;
    let radix = match arg(&args, 0) {
        JsValue::Undefined => 10.0,
        v => to_integer(&v),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JErrorType::RangeError(
            "toString() radix must be between 2 and 36".to_string(),
        ));
    }
    if radix == 10.0 || !n.is_finite() {
        return Ok(JsValue::String(format_number(n)));
    }
    Ok(JsValue::String(to_radix_string(n, radix as u32)))
}

fn to_radix_string(n: f64, radix: u32) -> String {
    let digit = |d: u32| std::char::from_digit(d, radix).unwrap_or('0');
    let negative = n < 0.0;
    let n = n.abs();
    let mut int_part = n.trunc();
    let mut frac_part = n - int_part;

    let mut int_digits = vec![];
    if int_part == 0.0 {
        int_digits.push('0');
    }
    while int_part >= 1.0 {
        let d = (int_part % radix as f64) as u32;
        int_digits.push(digit(d));
        int_part = (int_part / radix as f64).trunc();
    }
    int_digits.reverse();

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.extend(int_digits);
    if frac_part > 0.0 {
        out.push('.');
        for _ in 0..52 {
            frac_part *= radix as f64;
            let d = frac_part.trunc() as u32;
            out.push(digit(d));
            frac_part -= d as f64;
            if frac_part == 0.0 {
                break;
            }
        }
    }
    out
}

/// Number.prototype.toFixed(digits)
fn number_to_fixed(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toFixed")?;
    let digits = to_integer(&arg(&args, 0));
    if !(0.0..=100.0).contains(&digits) {
        return Err(JErrorType::RangeError(
            "toFixed() digits argument must be between 0 and 100".to_string(),
        ));
    }
    Ok(JsValue::String(to_fixed(n, digits as usize)))
}

/// Fixed-point notation. Exact ties round away from zero.
pub fn to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= 1e21 {
        return format_number(n);
    }
    let scaled = n.abs() * 10f64.powi(digits as i32);
    let formatted = if scaled < MAX_SAFE_INTEGER && scaled.fract() == 0.5 {
        let units = format!("{:0>width$}", scaled.ceil() as u64, width = digits + 1);
        let (int, frac) = units.split_at(units.len() - digits);
        if digits == 0 {
            int.to_string()
        } else {
            format!("{}.{}", int, frac)
        }
    } else {
        format!("{:.*}", digits, n.abs())
    };
    if n < 0.0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Number.prototype.valueOf
fn number_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(this_number(&this, "valueOf")?))
}

/// Boolean.prototype.toString
fn boolean_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match this {
        JsValue::Boolean(b) => Ok(JsValue::String(b.to_string())),
        _ => Err(JErrorType::TypeError(
            "Boolean.prototype.toString requires that 'this' be a Boolean".to_string(),
        )),
    }
}

/// Boolean.prototype.valueOf
fn boolean_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match this {
        JsValue::Boolean(b) => Ok(JsValue::Boolean(b)),
        _ => Err(JErrorType::TypeError(
            "Boolean.prototype.valueOf requires that 'this' be a Boolean".to_string(),
        )),
    }
}
