//! BigInt built-in.
//!
//! BigInt values are `i128`; results outside that range throw a
//! `RangeError` instead of growing.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_integer, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the BigInt function.
pub fn register(registry: &mut BuiltInRegistry) {
    let bigint = BuiltInObject::new("BigInt")
        .with_function(bigint_function)
        .add_prototype_method("toString", bigint_to_string)
        .add_prototype_method("toLocaleString", bigint_to_string)
        .add_prototype_method("valueOf", bigint_value_of);

    registry.register_object(bigint);
}

fn this_bigint(this: &JsValue, method: &str) -> Result<i128, JErrorType> {
    match this {
        JsValue::BigInt(n) => Ok(*n),
        _ => Err(JErrorType::TypeError(format!(
            "BigInt.prototype.{} requires that 'this' be a BigInt",
            method
        ))),
    }
}

/// Parse the text of `BigInt("...")`: optional sign, decimal or a
/// `0x`/`0o`/`0b` prefix. Blank text is zero.
pub fn parse_bigint(text: &str) -> Option<i128> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0);
    }
    let (radix, digits) = match text.get(..2).map(|p| p.to_ascii_lowercase()).as_deref() {
        Some("0x") => (16, &text[2..]),
        Some("0o") => (8, &text[2..]),
        Some("0b") => (2, &text[2..]),
        _ => (10, text),
    };
    if digits.is_empty() || (radix != 10 && digits.starts_with(['+', '-'])) {
        return None;
    }
    i128::from_str_radix(digits, radix).ok()
}

/// BigInt(value)
fn bigint_function(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let value = arg(&args, 0);
    let n = match &value {
        JsValue::BigInt(n) => *n,
        JsValue::Boolean(b) => *b as i128,
        JsValue::Number(n) => {
            if n.fract() != 0.0 || !n.is_finite() {
                return Err(JErrorType::RangeError(format!(
                    "The number {} cannot be converted to a BigInt because it is not an integer",
                    to_string(&value)
                )));
            }
            if n.abs() >= i128::MAX as f64 {
                return Err(JErrorType::RangeError(
                    "Maximum BigInt size exceeded".to_string(),
                ));
            }
            *n as i128
        }
        JsValue::String(s) => parse_bigint(s).ok_or_else(|| {
            JErrorType::SyntaxError(format!("Cannot convert {} to a BigInt", s))
        })?,
        other => {
            return Err(JErrorType::TypeError(format!(
                "Cannot convert {} to a BigInt",
                to_string(other)
            )))
        }
    };
    Ok(JsValue::BigInt(n))
}

/// Digits of `n` in `radix`, with a leading `-` for negatives.
fn to_radix_string(n: i128, radix: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = vec![];
    let mut rest = n.unsigned_abs();
    while rest > 0 {
        let d = (rest % radix as u128) as u32;
        digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
        rest /= radix as u128;
    }
    if n < 0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

/// BigInt.prototype.toString(radix)
fn bigint_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = this_bigint(&this, "toString")?;
    let radix = match arg(&args, 0) {
        JsValue::Undefined => 10.0,
        v => to_integer(&v),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JErrorType::RangeError(
            "toString() radix must be between 2 and 36".to_string(),
        ));
    }
    Ok(JsValue::String(to_radix_string(n, radix as u32)))
}

/// BigInt.prototype.valueOf
fn bigint_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::BigInt(this_bigint(&this, "valueOf")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bigint_text() {
        assert_eq!(parse_bigint(" 42 "), Some(42));
        assert_eq!(parse_bigint("-7"), Some(-7));
        assert_eq!(parse_bigint("0xff"), Some(255));
        assert_eq!(parse_bigint(""), Some(0));
        assert_eq!(parse_bigint("1.5"), None);
        assert_eq!(parse_bigint("0x"), None);
    }

    #[test]
    fn test_radix_strings() {
        assert_eq!(to_radix_string(255, 16), "ff");
        assert_eq!(to_radix_string(-5, 2), "-101");
        assert_eq!(to_radix_string(0, 8), "0");
        assert_eq!(to_radix_string(i128::MIN, 10), i128::MIN.to_string());
    }
}
