use std::rc::Rc;

use crate::parser::{ensure_stack, format_number, JsParser};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{FunctionKind, ObjectKind};
use crate::runner::ds::value::{JsObjectType, JsValue};

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";
pub const TYPE_STR_BIGINT: &str = "bigint";
pub const TYPE_STR_SYMBOL: &str = "symbol";

/// Result of the `typeof` operator.
pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::BigInt(_) => TYPE_STR_BIGINT,
        JsValue::Symbol(_) => TYPE_STR_SYMBOL,
        JsValue::Object(o) => {
            if o.borrow().is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
    }
}

/// `String(v)`.
pub fn to_string(v: &JsValue) -> String {
    match v {
        JsValue::Undefined => TYPE_STR_UNDEFINED.to_string(),
        JsValue::Null => TYPE_STR_NULL.to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::Number(n) => format_number(*n),
        JsValue::BigInt(n) => n.to_string(),
        JsValue::String(s) => s.clone(),
        JsValue::Symbol(s) => s.to_string(),
        JsValue::Object(o) => object_to_string(o, &mut vec![]),
    }
}

/// The implicit string conversion of `+` and template literals, which
/// refuses symbols.
pub fn to_string_implicit(v: &JsValue) -> Result<String, JErrorType> {
    match v {
        JsValue::Symbol(_) => Err(JErrorType::TypeError(
            "Cannot convert a Symbol value to a string".to_string(),
        )),
        other => Ok(to_string(other)),
    }
}

fn object_to_string(o: &JsObjectType, visiting: &mut Vec<JsObjectType>) -> String {
    ensure_stack(|| join_object(o, visiting))
}

fn join_object(o: &JsObjectType, visiting: &mut Vec<JsObjectType>) -> String {
    if visiting.iter().any(|v| Rc::ptr_eq(v, o)) {
        // Cyclic arrays join to an empty string.
        return String::new();
    }
    let obj = o.borrow();
    match &obj.kind {
        ObjectKind::Array(elements) => {
            visiting.push(o.clone());
            let parts: Vec<String> = elements
                .iter()
                .map(|e| match e {
                    JsValue::Undefined | JsValue::Null => String::new(),
                    JsValue::Object(inner) => object_to_string(inner, visiting),
                    other => to_string(other),
                })
                .collect();
            visiting.pop();
            parts.join(",")
        }
        ObjectKind::Function(FunctionKind::Script(f)) => f.data.source_text.clone(),
        ObjectKind::Function(FunctionKind::Native(f)) => {
            format!("function {}() {{ [native code] }}", f.name)
        }
        ObjectKind::Error => {
            let name = obj
                .get_own("name")
                .map(|n| to_string(&n))
                .unwrap_or_else(|| "Error".to_string());
            let message = obj
                .get_own("message")
                .map(|m| to_string(&m))
                .unwrap_or_default();
            if message.is_empty() {
                name
            } else if name.is_empty() {
                message
            } else {
                format!("{}: {}", name, message)
            }
        }
        ObjectKind::Promise(_) => "[object Promise]".to_string(),
        ObjectKind::Ordinary => "[object Object]".to_string(),
    }
}

/// `Number(v)`.
pub fn to_number(v: &JsValue) -> f64 {
    match v {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsValue::Number(n) => *n,
        JsValue::BigInt(n) => *n as f64,
        JsValue::Symbol(_) => f64::NAN,
        JsValue::String(s) => JsParser::parse_numeric_string(s),
        JsValue::Object(_) => JsParser::parse_numeric_string(&to_string(v)),
    }
}

/// `Boolean(v)`.
pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => !(n.is_nan() || *n == 0.0),
        JsValue::BigInt(n) => *n != 0,
        JsValue::Symbol(_) => true,
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

/// ToIntegerOrInfinity: truncates, maps `NaN` to zero.
pub fn to_integer(v: &JsValue) -> f64 {
    let n = to_number(v);
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// ToInt32, as used by `parseInt`'s radix and bitwise conversions.
pub fn to_int32(v: &JsValue) -> i32 {
    let n = to_number(v);
    if !n.is_finite() {
        return 0;
    }
    let m = n.trunc().rem_euclid(4294967296.0);
    if m >= 2147483648.0 {
        (m - 4294967296.0) as i32
    } else {
        m as i32
    }
}

/// Resolve a relative index argument (`slice(-2)`) against `len`.
pub fn relative_index(v: Option<&JsValue>, len: usize, default: usize) -> usize {
    match v {
        None | Some(JsValue::Undefined) => default,
        Some(v) => {
            let n = to_integer(v);
            if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                n.min(len as f64) as usize
            }
        }
    }
}
