use std::rc::Rc;

use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::value::JsValue;

/// `===`
pub fn strict_equality(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) | (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(x), JsValue::Boolean(y)) => x == y,
        (JsValue::Number(x), JsValue::Number(y)) => x == y,
        (JsValue::String(x), JsValue::String(y)) => x == y,
        (JsValue::BigInt(x), JsValue::BigInt(y)) => x == y,
        (JsValue::Symbol(x), JsValue::Symbol(y)) => Rc::ptr_eq(x, y),
        (JsValue::Object(x), JsValue::Object(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// `==`
pub fn loose_equality(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
        (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => false,
        (JsValue::Number(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Number(_)) => {
            to_number(a) == to_number(b)
        }
        (JsValue::BigInt(x), JsValue::Number(y)) | (JsValue::Number(y), JsValue::BigInt(x)) => {
            *x as f64 == *y
        }
        (JsValue::BigInt(x), JsValue::String(s)) | (JsValue::String(s), JsValue::BigInt(x)) => {
            s.trim().parse::<i128>().map_or(false, |y| *x == y)
        }
        (JsValue::Boolean(_), _) => loose_equality(&JsValue::Number(to_number(a)), b),
        (_, JsValue::Boolean(_)) => loose_equality(a, &JsValue::Number(to_number(b))),
        (JsValue::Object(_), JsValue::Number(_) | JsValue::String(_) | JsValue::BigInt(_)) => {
            loose_equality(&JsValue::String(to_string(a)), b)
        }
        (JsValue::Number(_) | JsValue::String(_) | JsValue::BigInt(_), JsValue::Object(_)) => {
            loose_equality(a, &JsValue::String(to_string(b)))
        }
        _ => strict_equality(a, b),
    }
}

/// SameValueZero, used by `includes`: like `===` but `NaN` equals `NaN`.
pub fn same_value_zero(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_equality(a, b),
    }
}

pub fn is_callable(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.borrow().is_callable(),
        _ => false,
    }
}
