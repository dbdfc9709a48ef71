//! Object built-in.
//!
//! Provides the `Object` function, its static helpers and the methods every
//! value inherits (`hasOwnProperty`, `toString`).

use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{
    array_index, new_array, new_object, to_property_key, JsObject, ObjectKind,
};
use crate::runner::ds::value::{JsObjectType, JsValue};
use crate::runner::eval::expression::{iterate_values, own_enumerable_entries};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object")
        .with_no_prototype()
        .with_constructor(object_constructor)
        .add_method("keys", object_keys)
        .add_method("values", object_values)
        .add_method("entries", object_entries)
        .add_method("assign", object_assign)
        .add_method("freeze", object_freeze)
        .add_method("isFrozen", object_is_frozen)
        .add_method("fromEntries", object_from_entries)
        .add_method("create", object_create)
        .add_method("getPrototypeOf", object_get_prototype_of)
        .add_prototype_method("hasOwnProperty", object_has_own_property)
        .add_prototype_method("toString", object_to_string)
        .add_prototype_method("valueOf", object_value_of);

    registry.register_object(object);
}

fn require_object_coercible(value: &JsValue) -> Result<(), JErrorType> {
    if value.is_nullish() {
        Err(JErrorType::TypeError(
            "Cannot convert undefined or null to object".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Object(value): a fresh object for nullish input, the input otherwise.
fn object_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match arg(&args, 0) {
        JsValue::Undefined | JsValue::Null => Ok(new_object()),
        other => Ok(other),
    }
}

/// Object.keys
fn object_keys(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    Ok(new_array(
        own_enumerable_entries(&target)
            .into_iter()
            .map(|(k, _)| JsValue::String(k))
            .collect(),
    ))
}

/// Object.values
fn object_values(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    Ok(new_array(
        own_enumerable_entries(&target)
            .into_iter()
            .map(|(_, v)| v)
            .collect(),
    ))
}

/// Object.entries
fn object_entries(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    Ok(new_array(
        own_enumerable_entries(&target)
            .into_iter()
            .map(|(k, v)| new_array(vec![JsValue::String(k), v]))
            .collect(),
    ))
}

/// Object.assign: copies own enumerable properties left to right.
fn object_assign(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    let target_obj = match &target {
        JsValue::Object(o) => o.clone(),
        // Primitive targets are returned unchanged.
        _ => return Ok(target),
    };
    for source in args.iter().skip(1) {
        for (key, value) in own_enumerable_entries(source) {
            target_obj.borrow_mut().set(&key, value)?;
        }
    }
    Ok(target)
}

/// Object.freeze
fn object_freeze(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    if let JsValue::Object(o) = &target {
        o.borrow_mut().frozen = true;
    }
    Ok(target)
}

/// Object.isFrozen: primitives count as frozen.
fn object_is_frozen(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(match arg(&args, 0) {
        JsValue::Object(o) => o.borrow().frozen,
        _ => true,
    }))
}

/// Object.fromEntries: builds an object from `[key, value]` pairs.
fn object_from_entries(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let result = JsObject::new(ObjectKind::Ordinary);
    let result = Rc::new(RefCell::new(result));
    for entry in iterate_values(&arg(&args, 0))? {
        if !matches!(entry, JsValue::Object(_)) {
            return Err(JErrorType::TypeError(format!(
                "Iterator value {} is not an entry object",
                entry
            )));
        }
        let pair = iterate_values(&entry)?;
        let key = to_property_key(pair.first().unwrap_or(&JsValue::Undefined));
        let value = pair.get(1).cloned().unwrap_or(JsValue::Undefined);
        result.borrow_mut().set(&key, value)?;
    }
    Ok(JsValue::Object(result))
}

/// Object.create(proto): a new object linked to `proto`.
fn object_create(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let prototype: Option<JsObjectType> = match arg(&args, 0) {
        JsValue::Object(o) => Some(o),
        JsValue::Null => None,
        other => {
            return Err(JErrorType::TypeError(format!(
                "Object prototype may only be an Object or null: {}",
                other
            )))
        }
    };
    let mut obj = JsObject::new(ObjectKind::Ordinary);
    obj.prototype = prototype;
    Ok(JsValue::Object(Rc::new(RefCell::new(obj))))
}

/// Object.getPrototypeOf: the explicit prototype link, or null.
fn object_get_prototype_of(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    Ok(match &target {
        JsValue::Object(o) => o
            .borrow()
            .prototype
            .clone()
            .map(JsValue::Object)
            .unwrap_or(JsValue::Null),
        _ => JsValue::Null,
    })
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    require_object_coercible(&this)?;
    let key = to_property_key(&arg(&args, 0));
    Ok(JsValue::Boolean(match &this {
        JsValue::Object(o) => o.borrow().has_own(&key),
        JsValue::String(s) => {
            key == "length"
                || array_index(&key).map_or(false, |i| i < s.encode_utf16().count())
        }
        _ => false,
    }))
}

/// Object.prototype.toString: `[object Tag]`.
fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let tag = match &this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::BigInt(_) => "BigInt",
        JsValue::String(_) => "String",
        JsValue::Symbol(_) => "Symbol",
        JsValue::Object(o) => o.borrow().class_name(),
    };
    Ok(JsValue::String(format!("[object {}]", tag)))
}

/// Object.prototype.valueOf
fn object_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    require_object_coercible(&this)?;
    Ok(this)
}
