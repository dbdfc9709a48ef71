//! Error built-in objects.
//!
//! Provides Error, TypeError, ReferenceError, SyntaxError and RangeError
//! constructors. Every error object carries own `name` and `message`
//! properties.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::new_error;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::expression::get_property;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

/// Register all error types with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    // Base Error
    let error = BuiltInObject::new("Error")
        .with_constructor(error_constructor)
        .add_prototype_method("toString", error_to_string);
    registry.register_object(error);

    registry.register_object(
        BuiltInObject::new("TypeError")
            .with_prototype("Error")
            .with_constructor(type_error_constructor),
    );
    registry.register_object(
        BuiltInObject::new("ReferenceError")
            .with_prototype("Error")
            .with_constructor(reference_error_constructor),
    );
    registry.register_object(
        BuiltInObject::new("SyntaxError")
            .with_prototype("Error")
            .with_constructor(syntax_error_constructor),
    );
    registry.register_object(
        BuiltInObject::new("RangeError")
            .with_prototype("Error")
            .with_constructor(range_error_constructor),
    );
}

/// Build an error named `name` from constructor arguments. An options
/// object with a `cause` is recorded on the error.
fn make_error(name: &str, args: &[JsValue]) -> JsValue {
    let message = match args.first() {
        None | Some(JsValue::Undefined) => String::new(),
        Some(v) => to_string(v),
    };
    let error = new_error(name, &message);
    if let (JsValue::Object(e), Some(JsValue::Object(options))) = (&error, args.get(1)) {
        if let Some(cause) = options.borrow().get_own("cause") {
            e.borrow_mut().define("cause", cause, false);
        }
    }
    error
}

/// Error constructor; works with or without `new`.
fn error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("Error", &args))
}

/// TypeError constructor.
fn type_error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("TypeError", &args))
}

/// ReferenceError constructor.
fn reference_error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("ReferenceError", &args))
}

/// SyntaxError constructor.
fn syntax_error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("SyntaxError", &args))
}

/// RangeError constructor.
fn range_error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("RangeError", &args))
}

/// Error.prototype.toString: `name: message`, omitting empty parts.
fn error_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if !matches!(this, JsValue::Object(_)) {
        return Err(JErrorType::TypeError(
            "Error.prototype.toString requires that 'this' be an Object".to_string(),
        ));
    }
    let name = match get_property(&this, "name", ctx)? {
        JsValue::Undefined => "Error".to_string(),
        v => to_string(&v),
    };
    let message = match get_property(&this, "message", ctx)? {
        JsValue::Undefined => String::new(),
        v => to_string(&v),
    };
    Ok(JsValue::String(if message.is_empty() {
        name
    } else if name.is_empty() {
        message
    } else {
        format!("{}: {}", name, message)
    }))
}
