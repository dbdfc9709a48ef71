//! Symbol built-in.
//!
//! `Symbol(description)` makes a fresh unique value. There is no global
//! symbol registry and no well-known symbols.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::{JsSymbol, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Symbol function.
pub fn register(registry: &mut BuiltInRegistry) {
    let symbol = BuiltInObject::new("Symbol")
        .with_function(symbol_function)
        .add_prototype_method("toString", symbol_to_string)
        .add_prototype_method("valueOf", symbol_value_of);

    registry.register_object(symbol);
}

fn this_symbol(this: &JsValue, method: &str) -> Result<JsValue, JErrorType> {
    match this {
        JsValue::Symbol(_) => Ok(this.clone()),
        _ => Err(JErrorType::TypeError(format!(
            "Symbol.prototype.{} requires that 'this' be a Symbol",
            method
        ))),
    }
}

/// Symbol(description)
fn symbol_function(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let description = match arg(&args, 0) {
        JsValue::Undefined => None,
        JsValue::Symbol(_) => {
            return Err(JErrorType::TypeError(
                "Cannot convert a Symbol value to a string".to_string(),
            ))
        }
        v => Some(to_string(&v)),
    };
    Ok(JsValue::Symbol(JsSymbol::new(description)))
}

/// Symbol.prototype.toString: `Symbol(description)`.
fn symbol_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let symbol = this_symbol(&this, "toString")?;
    Ok(JsValue::String(to_string(&symbol)))
}

/// Symbol.prototype.valueOf
fn symbol_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    this_symbol(&this, "valueOf")
}
