//! Function built-in: `call`, `apply` and `bind` on every function value.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::new_native_function;
use crate::runner::ds::operations::test_and_comparison::is_callable;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::expression::iterate_values;
use crate::runner::eval::function::{call_function, describe_value};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInFn, BuiltInObject, EvalContext};

use super::arg;

/// Register the Function built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let function = BuiltInObject::new("Function")
        .with_function(function_constructor)
        .add_prototype_method("call", function_call)
        .add_prototype_method("apply", function_apply)
        .add_prototype_method("bind", function_bind);

    registry.register_object(function);
}

/// Function(...): compiling source text at runtime is not available.
fn function_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Err(JErrorType::TypeError(
        "Function constructor is not supported".to_string(),
    ))
}

fn this_callable(this: &JsValue, method: &str) -> Result<(), JErrorType> {
    if is_callable(this) {
        Ok(())
    } else {
        Err(JErrorType::TypeError(format!(
            "Function.prototype.{} called on {}, which is not a function",
            method,
            describe_value(this)
        )))
    }
}

/// Function.prototype.call(thisArg, ...args)
fn function_call(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    this_callable(&this, "call")?;
    let mut args = args.into_iter();
    let this_arg = args.next().unwrap_or(JsValue::Undefined);
    call_function(&this, this_arg, args.collect(), ctx)
}

/// Function.prototype.apply(thisArg, argsArray)
fn function_apply(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    this_callable(&this, "apply")?;
    let list = match arg(&args, 1) {
        JsValue::Undefined | JsValue::Null => vec![],
        JsValue::Object(o) if o.borrow().is_array() => iterate_values(&JsValue::Object(o))?,
        _ => {
            return Err(JErrorType::TypeError(
                "CreateListFromArrayLike called on non-object".to_string(),
            ))
        }
    };
    call_function(&this, arg(&args, 0), list, ctx)
}

/// Function.prototype.bind(thisArg, ...args)
fn function_bind(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    this_callable(&this, "bind")?;
    let name = match &this {
        JsValue::Object(o) => match o.borrow().get_own("name") {
            Some(JsValue::String(name)) => name,
            _ => String::new(),
        },
        _ => String::new(),
    };
    let mut args = args.into_iter();
    let bound_this = args.next().unwrap_or(JsValue::Undefined);
    let bound_args: Vec<JsValue> = args.collect();
    let target = this;
    let bound = BuiltInFn::closure(move |ctx, _this, call_args| {
        let mut all = bound_args.clone();
        all.extend(call_args);
        call_function(&target, bound_this.clone(), all, ctx)
    });
    Ok(new_native_function(&format!("bound {}", name), bound, false))
}
