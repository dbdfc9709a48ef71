//! Timer functions.
//!
//! Callbacks are only queued on the realm. Nothing here waits or runs them;
//! a host that finishes a snippet drops whatever is still queued.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::test_and_comparison::is_callable;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::describe_value;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the timer functions as globals.
pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_object(BuiltInObject::new("setTimeout").with_function(set_timeout));
    registry.register_object(BuiltInObject::new("setInterval").with_function(set_interval));
    registry.register_object(BuiltInObject::new("clearTimeout").with_function(clear_timer));
    registry.register_object(BuiltInObject::new("clearInterval").with_function(clear_timer));
    registry.register_object(BuiltInObject::new("queueMicrotask").with_function(queue_microtask));
}

fn callback(args: &[JsValue]) -> Result<JsValue, JErrorType> {
    let cb = arg(args, 0);
    if is_callable(&cb) {
        Ok(cb)
    } else {
        Err(JErrorType::TypeError(format!(
            "The \"callback\" argument must be of type function. Received {}",
            describe_value(&cb)
        )))
    }
}

/// Delay in whole milliseconds; negative or `NaN` delays are zero.
fn delay(args: &[JsValue]) -> u32 {
    let ms = to_number(&arg(args, 1));
    if ms.is_nan() || ms <= 0.0 {
        0
    } else {
        ms.min(u32::MAX as f64) as u32
    }
}

fn schedule(ctx: &mut EvalContext, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let cb = callback(&args)?;
    let delay_ms = delay(&args);
    let extra: Vec<JsValue> = args.into_iter().skip(2).collect();
    let id = ctx.enqueue_timer(cb, delay_ms, extra);
    tracing::trace!(timer_id = id, delay_ms, "timer queued");
    Ok(JsValue::Number(id as f64))
}

/// setTimeout(callback, delay, ...args)
fn set_timeout(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    schedule(ctx, args)
}

/// setInterval(callback, delay, ...args): queued once, like a first tick.
fn set_interval(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    schedule(ctx, args)
}

/// clearTimeout(id) and clearInterval(id)
fn clear_timer(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let id = to_number(&arg(&args, 0));
    if id.is_finite() && id >= 0.0 && id.fract() == 0.0 && id <= u32::MAX as f64 {
        ctx.cancel_timer(id as u32);
    }
    Ok(JsValue::Undefined)
}

/// queueMicrotask(callback)
fn queue_microtask(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let cb = callback(&args)?;
    ctx.enqueue_microtask(cb, vec![]);
    Ok(JsValue::Undefined)
}
