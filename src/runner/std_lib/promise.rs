//! Promise built-in.
//!
//! The executor runs synchronously inside the constructor. Settling a
//! promise never runs reactions directly: each reaction becomes a
//! microtask on the realm's job queue, like in a browser. The host decides
//! whether queued jobs ever run.
//!
//! The combinators (`all`, `allSettled`, `race`, `any`) subscribe to every
//! input with `then`, so their results also settle only from queued jobs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{
    new_array, new_error, new_native_function, new_promise, object_from_properties, ObjectKind,
    PromiseReaction, PromiseState,
};
use crate::runner::ds::operations::test_and_comparison::is_callable;
use crate::runner::ds::value::{JsObjectType, JsValue};
use crate::runner::eval::expression::iterate_values;
use crate::runner::eval::function::{call_function, describe_value};
use crate::runner::eval::statement::error_to_js_value;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInFn, BuiltInObject, EvalContext};

use super::arg;

/// Register the Promise built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let promise = BuiltInObject::new("Promise")
        .with_constructor(promise_constructor)
        .add_method("resolve", promise_resolve)
        .add_method("reject", promise_reject)
        .add_method("all", promise_all)
        .add_method("allSettled", promise_all_settled)
        .add_method("race", promise_race)
        .add_method("any", promise_any)
        .add_prototype_method("then", promise_then)
        .add_prototype_method("catch", promise_catch)
        .add_prototype_method("finally", promise_finally);

    registry.register_object(promise);
}

/// How a promise settled.
#[derive(Clone)]
enum Outcome {
    Fulfilled(JsValue),
    Rejected(JsValue),
}

fn as_promise(value: &JsValue) -> Option<JsObjectType> {
    match value {
        JsValue::Object(o) if matches!(o.borrow().kind, ObjectKind::Promise(_)) => Some(o.clone()),
        _ => None,
    }
}

fn native(name: &str, f: BuiltInFn) -> JsValue {
    new_native_function(name, f, false)
}

/// Settle `promise` and queue its reactions. Settled promises are left alone.
fn settle(ctx: &mut EvalContext, promise: &JsObjectType, outcome: Outcome) {
    let reactions = {
        let mut obj = promise.borrow_mut();
        let data = match &mut obj.kind {
            ObjectKind::Promise(data) => data,
            _ => return,
        };
        if !matches!(data.state, PromiseState::Pending) {
            return;
        }
        data.state = match &outcome {
            Outcome::Fulfilled(v) => PromiseState::Fulfilled(v.clone()),
            Outcome::Rejected(r) => PromiseState::Rejected(r.clone()),
        };
        std::mem::take(&mut data.reactions)
    };
    for reaction in reactions {
        queue_reaction(ctx, reaction, outcome.clone());
    }
}

/// Resolve `promise` with `value`, adopting the state of another promise.
pub fn resolve_promise(ctx: &mut EvalContext, promise: &JsObjectType, value: JsValue) {
    if let Some(inner) = as_promise(&value) {
        if Rc::ptr_eq(&inner, promise) {
            let error = error_to_js_value(&JErrorType::TypeError(
                "Chaining cycle detected for promise #<Promise>".to_string(),
            ));
            settle(ctx, promise, Outcome::Rejected(error));
            return;
        }
        add_reaction(
            ctx,
            &inner,
            PromiseReaction {
                on_fulfilled: None,
                on_rejected: None,
                derived: promise.clone(),
            },
        );
        return;
    }
    settle(ctx, promise, Outcome::Fulfilled(value));
}

pub fn reject_promise(ctx: &mut EvalContext, promise: &JsObjectType, reason: JsValue) {
    settle(ctx, promise, Outcome::Rejected(reason));
}

/// Subscribe to `value` the way `await value` does. The continuation job is
/// queued once the value settles; suspended bodies are never resumed, so the
/// job only settles a throwaway promise.
pub fn await_value(ctx: &mut EvalContext, value: JsValue) {
    let promise = to_promise(ctx, value);
    then(ctx, &promise, JsValue::Undefined, JsValue::Undefined);
}

/// `Promise.resolve(value)` without the JS call.
fn to_promise(ctx: &mut EvalContext, value: JsValue) -> JsObjectType {
    if let Some(promise) = as_promise(&value) {
        return promise;
    }
    let promise = new_promise();
    resolve_promise(ctx, &promise, value);
    promise
}

/// Register a reaction, or queue it right away if `promise` already settled.
fn add_reaction(ctx: &mut EvalContext, promise: &JsObjectType, reaction: PromiseReaction) {
    let settled = {
        let mut obj = promise.borrow_mut();
        match &mut obj.kind {
            ObjectKind::Promise(data) => match &data.state {
                PromiseState::Pending => {
                    data.reactions.push(reaction);
                    return;
                }
                PromiseState::Fulfilled(v) => Outcome::Fulfilled(v.clone()),
                PromiseState::Rejected(r) => Outcome::Rejected(r.clone()),
            },
            _ => return,
        }
    };
    queue_reaction(ctx, reaction, settled);
}

/// Queue a microtask that runs one reaction's handler and settles its
/// derived promise with the result.
fn queue_reaction(ctx: &mut EvalContext, reaction: PromiseReaction, outcome: Outcome) {
    let PromiseReaction {
        on_fulfilled,
        on_rejected,
        derived,
    } = reaction;
    let job = BuiltInFn::closure(move |ctx, _this, _args| {
        let (handler, value) = match &outcome {
            Outcome::Fulfilled(v) => (on_fulfilled.clone(), v.clone()),
            Outcome::Rejected(r) => (on_rejected.clone(), r.clone()),
        };
        match handler {
            Some(handler) => match call_function(&handler, JsValue::Undefined, vec![value], ctx) {
                Ok(result) => resolve_promise(ctx, &derived, result),
                Err(e) if e.is_catchable() => {
                    settle(ctx, &derived, Outcome::Rejected(error_to_js_value(&e)))
                }
                Err(e) => return Err(e),
            },
            None => match &outcome {
                Outcome::Fulfilled(_) => resolve_promise(ctx, &derived, value),
                Outcome::Rejected(_) => settle(ctx, &derived, Outcome::Rejected(value)),
            },
        }
        Ok(JsValue::Undefined)
    });
    ctx.enqueue_microtask(native("", job), vec![]);
}

/// The `resolve`/`reject` pair handed to an executor. Only the first call
/// of either has an effect.
fn resolving_functions(promise: &JsObjectType) -> (JsValue, JsValue) {
    let already_resolved = Rc::new(Cell::new(false));

    let (p, done) = (promise.clone(), already_resolved.clone());
    let resolve = BuiltInFn::closure(move |ctx, _this, args| {
        if !done.replace(true) {
            resolve_promise(ctx, &p, arg(&args, 0));
        }
        Ok(JsValue::Undefined)
    });

    let (p, done) = (promise.clone(), already_resolved);
    let reject = BuiltInFn::closure(move |ctx, _this, args| {
        if !done.replace(true) {
            settle(ctx, &p, Outcome::Rejected(arg(&args, 0)));
        }
        Ok(JsValue::Undefined)
    });

    (native("resolve", resolve), native("reject", reject))
}

/// new Promise(executor)
fn promise_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let executor = arg(&args, 0);
    if !is_callable(&executor) {
        return Err(JErrorType::TypeError(format!(
            "Promise resolver {} is not a function",
            describe_value(&executor)
        )));
    }
    let promise = new_promise();
    let (resolve, reject) = resolving_functions(&promise);
    match call_function(&executor, JsValue::Undefined, vec![resolve, reject.clone()], ctx) {
        Ok(_) => {}
        Err(e) if e.is_catchable() => {
            call_function(&reject, JsValue::Undefined, vec![error_to_js_value(&e)], ctx)?;
        }
        Err(e) => return Err(e),
    }
    Ok(JsValue::Object(promise))
}

/// Promise.resolve: promises pass through unchanged.
fn promise_resolve(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Object(to_promise(ctx, arg(&args, 0))))
}

/// Promise.reject
fn promise_reject(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let promise = new_promise();
    settle(ctx, &promise, Outcome::Rejected(arg(&args, 0)));
    Ok(JsValue::Object(promise))
}

fn this_promise(this: &JsValue, method: &str) -> Result<JsObjectType, JErrorType> {
    as_promise(this).ok_or_else(|| {
        JErrorType::TypeError(format!(
            "Method Promise.prototype.{} called on incompatible receiver {}",
            method,
            describe_value(this)
        ))
    })
}

fn then(
    ctx: &mut EvalContext,
    promise: &JsObjectType,
    on_fulfilled: JsValue,
    on_rejected: JsValue,
) -> JsValue {
    let derived = new_promise();
    let handler = |v: JsValue| if is_callable(&v) { Some(v) } else { None };
    add_reaction(
        ctx,
        promise,
        PromiseReaction {
            on_fulfilled: handler(on_fulfilled),
            on_rejected: handler(on_rejected),
            derived: derived.clone(),
        },
    );
    JsValue::Object(derived)
}

/// Promise.prototype.then
fn promise_then(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let promise = this_promise(&this, "then")?;
    Ok(then(ctx, &promise, arg(&args, 0), arg(&args, 1)))
}

/// Promise.prototype.catch
fn promise_catch(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let promise = this_promise(&this, "catch")?;
    Ok(then(ctx, &promise, JsValue::Undefined, arg(&args, 0)))
}

/// Promise.prototype.finally: runs the callback and passes the outcome on.
fn promise_finally(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let promise = this_promise(&this, "finally")?;
    let on_finally = arg(&args, 0);
    if !is_callable(&on_finally) {
        return Ok(then(ctx, &promise, on_finally.clone(), on_finally));
    }

    let callback = on_finally.clone();
    let pass_value = BuiltInFn::closure(move |ctx, _this, args| {
        call_function(&callback, JsValue::Undefined, vec![], ctx)?;
        Ok(arg(&args, 0))
    });
    let callback = on_finally;
    let pass_reason = BuiltInFn::closure(move |ctx, _this, args| {
        call_function(&callback, JsValue::Undefined, vec![], ctx)?;
        Err(JErrorType::Thrown(arg(&args, 0)))
    });
    Ok(then(
        ctx,
        &promise,
        native("", pass_value),
        native("", pass_reason),
    ))
}

/// The promises a combinator subscribes to, one per element of its argument.
/// A non-iterable argument gives `Err` with a promise already rejected by
/// the TypeError.
fn combinator_inputs(ctx: &mut EvalContext, args: &[JsValue]) -> Result<Vec<JsObjectType>, JsValue> {
    match iterate_values(&arg(args, 0)) {
        Ok(items) => Ok(items.into_iter().map(|v| to_promise(ctx, v)).collect()),
        Err(e) => {
            let rejected = new_promise();
            reject_promise(ctx, &rejected, error_to_js_value(&e));
            Err(JsValue::Object(rejected))
        }
    }
}

/// Collects one result per input and fires once every slot is filled.
struct Collector {
    slots: RefCell<Vec<JsValue>>,
    remaining: Cell<usize>,
}

impl Collector {
    fn new(len: usize) -> Rc<Collector> {
        Rc::new(Collector {
            slots: RefCell::new(vec![JsValue::Undefined; len]),
            remaining: Cell::new(len),
        })
    }

    /// Store `value` at `index`; returns the finished array after the last one.
    fn fill(&self, index: usize, value: JsValue) -> Option<JsValue> {
        self.slots.borrow_mut()[index] = value;
        self.remaining.set(self.remaining.get() - 1);
        if self.remaining.get() == 0 {
            Some(new_array(self.slots.borrow().clone()))
        } else {
            None
        }
    }
}

/// Promise.all: fulfills with every value in input order, or rejects with
/// the first rejection.
fn promise_all(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let inputs = match combinator_inputs(ctx, &args) {
        Ok(inputs) => inputs,
        Err(rejected) => return Ok(rejected),
    };
    let result = new_promise();
    if inputs.is_empty() {
        resolve_promise(ctx, &result, new_array(vec![]));
        return Ok(JsValue::Object(result));
    }
    let collector = Collector::new(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let (out, values) = (result.clone(), collector.clone());
        let on_fulfilled = BuiltInFn::closure(move |ctx, _this, args| {
            if let Some(all) = values.fill(index, arg(&args, 0)) {
                resolve_promise(ctx, &out, all);
            }
            Ok(JsValue::Undefined)
        });
        let out = result.clone();
        let on_rejected = BuiltInFn::closure(move |ctx, _this, args| {
            reject_promise(ctx, &out, arg(&args, 0));
            Ok(JsValue::Undefined)
        });
        then(ctx, input, native("", on_fulfilled), native("", on_rejected));
    }
    Ok(JsValue::Object(result))
}

fn settled_record(status: &str, key: &str, value: JsValue) -> JsValue {
    object_from_properties(vec![
        ("status".to_string(), JsValue::String(status.to_string())),
        (key.to_string(), value),
    ])
}

/// Promise.allSettled: always fulfills, with a `{status, value|reason}`
/// record per input.
fn promise_all_settled(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let inputs = match combinator_inputs(ctx, &args) {
        Ok(inputs) => inputs,
        Err(rejected) => return Ok(rejected),
    };
    let result = new_promise();
    if inputs.is_empty() {
        resolve_promise(ctx, &result, new_array(vec![]));
        return Ok(JsValue::Object(result));
    }
    let collector = Collector::new(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let handlers = [("fulfilled", "value"), ("rejected", "reason")].map(|(status, key)| {
            let (out, records) = (result.clone(), collector.clone());
            native(
                "",
                BuiltInFn::closure(move |ctx, _this, args| {
                    let record = settled_record(status, key, arg(&args, 0));
                    if let Some(all) = records.fill(index, record) {
                        resolve_promise(ctx, &out, all);
                    }
                    Ok(JsValue::Undefined)
                }),
            )
        });
        let [on_fulfilled, on_rejected] = handlers;
        then(ctx, input, on_fulfilled, on_rejected);
    }
    Ok(JsValue::Object(result))
}

/// Promise.race: settles like the first input to settle. An empty input
/// stays pending forever.
fn promise_race(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let inputs = match combinator_inputs(ctx, &args) {
        Ok(inputs) => inputs,
        Err(rejected) => return Ok(rejected),
    };
    let result = new_promise();
    let (resolve, reject) = resolving_functions(&result);
    for input in &inputs {
        then(ctx, input, resolve.clone(), reject.clone());
    }
    Ok(JsValue::Object(result))
}

/// Promise.any: fulfills with the first fulfillment, or rejects with an
/// `AggregateError` holding every reason once all inputs rejected.
fn promise_any(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let inputs = match combinator_inputs(ctx, &args) {
        Ok(inputs) => inputs,
        Err(rejected) => return Ok(rejected),
    };
    let result = new_promise();
    if inputs.is_empty() {
        reject_promise(ctx, &result, aggregate_error(vec![]));
        return Ok(JsValue::Object(result));
    }
    let collector = Collector::new(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let out = result.clone();
        let on_fulfilled = BuiltInFn::closure(move |ctx, _this, args| {
            resolve_promise(ctx, &out, arg(&args, 0));
            Ok(JsValue::Undefined)
        });
        let (out, reasons) = (result.clone(), collector.clone());
        let on_rejected = BuiltInFn::closure(move |ctx, _this, args| {
            if let Some(JsValue::Object(all)) = reasons.fill(index, arg(&args, 0)) {
                let errors = all.borrow().array_elements().cloned().unwrap_or_default();
                reject_promise(ctx, &out, aggregate_error(errors));
            }
            Ok(JsValue::Undefined)
        });
        then(ctx, input, native("", on_fulfilled), native("", on_rejected));
    }
    Ok(JsValue::Object(result))
}

fn aggregate_error(errors: Vec<JsValue>) -> JsValue {
    let error = new_error("AggregateError", "All promises were rejected");
    if let JsValue::Object(o) = &error {
        o.borrow_mut().define("errors", new_array(errors), false);
    }
    error
}
