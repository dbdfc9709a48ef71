//! Standard library built-in objects.
//!
//! Implementations of the built-ins a snippet can reach: console, Object,
//! Function, Array, String, Number, BigInt, Symbol, Math, JSON, the Error
//! constructors, Promise and the timer functions.

pub mod array;
pub mod bigint;
pub mod console;
pub mod core;
pub mod error;
pub mod function;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod promise;
pub mod string;
pub mod symbol;
pub mod timers;

pub use self::core::register_core_builtins;

use crate::runner::ds::value::JsValue;

/// The `i`th argument, `undefined` when absent.
pub(crate) fn arg(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}
