//! Console built-in object.
//!
//! `console.log`, `console.info` and `console.debug` write to the normal
//! channel; `console.error` and `console.warn` write to the error channel.
//! The channels are [`ConsoleWriter`]s held by the realm's
//! [`ConsoleBindings`], so a host can redirect output without touching
//! process-wide state.

use std::io::Write;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

/// Destination of one console channel.
pub trait ConsoleWriter {
    fn write(&self, args: &[JsValue]);
}

/// The pair of console channels a realm writes to.
#[derive(Clone)]
pub struct ConsoleBindings {
    pub log: Rc<dyn ConsoleWriter>,
    pub error: Rc<dyn ConsoleWriter>,
}

impl ConsoleBindings {
    pub fn new(log: Rc<dyn ConsoleWriter>, error: Rc<dyn ConsoleWriter>) -> Self {
        ConsoleBindings { log, error }
    }

    /// Bindings writing to the process's stdout and stderr.
    pub fn host() -> Self {
        ConsoleBindings {
            log: Rc::new(StdoutWriter),
            error: Rc::new(StderrWriter),
        }
    }

    /// Whether both channels are the very same writers as `other`'s.
    pub fn same_as(&self, other: &ConsoleBindings) -> bool {
        Rc::ptr_eq(&self.log, &other.log) && Rc::ptr_eq(&self.error, &other.error)
    }
}

impl std::fmt::Debug for ConsoleBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleBindings")
            .field("log", &Rc::as_ptr(&self.log))
            .field("error", &Rc::as_ptr(&self.error))
            .finish()
    }
}

/// Join arguments the way `console.log` prints them: `String(arg)`, space separated.
pub fn format_args(args: &[JsValue]) -> String {
    args.iter().map(to_string).collect::<Vec<_>>().join(" ")
}

pub struct StdoutWriter;

impl ConsoleWriter for StdoutWriter {
    fn write(&self, args: &[JsValue]) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", format_args(args)) {
            tracing::warn!(error = %e, "failed to write console output");
        }
    }
}

pub struct StderrWriter;

impl ConsoleWriter for StderrWriter {
    fn write(&self, args: &[JsValue]) {
        let mut out = std::io::stderr().lock();
        if let Err(e) = writeln!(out, "{}", format_args(args)) {
            tracing::warn!(error = %e, "failed to write console output");
        }
    }
}

/// Register the console object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let console = BuiltInObject::new("console")
        .add_method("log", console_log)
        .add_method("info", console_log)
        .add_method("debug", console_log)
        .add_method("error", console_error)
        .add_method("warn", console_error);

    registry.register_object(console);
}

/// console.log - normal channel.
fn console_log(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let writer = ctx.console.log.clone();
    writer.write(&args);
    Ok(JsValue::Undefined)
}

/// console.error - error channel.
fn console_error(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let writer = ctx.console.error.clone();
    writer.write(&args);
    Ok(JsValue::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::new_array;

    #[test]
    fn test_format_args_uses_string_conversion() {
        let args = vec![
            JsValue::Number(1.0),
            JsValue::String("a".to_string()),
            JsValue::Boolean(true),
            JsValue::Undefined,
            new_array(vec![JsValue::Number(1.0), JsValue::Number(2.0)]),
        ];
        assert_eq!(format_args(&args), "1 a true undefined 1,2");
    }

    #[test]
    fn test_bindings_identity() {
        let a = ConsoleBindings::host();
        let b = a.clone();
        assert!(a.same_as(&b));
        assert!(!a.same_as(&ConsoleBindings::host()));
    }
}
