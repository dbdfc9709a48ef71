//! Core plugin resolver: exposes the `BuiltInRegistry` through the
//! super-global scope.

use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{new_native_function, new_object};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::EvalContext;

/// Wraps a shared `BuiltInRegistry` as a `PluginResolver`.
///
/// A built-in with call behavior (`Array`, `parseInt`) is materialized as a
/// native function object, anything else (`Math`, `console`) as an ordinary
/// object. Static methods and properties are attached as non-enumerable
/// properties. Instance methods stay in the registry and are found by
/// property lookup.
pub struct CorePluginResolver {
    registry: Rc<BuiltInRegistry>,
}

impl CorePluginResolver {
    pub fn new(registry: Rc<BuiltInRegistry>) -> Self {
        CorePluginResolver { registry }
    }

    pub fn registry(&self) -> &BuiltInRegistry {
        &self.registry
    }
}

impl PluginResolver for CorePluginResolver {
    fn has_binding(&self, name: &str) -> bool {
        self.registry.has_object(name)
    }

    fn resolve(&self, name: &str, _ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
        let builtin = self
            .registry
            .get_object(name)
            .ok_or_else(|| JErrorType::ReferenceError(format!("{} is not defined", name)))?;

        let value = match &builtin.constructor {
            Some(ctor) => new_native_function(name, ctor.clone(), builtin.constructible),
            None => new_object(),
        };
        if let JsValue::Object(obj) = &value {
            let mut obj = obj.borrow_mut();
            for (method_name, func) in &builtin.methods {
                obj.define(
                    method_name,
                    new_native_function(method_name, func.clone(), false),
                    false,
                );
            }
            for (prop_name, prop_value) in &builtin.properties {
                obj.define(prop_name, prop_value.clone(), false);
            }
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "core"
    }
}
