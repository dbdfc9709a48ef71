//! Built-in objects and the super-global scope.
//!
//! Built-ins are registered once into a [`BuiltInRegistry`] and materialized
//! lazily into each realm through the super-global scope, which sits outside
//! the normal lexical environment chain:
//!
//! ```text
//! Variable Lookup Order:
//! 1. Local scope (function/block)
//! 2. Outer scopes (lexical chain)
//! 3. Global scope
//! 4. Super-global scope ← built-ins live here
//! ```
//!
//! - **[`PluginResolver`]**: trait for providing objects dynamically
//! - **[`SuperGlobalEnvironment`]**: resolvers plus a per-realm cache
//! - **[`CorePluginResolver`]**: adapter wrapping [`BuiltInRegistry`] as a resolver
//! - **[`EvalContext`]**: execution context with super-global integration
//!
//! Local variables may shadow built-ins, and assigning to a built-in name
//! creates a global binding rather than modifying the registry. Instance
//! methods (`[].map`, `"a".toUpperCase`) are not copied into objects; property
//! lookup falls back to the registry by the value's class.
//!
//! ## Example: custom resolver
//!
//! ```
//! use std::rc::Rc;
//! use jsprimer::runner::ds::error::JErrorType;
//! use jsprimer::runner::ds::value::JsValue;
//! use jsprimer::runner::plugin::registry::BuiltInRegistry;
//! use jsprimer::runner::plugin::resolver::PluginResolver;
//! use jsprimer::runner::plugin::types::{EvalContext, ExecutionLimits};
//! use jsprimer::runner::std_lib::console::ConsoleBindings;
//!
//! struct Answer;
//!
//! impl PluginResolver for Answer {
//!     fn has_binding(&self, name: &str) -> bool {
//!         name == "ANSWER"
//!     }
//!
//!     fn resolve(&self, _name: &str, _ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
//!         Ok(JsValue::Number(42.0))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "answer"
//!     }
//! }
//!
//! let mut ctx = EvalContext::new(
//!     Rc::new(BuiltInRegistry::with_core()),
//!     ConsoleBindings::host(),
//!     ExecutionLimits::default(),
//! );
//! ctx.add_resolver(Box::new(Answer));
//! assert_eq!(ctx.get_binding("ANSWER").unwrap(), JsValue::Number(42.0));
//! ```

pub mod core_resolver;
pub mod registry;
pub mod resolver;
pub mod super_global;
pub mod types;

pub use core_resolver::CorePluginResolver;
pub use registry::BuiltInRegistry;
pub use resolver::PluginResolver;
pub use super_global::SuperGlobalEnvironment;
pub use types::{BuiltInFn, BuiltInObject, EvalContext, ExecutionLimits, NativeFn};
