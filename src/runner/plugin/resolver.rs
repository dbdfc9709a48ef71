//! Plugin resolver trait for lazy resolution of super-global objects.
//!
//! Resolvers provide the objects (like `Math`, `console`) that are available
//! in the super-global scope. Objects are resolved lazily, only when script
//! code actually references them.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

/// A plugin resolver that can dynamically provide named objects.
///
/// Resolvers are queried in registration order when a name lookup reaches the
/// super-global scope. The first resolver that claims a name wins.
pub trait PluginResolver {
    /// Does this resolver provide a binding with the given name?
    ///
    /// This must be cheap and must NOT materialize the object.
    fn has_binding(&self, name: &str) -> bool;

    /// Materialize the object for the given name.
    ///
    /// Called only after `has_binding` returns `true`. The returned value is
    /// cached in the super-global environment, so this runs at most once per
    /// name per realm.
    fn resolve(&self, name: &str, ctx: &mut EvalContext) -> Result<JsValue, JErrorType>;

    /// Human-readable name for this resolver (for logging).
    fn name(&self) -> &str;
}
