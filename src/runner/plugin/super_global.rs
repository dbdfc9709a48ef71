//! Super-global environment: the bottom of the scope chain.
//!
//! This environment sits below the global scope and lazily resolves
//! built-in objects on first access. Objects are cached after first
//! resolution, so within one realm `Math === Math` holds and each name is
//! materialized at most once.
//!
//! ```text
//! script: Math.abs(-5)
//!      ↓
//! 1. Check local scope → not found
//! 2. Check outer scopes → not found
//! 3. Check global scope → not found
//! 4. Check super-global → "Math" found
//!      ↓
//! 5. Query resolvers: does anyone provide "Math"?
//! 6. CorePluginResolver says "yes", materializes it
//! 7. Cache the result
//! ```

use std::collections::HashMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::EvalContext;

/// The super-global environment for lazy resolution of built-in objects.
///
/// Script code cannot create or modify super-global bindings. Assigning to a
/// built-in name creates a global binding that shadows it instead.
pub struct SuperGlobalEnvironment {
    /// Registered plugin resolvers, queried in order.
    resolvers: Vec<Box<dyn PluginResolver>>,
    /// Already-resolved bindings (name → value).
    cache: HashMap<String, JsValue>,
}

impl SuperGlobalEnvironment {
    pub fn new() -> Self {
        SuperGlobalEnvironment {
            resolvers: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Register a plugin resolver. Resolvers are queried in registration order.
    pub fn add_resolver(&mut self, resolver: Box<dyn PluginResolver>) {
        self.resolvers.push(resolver);
    }

    fn find_resolver(&self, name: &str) -> Option<&dyn PluginResolver> {
        self.resolvers
            .iter()
            .find(|r| r.has_binding(name))
            .map(|r| r.as_ref())
    }

    /// Check if any resolver provides the given name.
    pub fn has_name(&self, name: &str) -> bool {
        self.cache.contains_key(name) || self.find_resolver(name).is_some()
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Resolve a name, caching the result.
    pub fn resolve_binding(
        &mut self,
        name: &str,
        ctx: &mut EvalContext,
    ) -> Result<JsValue, JErrorType> {
        if let Some(val) = self.cache.get(name) {
            return Ok(val.clone());
        }
        let resolver = self
            .find_resolver(name)
            .ok_or_else(|| JErrorType::ReferenceError(format!("{} is not defined", name)))?;
        tracing::trace!(name, resolver = resolver.name(), "materializing built-in");
        let value = resolver.resolve(name, ctx)?;
        self.cache.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Get a reference to the resolvers (for inspection/testing).
    pub fn resolvers(&self) -> &[Box<dyn PluginResolver>] {
        &self.resolvers
    }
}

impl Default for SuperGlobalEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
