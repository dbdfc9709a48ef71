//! Built-in registry for managing built-in objects.

use std::collections::HashMap;

use super::types::{BuiltInFn, BuiltInObject};
use crate::runner::std_lib::register_core_builtins;

/// Registry for built-in objects.
/// Holds every built-in object with its static members, instance methods and
/// call behavior. One registry is shared by all realms an executor creates.
pub struct BuiltInRegistry {
    objects: HashMap<String, BuiltInObject>,
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: HashMap::new(),
        }
    }

    /// Create a registry with the core built-ins.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        tracing::trace!(objects = registry.objects.len(), "core built-ins registered");
        registry
    }

    /// Register a built-in object (programmatic API).
    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.insert(obj.name.clone(), obj);
    }

    /// Get a registered object by name.
    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.objects.get(name)
    }

    /// Get a static method.
    pub fn get_method(&self, object: &str, method: &str) -> Option<&BuiltInFn> {
        self.objects
            .get(object)
            .and_then(|obj| obj.methods.get(method))
    }

    /// Get an instance method of `class`, following the `prototype` parents
    /// (`TypeError` -> `Error` -> `Object`).
    pub fn get_prototype_method(&self, class: &str, method: &str) -> Option<&BuiltInFn> {
        let mut current = self.objects.get(class);
        while let Some(obj) = current {
            if let Some(f) = obj.prototype_methods.get(method) {
                return Some(f);
            }
            current = obj
                .prototype
                .as_ref()
                .filter(|parent| *parent != &obj.name)
                .and_then(|parent| self.objects.get(parent));
        }
        None
    }

    /// Check if an object exists in the registry.
    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Whether `class` is `ancestor` or inherits from it.
    pub fn inherits_from(&self, class: &str, ancestor: &str) -> bool {
        let mut current = Some(class);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self
                .objects
                .get(name)
                .and_then(|obj| obj.prototype.as_deref())
                .filter(|parent| *parent != name);
        }
        false
    }
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_registry_provides_globals() {
        let registry = BuiltInRegistry::with_core();
        for name in ["console", "Math", "JSON", "Array", "Promise", "setTimeout"] {
            assert!(registry.has_object(name), "missing {}", name);
        }
    }

    #[test]
    fn test_prototype_methods_follow_parents() {
        let registry = BuiltInRegistry::with_core();
        assert!(registry.get_prototype_method("Array", "map").is_some());
        assert!(registry
            .get_prototype_method("Array", "hasOwnProperty")
            .is_some());
        assert!(registry.get_prototype_method("Array", "nope").is_none());
        assert!(registry.inherits_from("TypeError", "Error"));
        assert!(!registry.inherits_from("Error", "TypeError"));
    }
}
