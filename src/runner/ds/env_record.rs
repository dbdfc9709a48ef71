use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

pub type EnvRef = Rc<RefCell<EnvironmentRecord>>;

struct Binding {
    /// `None` while the binding is in its temporal dead zone.
    value: Option<JsValue>,
    mutable: bool,
}

/// One scope in the lexical environment chain.
pub struct EnvironmentRecord {
    bindings: HashMap<String, Binding>,
    outer: Option<EnvRef>,
    /// Set on the scope of a non-arrow function call.
    this_binding: Option<JsValue>,
    is_function_scope: bool,
}

impl EnvironmentRecord {
    pub fn new_global() -> EnvRef {
        Rc::new(RefCell::new(EnvironmentRecord {
            bindings: HashMap::new(),
            outer: None,
            this_binding: Some(JsValue::Undefined),
            is_function_scope: true,
        }))
    }

    pub fn new_declarative(outer: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(EnvironmentRecord {
            bindings: HashMap::new(),
            outer: Some(outer.clone()),
            this_binding: None,
            is_function_scope: false,
        }))
    }

    /// Scope of a function call. Arrow functions pass `None` so `this` is
    /// looked up in the enclosing scopes.
    pub fn new_function(outer: &EnvRef, this_binding: Option<JsValue>) -> EnvRef {
        Rc::new(RefCell::new(EnvironmentRecord {
            bindings: HashMap::new(),
            outer: Some(outer.clone()),
            this_binding,
            is_function_scope: true,
        }))
    }

    pub fn outer(&self) -> Option<EnvRef> {
        self.outer.clone()
    }

    pub fn is_function_scope(&self) -> bool {
        self.is_function_scope
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn create_mutable_binding(&mut self, name: &str) {
        self.bindings
            .entry(name.to_string())
            .or_insert(Binding {
                value: None,
                mutable: true,
            });
    }

    pub fn create_immutable_binding(&mut self, name: &str) {
        self.bindings
            .entry(name.to_string())
            .or_insert(Binding {
                value: None,
                mutable: false,
            });
    }

    /// Give a binding its first value, ending its dead zone.
    pub fn initialize_binding(&mut self, name: &str, value: JsValue) {
        if let Some(binding) = self.bindings.get_mut(name) {
            binding.value = Some(value);
        }
    }

    pub fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            Some(binding) if binding.value.is_none() => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            Some(binding) if !binding.mutable => Err(JErrorType::TypeError(
                "Assignment to constant variable.".to_string(),
            )),
            Some(binding) => {
                binding.value = Some(value);
                Ok(())
            }
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    pub fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        match self.bindings.get(name) {
            Some(Binding {
                value: Some(value), ..
            }) => Ok(value.clone()),
            Some(_) => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    pub fn this_binding(&self) -> Option<JsValue> {
        self.this_binding.clone()
    }

    /// Snapshot of the bindings, used to give each loop iteration its own scope.
    pub fn copy_for_iteration(&self) -> EnvRef {
        let bindings = self
            .bindings
            .iter()
            .map(|(k, b)| {
                (
                    k.clone(),
                    Binding {
                        value: b.value.clone(),
                        mutable: b.mutable,
                    },
                )
            })
            .collect();
        Rc::new(RefCell::new(EnvironmentRecord {
            bindings,
            outer: self.outer.clone(),
            this_binding: self.this_binding.clone(),
            is_function_scope: self.is_function_scope,
        }))
    }
}

/// The nearest scope in the chain starting at `env` that binds `name`.
pub fn find_binding_scope(env: &EnvRef, name: &str) -> Option<EnvRef> {
    let mut current = Some(env.clone());
    while let Some(e) = current {
        if e.borrow().has_binding(name) {
            return Some(e);
        }
        current = e.borrow().outer();
    }
    None
}

/// The nearest function scope (where `var` declarations live).
pub fn find_var_scope(env: &EnvRef) -> EnvRef {
    let mut current = env.clone();
    loop {
        let outer = {
            let record = current.borrow();
            if record.is_function_scope() {
                None
            } else {
                record.outer()
            }
        };
        match outer {
            Some(o) => current = o,
            None => return current,
        }
    }
}

/// Resolve `this` through the chain, skipping arrow function scopes.
pub fn resolve_this_binding(env: &EnvRef) -> JsValue {
    let mut current = Some(env.clone());
    while let Some(e) = current {
        if let Some(this) = e.borrow().this_binding() {
            return this;
        }
        current = e.borrow().outer();
    }
    JsValue::Undefined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_let_binding_dead_zone() {
        let global = EnvironmentRecord::new_global();
        global.borrow_mut().create_mutable_binding("x");
        let err = global.borrow().get_binding_value("x").unwrap_err();
        assert_eq!(err.message(), "Cannot access 'x' before initialization");
        global
            .borrow_mut()
            .initialize_binding("x", JsValue::Number(1.0));
        assert_eq!(
            global.borrow().get_binding_value("x").unwrap(),
            JsValue::Number(1.0)
        );
    }

    #[test]
    fn test_const_binding_rejects_assignment() {
        let global = EnvironmentRecord::new_global();
        global.borrow_mut().create_immutable_binding("c");
        global
            .borrow_mut()
            .initialize_binding("c", JsValue::Number(1.0));
        let err = global
            .borrow_mut()
            .set_mutable_binding("c", JsValue::Number(2.0))
            .unwrap_err();
        assert!(matches!(err, JErrorType::TypeError(_)));
    }

    #[test]
    fn test_lookup_walks_outer_scopes() {
        let global = EnvironmentRecord::new_global();
        global.borrow_mut().create_mutable_binding("a");
        let function = EnvironmentRecord::new_function(&global, Some(JsValue::Null));
        let block = EnvironmentRecord::new_declarative(&function);
        assert!(Rc::ptr_eq(&find_binding_scope(&block, "a").unwrap(), &global));
        assert!(find_binding_scope(&block, "missing").is_none());
        assert!(Rc::ptr_eq(&find_var_scope(&block), &function));
        assert_eq!(resolve_this_binding(&block), JsValue::Null);
    }
}
