//! Core types for the plugin architecture.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::env_record::{
    find_binding_scope, find_var_scope, EnvRef, EnvironmentRecord,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::new_native_function;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::core_resolver::CorePluginResolver;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::super_global::SuperGlobalEnvironment;
use crate::runner::std_lib::console::ConsoleBindings;

pub type SharedSuperGlobal = Rc<RefCell<SuperGlobalEnvironment>>;

/// Deepest call nesting a realm supports. Evaluation grows its native stack
/// on demand, so this bounds heap use rather than the thread's stack.
pub const MAX_CALL_DEPTH_LIMIT: usize = 10_000;

/// Bounds on a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub max_call_depth: usize,
    /// `None` means unlimited.
    pub max_steps: Option<u64>,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        ExecutionLimits {
            max_call_depth: 1000,
            max_steps: None,
        }
    }
}

impl ExecutionLimits {
    /// Why these limits cannot be honored, if they cannot.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_call_depth == 0 || self.max_call_depth > MAX_CALL_DEPTH_LIMIT {
            return Err(format!(
                "max_call_depth must be between 1 and {}, got {}",
                MAX_CALL_DEPTH_LIMIT, self.max_call_depth
            ));
        }
        if self.max_steps == Some(0) {
            return Err("max_steps must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Promise reactions and `queueMicrotask`.
    Microtask,
    /// `setTimeout` / `setInterval` callbacks.
    Macrotask { timer_id: u32, delay_ms: u32 },
}

/// Deferred work scheduled by a script.
pub struct Job {
    pub kind: JobKind,
    pub callback: JsValue,
    pub args: Vec<JsValue>,
}

/// Execution context passed to native functions: one realm.
pub struct EvalContext {
    /// Scope of the code currently running.
    pub lex_env: EnvRef,
    global_env: EnvRef,
    super_global: SharedSuperGlobal,
    registry: Rc<BuiltInRegistry>,
    /// Writers behind `console.*`.
    pub console: ConsoleBindings,
    jobs: Vec<Job>,
    next_timer_id: u32,
    /// Materialized instance methods, so `[].map === [].map`.
    method_cache: HashMap<(String, String), JsValue>,
    limits: ExecutionLimits,
    call_depth: usize,
    steps: u64,
}

impl EvalContext {
    /// A fresh realm whose globals come from `registry`.
    pub fn new(
        registry: Rc<BuiltInRegistry>,
        console: ConsoleBindings,
        limits: ExecutionLimits,
    ) -> Self {
        let global_env = EnvironmentRecord::new_global();
        {
            let mut global = global_env.borrow_mut();
            for (name, value) in [
                ("undefined", JsValue::Undefined),
                ("NaN", JsValue::Number(f64::NAN)),
                ("Infinity", JsValue::Number(f64::INFINITY)),
            ] {
                global.create_immutable_binding(name);
                global.initialize_binding(name, value);
            }
        }
        let mut super_global = SuperGlobalEnvironment::new();
        super_global.add_resolver(Box::new(CorePluginResolver::new(registry.clone())));
        EvalContext {
            lex_env: global_env.clone(),
            global_env,
            super_global: Rc::new(RefCell::new(super_global)),
            registry,
            console,
            jobs: vec![],
            next_timer_id: 1,
            method_cache: HashMap::new(),
            limits,
            call_depth: 0,
            steps: 0,
        }
    }

    /// Register an extra resolver for names not provided by the core built-ins.
    pub fn add_resolver(&mut self, resolver: Box<dyn PluginResolver>) {
        self.super_global.borrow_mut().add_resolver(resolver);
    }

    pub fn registry(&self) -> &Rc<BuiltInRegistry> {
        &self.registry
    }

    pub fn global_env(&self) -> &EnvRef {
        &self.global_env
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    /// The built-in instance method `name` for values of `class`, falling back
    /// to the `Object` methods.
    pub fn prototype_method(&mut self, class: &str, name: &str) -> Option<JsValue> {
        let key = (class.to_string(), name.to_string());
        if let Some(f) = self.method_cache.get(&key) {
            return Some(f.clone());
        }
        let func = self
            .registry
            .get_prototype_method(class, name)
            .or_else(|| self.registry.get_prototype_method("Object", name))?
            .clone();
        let value = new_native_function(name, func, false);
        self.method_cache.insert(key, value.clone());
        Some(value)
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Read an identifier: lexical chain first, then the super-global scope.
    pub fn get_binding(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        if let Some(scope) = find_binding_scope(&self.lex_env, name) {
            return scope.borrow().get_binding_value(name);
        }
        let super_global = self.super_global.clone();
        let value = super_global.borrow_mut().resolve_binding(name, self);
        value
    }

    /// Whether `name` resolves at all (`typeof undeclared` must not throw).
    pub fn has_binding(&self, name: &str) -> bool {
        find_binding_scope(&self.lex_env, name).is_some()
            || self.super_global.borrow().has_name(name)
    }

    /// Assign to an existing binding.
    pub fn set_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match find_binding_scope(&self.lex_env, name) {
            Some(scope) => scope.borrow_mut().set_mutable_binding(name, value),
            None if self.super_global.borrow().has_name(name) => {
                // Built-in globals can be shadowed but not modified.
                let mut global = self.global_env.borrow_mut();
                global.create_mutable_binding(name);
                global.initialize_binding(name, value);
                Ok(())
            }
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    /// Create and initialize a `let`/`const` binding in the current scope,
    /// unless it was already created (hoisted into its dead zone).
    pub fn initialize_lexical_binding(&mut self, name: &str, value: JsValue, is_const: bool) {
        let mut env = self.lex_env.borrow_mut();
        if !env.has_binding(name) {
            if is_const {
                env.create_immutable_binding(name);
            } else {
                env.create_mutable_binding(name);
            }
        }
        env.initialize_binding(name, value);
    }

    /// Assign a `var` binding in the nearest function scope.
    pub fn set_var_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        let var_scope = find_var_scope(&self.lex_env);
        let mut scope = var_scope.borrow_mut();
        if !scope.has_binding(name) {
            scope.create_mutable_binding(name);
            scope.initialize_binding(name, value);
            Ok(())
        } else {
            drop(scope);
            // A `let` in an inner block can shadow the var; assign through the chain.
            self.set_binding(name, value)
        }
    }

    /// Run `f` with a fresh block scope pushed, restoring the previous scope on
    /// every exit path.
    pub fn with_block_scope<T>(
        &mut self,
        f: impl FnOnce(&mut EvalContext) -> Result<T, JErrorType>,
    ) -> Result<T, JErrorType> {
        let saved = self.lex_env.clone();
        self.lex_env = EnvironmentRecord::new_declarative(&saved);
        let result = f(self);
        self.lex_env = saved;
        result
    }

    /// Run `f` with `env` as the current scope.
    pub fn with_scope<T>(
        &mut self,
        env: EnvRef,
        f: impl FnOnce(&mut EvalContext) -> Result<T, JErrorType>,
    ) -> Result<T, JErrorType> {
        let saved = std::mem::replace(&mut self.lex_env, env);
        let result = f(self);
        self.lex_env = saved;
        result
    }

    // ------------------------------------------------------------------
    // Limits
    // ------------------------------------------------------------------

    /// Count one evaluation step against the optional budget.
    pub fn tick(&mut self) -> Result<(), JErrorType> {
        self.steps += 1;
        match self.limits.max_steps {
            Some(max) if self.steps > max => Err(JErrorType::Halted(
                "Execution step budget exhausted".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn enter_call(&mut self) -> Result<(), JErrorType> {
        if self.call_depth >= self.limits.max_call_depth.min(MAX_CALL_DEPTH_LIMIT) {
            return Err(JErrorType::RangeError(
                "Maximum call stack size exceeded".to_string(),
            ));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn leave_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    // ------------------------------------------------------------------
    // Deferred work
    // ------------------------------------------------------------------

    pub fn enqueue_microtask(&mut self, callback: JsValue, args: Vec<JsValue>) {
        self.jobs.push(Job {
            kind: JobKind::Microtask,
            callback,
            args,
        });
    }

    /// Queue a timer callback and return its id.
    pub fn enqueue_timer(&mut self, callback: JsValue, delay_ms: u32, args: Vec<JsValue>) -> u32 {
        let timer_id = self.next_timer_id;
        self.next_timer_id += 1;
        self.jobs.push(Job {
            kind: JobKind::Macrotask { timer_id, delay_ms },
            callback,
            args,
        });
        timer_id
    }

    /// Drop a queued timer. Unknown ids are ignored.
    pub fn cancel_timer(&mut self, id: u32) {
        self.jobs
            .retain(|job| !matches!(job.kind, JobKind::Macrotask { timer_id, .. } if timer_id == id));
    }

    pub fn pending_jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Remove and return everything still queued.
    pub fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.jobs)
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType>;

pub type PluginFn = dyn Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType>;

/// Built-in function - either compiled-in or a closure created at runtime
/// (such as the `resolve`/`reject` pair handed to a promise executor).
#[derive(Clone)]
pub enum BuiltInFn {
    /// Direct function pointer - zero overhead for compiled-in functions.
    Native(NativeFn),

    /// Closure with captured state.
    Plugin(Rc<PluginFn>),
}

impl BuiltInFn {
    /// Execute this built-in function.
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Plugin(f) => f(ctx, this, args),
        }
    }

    pub fn closure(
        f: impl Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType> + 'static,
    ) -> Self {
        BuiltInFn::Plugin(Rc::new(f))
    }
}

/// Built-in object definition.
/// Represents a JavaScript built-in object like Array, Object, String, etc.
pub struct BuiltInObject {
    /// Name of the object (e.g., "Array", "Object", "Math").
    pub name: String,

    /// Parent prototype name, if any (e.g., "Object" for most built-ins).
    pub prototype: Option<String>,

    /// Static methods (`Array.isArray`).
    pub methods: HashMap<String, BuiltInFn>,

    /// Methods shared by instances (`[].map`).
    pub prototype_methods: HashMap<String, BuiltInFn>,

    /// Static properties.
    pub properties: HashMap<String, JsValue>,

    /// Call behavior, if the global is itself a function (`Array(3)`, `parseInt(x)`).
    pub constructor: Option<BuiltInFn>,

    /// Whether `new` may be applied to the global.
    pub constructible: bool,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            prototype: Some("Object".to_string()),
            methods: HashMap::new(),
            prototype_methods: HashMap::new(),
            properties: HashMap::new(),
            constructor: None,
            constructible: false,
        }
    }

    /// Set the prototype chain parent.
    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }

    /// Set no prototype (for objects like Object.prototype itself).
    pub fn with_no_prototype(mut self) -> Self {
        self.prototype = None;
        self
    }

    /// Add a native static method.
    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.insert(name.into(), BuiltInFn::Native(func));
        self
    }

    /// Add a native instance method.
    pub fn add_prototype_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.prototype_methods
            .insert(name.into(), BuiltInFn::Native(func));
        self
    }

    /// Add a property.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Set the constructor function.
    pub fn with_constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some(BuiltInFn::Native(constructor));
        self.constructible = true;
        self
    }

    /// Make the global a plain function (`parseInt`, `setTimeout`).
    pub fn with_function(mut self, func: NativeFn) -> Self {
        self.constructor = Some(BuiltInFn::Native(func));
        self.constructible = false;
        self
    }
}
