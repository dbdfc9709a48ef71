//! Function objects: instantiation, calls, construction and binding of
//! parameters and destructuring patterns.

use std::cell::RefCell;
use std::rc::Rc;

use crate::parser::ast::{
    FunctionBodyOrExpression, FunctionData, PatternElement, PatternType, PropertyKey,
    StatementType,
};
use crate::parser::ensure_stack;
use crate::parser::static_semantics::{function_declarations, lexically_declared_names};
use crate::runner::ds::env_record::{EnvRef, EnvironmentRecord};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{
    new_array, new_promise, new_script_function, object_from_properties, to_property_key,
    FunctionKind, JsObject, ObjectKind,
};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::{BuiltInFn, EvalContext};
use crate::runner::std_lib::promise::{reject_promise, resolve_promise};

use super::expression::{
    evaluate_expression, evaluate_named, get_property, iterate_values, own_enumerable_entries,
};
use super::statement::{error_to_js_value, execute_statement};
use super::types::{CompletionType, ValueResult};

/// How a pattern's identifiers receive their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Parameter,
    /// Destructuring assignment to existing bindings.
    Assignment,
}

/// Create a closure over the current scope. A named function expression sees
/// its own name in an intermediate scope.
pub fn instantiate_function(
    data: &Rc<FunctionData>,
    ctx: &mut EvalContext,
    name: Option<&str>,
) -> JsValue {
    match &data.id {
        Some(id) if !data.is_arrow && !data.is_declaration => {
            let env = EnvironmentRecord::new_declarative(&ctx.lex_env);
            let f = new_script_function(data.clone(), env.clone(), name);
            let mut record = env.borrow_mut();
            record.create_immutable_binding(id);
            record.initialize_binding(id, f.clone());
            f
        }
        _ => new_script_function(data.clone(), ctx.lex_env.clone(), name),
    }
}

enum CallTarget {
    Native(BuiltInFn),
    Script(Rc<FunctionData>, EnvRef),
}

fn call_target(func: &JsValue) -> Option<CallTarget> {
    let obj = func.as_object()?.borrow();
    let target = match &obj.kind {
        ObjectKind::Function(FunctionKind::Native(n)) => CallTarget::Native(n.func.clone()),
        ObjectKind::Function(FunctionKind::Script(s)) => {
            CallTarget::Script(s.data.clone(), s.env.clone())
        }
        _ => return None,
    };
    Some(target)
}

/// `func.call(this, ...args)`.
pub fn call_function(
    func: &JsValue,
    this: JsValue,
    args: Vec<JsValue>,
    ctx: &mut EvalContext,
) -> ValueResult {
    let target = call_target(func).ok_or_else(|| {
        JErrorType::TypeError(format!("{} is not a function", describe_value(func)))
    })?;
    ctx.enter_call()?;
    let result = ensure_stack(|| match target {
        CallTarget::Native(f) => f.call(ctx, this, args),
        CallTarget::Script(data, env) if data.is_async => {
            call_async_function(&data, env, this, args, ctx)
        }
        CallTarget::Script(data, env) => call_script_function(&data, env, this, args, ctx),
    });
    ctx.leave_call();
    result
}

/// Run an async function body up to its first `await` and return the promise
/// for its result. A body parked at an `await` leaves the promise pending.
fn call_async_function(
    data: &Rc<FunctionData>,
    closure_env: EnvRef,
    this: JsValue,
    args: Vec<JsValue>,
    ctx: &mut EvalContext,
) -> ValueResult {
    let promise = new_promise();
    match call_script_function(data, closure_env, this, args, ctx) {
        Ok(value) => resolve_promise(ctx, &promise, value),
        Err(JErrorType::Suspended) => {}
        Err(e) if e.is_catchable() => reject_promise(ctx, &promise, error_to_js_value(&e)),
        Err(e) => return Err(e),
    }
    Ok(JsValue::Object(promise))
}

fn call_script_function(
    data: &Rc<FunctionData>,
    closure_env: EnvRef,
    this: JsValue,
    args: Vec<JsValue>,
    ctx: &mut EvalContext,
) -> ValueResult {
    let this_binding = if data.is_arrow { None } else { Some(this) };
    let env = EnvironmentRecord::new_function(&closure_env, this_binding);
    ctx.with_scope(env, |ctx| {
        if !data.is_arrow {
            let arguments = arguments_object(&args);
            bind_identifier("arguments", arguments, BindingKind::Parameter, ctx)?;
        }
        bind_parameters(data, args, ctx)?;
        match &data.body {
            FunctionBodyOrExpression::Expression(expr) => evaluate_expression(expr, ctx),
            FunctionBodyOrExpression::FunctionBody(body) => {
                hoist_var_names(&data.var_names, ctx);
                instantiate_block_declarations(body, ctx);
                for statement in body {
                    let completion = execute_statement(statement, ctx)?;
                    if completion.completion_type == CompletionType::Return {
                        return Ok(completion.get_value());
                    }
                }
                Ok(JsValue::Undefined)
            }
        }
    })
}

fn arguments_object(args: &[JsValue]) -> JsValue {
    let arguments = object_from_properties(
        args.iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
    );
    if let JsValue::Object(o) = &arguments {
        o.borrow_mut()
            .define("length", JsValue::Number(args.len() as f64), false);
    }
    arguments
}

fn bind_parameters(
    data: &FunctionData,
    args: Vec<JsValue>,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    let mut args = args.into_iter();
    for param in &data.params {
        let value = args.next().unwrap_or(JsValue::Undefined);
        bind_element(param, value, BindingKind::Parameter, ctx)?;
    }
    if let Some(rest) = &data.rest {
        let remaining: Vec<JsValue> = args.collect();
        bind_pattern(rest, new_array(remaining), BindingKind::Parameter, ctx)?;
    }
    Ok(())
}

/// `var` names start out `undefined` in the function scope.
fn hoist_var_names(names: &[String], ctx: &mut EvalContext) {
    let mut env = ctx.lex_env.borrow_mut();
    for name in names {
        if !env.has_binding(name) {
            env.create_mutable_binding(name);
            env.initialize_binding(name, JsValue::Undefined);
        }
    }
}

/// Enter a statement list: `let`/`const` names go into their dead zone and
/// function declarations are instantiated up front.
pub fn instantiate_block_declarations(body: &[StatementType], ctx: &mut EvalContext) {
    {
        let mut env = ctx.lex_env.borrow_mut();
        for decl in lexically_declared_names(body) {
            if decl.is_const {
                env.create_immutable_binding(&decl.name);
            } else {
                env.create_mutable_binding(&decl.name);
            }
        }
    }
    for data in function_declarations(body) {
        let f = instantiate_function(&data, ctx, None);
        if let Some(id) = &data.id {
            let mut env = ctx.lex_env.borrow_mut();
            env.create_mutable_binding(id);
            env.initialize_binding(id, f);
        }
    }
}

/// `new func(...args)`.
pub fn construct(func: &JsValue, args: Vec<JsValue>, ctx: &mut EvalContext) -> ValueResult {
    let not_a_constructor =
        || JErrorType::TypeError(format!("{} is not a constructor", describe_value(func)));
    let is_script = match func.as_object().map(|o| o.borrow()) {
        Some(obj) => match &obj.kind {
            ObjectKind::Function(FunctionKind::Native(n)) if n.is_constructor => false,
            ObjectKind::Function(FunctionKind::Script(s))
                if !s.data.is_arrow && !s.data.is_async =>
            {
                true
            }
            _ => return Err(not_a_constructor()),
        },
        None => return Err(not_a_constructor()),
    };
    if !is_script {
        return call_function(func, JsValue::Undefined, args, ctx);
    }

    let prototype = get_property(func, "prototype", ctx)?;
    let mut instance = JsObject::new(ObjectKind::Ordinary);
    instance.prototype = prototype.as_object().cloned();
    let instance = JsValue::Object(Rc::new(RefCell::new(instance)));
    let result = call_function(func, instance.clone(), args, ctx)?;
    Ok(match result {
        JsValue::Object(_) => result,
        _ => instance,
    })
}

/// Bind `value` to `pattern`.
pub fn bind_pattern(
    pattern: &PatternType,
    value: JsValue,
    kind: BindingKind,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    match pattern {
        PatternType::Identifier(name) => bind_identifier(name, value, kind, ctx),
        PatternType::ArrayPattern { elements, rest } => {
            let items = iterate_values(&value)?;
            for (i, element) in elements.iter().enumerate() {
                if let Some(element) = element {
                    let v = items.get(i).cloned().unwrap_or(JsValue::Undefined);
                    bind_element(element, v, kind, ctx)?;
                }
            }
            if let Some(rest) = rest {
                let remaining = items.into_iter().skip(elements.len()).collect();
                bind_pattern(rest, new_array(remaining), kind, ctx)?;
            }
            Ok(())
        }
        PatternType::ObjectPattern { properties, rest } => {
            if value.is_nullish() {
                return Err(JErrorType::TypeError(format!(
                    "Cannot destructure '{}' as it is {}.",
                    value, value
                )));
            }
            let mut used_keys = vec![];
            for property in properties {
                let key = match &property.key {
                    PropertyKey::Static(name) => name.clone(),
                    PropertyKey::Computed(expr) => {
                        to_property_key(&evaluate_expression(expr, ctx)?)
                    }
                };
                let v = get_property(&value, &key, ctx)?;
                used_keys.push(key);
                bind_element(&property.value, v, kind, ctx)?;
            }
            if let Some(rest) = rest {
                let remaining = own_enumerable_entries(&value)
                    .into_iter()
                    .filter(|(k, _)| !used_keys.contains(k))
                    .collect();
                bind_pattern(rest, object_from_properties(remaining), kind, ctx)?;
            }
            Ok(())
        }
    }
}

fn bind_element(
    element: &PatternElement,
    value: JsValue,
    kind: BindingKind,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    let value = match (&value, &element.default) {
        (JsValue::Undefined, Some(default)) => match &element.target {
            PatternType::Identifier(name) => evaluate_named(default, name, ctx)?,
            _ => evaluate_expression(default, ctx)?,
        },
        _ => value,
    };
    bind_pattern(&element.target, value, kind, ctx)
}

fn bind_identifier(
    name: &str,
    value: JsValue,
    kind: BindingKind,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    match kind {
        BindingKind::Var => ctx.set_var_binding(name, value),
        BindingKind::Let => {
            ctx.initialize_lexical_binding(name, value, false);
            Ok(())
        }
        BindingKind::Const => {
            ctx.initialize_lexical_binding(name, value, true);
            Ok(())
        }
        BindingKind::Parameter => {
            let mut env = ctx.lex_env.borrow_mut();
            env.create_mutable_binding(name);
            env.initialize_binding(name, value);
            Ok(())
        }
        BindingKind::Assignment => ctx.set_binding(name, value),
    }
}

/// Short description of a value for error messages.
pub fn describe_value(value: &JsValue) -> String {
    match value {
        JsValue::String(s) => format!("\"{}\"", s),
        JsValue::Object(o) => {
            let obj = o.borrow();
            match &obj.kind {
                ObjectKind::Function(_) => match obj.get_own("name") {
                    Some(JsValue::String(name)) if !name.is_empty() => name,
                    _ => "anonymous".to_string(),
                },
                _ => "object".to_string(),
            }
        }
        other => other.to_string(),
    }
}
