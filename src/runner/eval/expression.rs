//! Expression evaluation.
//!
//! Evaluates every expression form of the AST, plus the property access
//! helpers (`get_property`, `set_property`) the built-in library shares.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::parser::ast::{
    AssignmentOperator, AssignmentTarget, BinaryOperator, ExpressionOrSpreadElement,
    ExpressionType, LiteralType, LogicalOperator, MemberProperty, PropertyData, PropertyKey,
    UnaryOperator, UpdateOperator,
};
use crate::parser::ensure_stack;
use crate::runner::ds::env_record::resolve_this_binding;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{
    array_index, check_array_length, lookup_property, new_array, new_object, to_property_key,
    FunctionKind, JsObject, ObjectKind,
};
use crate::runner::ds::operations::test_and_comparison::{
    is_callable, loose_equality, strict_equality,
};
use crate::runner::ds::operations::type_conversion::{
    get_type, to_boolean, to_number, to_string, to_string_implicit,
};
use crate::runner::ds::value::{check_string_length, JsObjectType, JsValue};
use crate::runner::plugin::types::EvalContext;
use crate::runner::std_lib::promise::await_value;
use crate::runner::std_lib::string::utf16_char_at;

use super::function::{
    bind_pattern, call_function, construct, describe_value, instantiate_function, BindingKind,
};
use super::types::ValueResult;

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    ensure_stack(|| evaluate_expression_kind(expr, ctx))
}

fn evaluate_expression_kind(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

        ExpressionType::TemplateLiteral {
            quasis,
            expressions,
        } => evaluate_template_literal(quasis, expressions, ctx),

        ExpressionType::Identifier(name) => ctx.get_binding(name),

        ExpressionType::ThisExpression => Ok(resolve_this_binding(&ctx.lex_env)),

        ExpressionType::ArrayExpression(elements) => evaluate_array_expression(elements, ctx),

        ExpressionType::ObjectExpression(properties) => {
            evaluate_object_expression(properties, ctx)
        }

        ExpressionType::FunctionExpression(data) => Ok(instantiate_function(data, ctx, None)),

        ExpressionType::UnaryExpression { operator, argument } => {
            evaluate_unary_expression(*operator, argument, ctx)
        }

        ExpressionType::AwaitExpression(argument) => {
            let value = evaluate_expression(argument, ctx)?;
            await_value(ctx, value);
            Err(JErrorType::Suspended)
        }

        ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
        } => evaluate_update_expression(*operator, argument, *prefix, ctx),

        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
        } => {
            let l = evaluate_expression(left, ctx)?;
            let r = evaluate_expression(right, ctx)?;
            apply_binary_operator(*operator, &l, &r, ctx)
        }

        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
        } => evaluate_logical_expression(*operator, left, right, ctx),

        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
        } => evaluate_assignment_expression(*operator, left, right, ctx),

        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }

        ExpressionType::CallExpression { .. } | ExpressionType::MemberExpression { .. } => {
            Ok(evaluate_chain(expr, ctx)?
                .map(|(_, value)| value)
                .unwrap_or(JsValue::Undefined))
        }

        ExpressionType::ChainExpression(inner) => Ok(evaluate_chain(inner, ctx)?
            .map(|(_, value)| value)
            .unwrap_or(JsValue::Undefined)),

        ExpressionType::NewExpression { callee, arguments } => {
            let func = evaluate_expression(callee, ctx)?;
            let args = evaluate_arguments(arguments, ctx)?;
            construct(&func, args, ctx)
        }

        ExpressionType::SequenceExpression(expressions) => {
            let mut value = JsValue::Undefined;
            for e in expressions {
                value = evaluate_expression(e, ctx)?;
            }
            Ok(value)
        }
    }
}

/// Evaluate `expr`, giving an anonymous function the binding name it is
/// assigned to (`const f = () => {}` has `f.name === "f"`).
pub fn evaluate_named(expr: &ExpressionType, name: &str, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::FunctionExpression(data) if data.id.is_none() => {
            Ok(instantiate_function(data, ctx, Some(name)))
        }
        _ => evaluate_expression(expr, ctx),
    }
}

fn evaluate_literal(lit: &LiteralType) -> JsValue {
    match lit {
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::NumberLiteral(n) => JsValue::Number(*n),
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::BigIntLiteral(n) => JsValue::BigInt(*n),
    }
}

fn evaluate_template_literal(
    quasis: &[String],
    expressions: &[ExpressionType],
    ctx: &mut EvalContext,
) -> ValueResult {
    let mut out = String::new();
    for (i, quasi) in quasis.iter().enumerate() {
        out.push_str(quasi);
        if let Some(e) = expressions.get(i) {
            let part = to_string_implicit(&evaluate_expression(e, ctx)?)?;
            check_string_length(out.len() + part.len())?;
            out.push_str(&part);
        }
    }
    Ok(JsValue::String(out))
}

fn evaluate_array_expression(
    elements: &[Option<ExpressionOrSpreadElement>],
    ctx: &mut EvalContext,
) -> ValueResult {
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            None => values.push(JsValue::Undefined),
            Some(ExpressionOrSpreadElement::Expression(e)) => {
                values.push(evaluate_expression(e, ctx)?)
            }
            Some(ExpressionOrSpreadElement::SpreadElement(e)) => {
                let v = evaluate_expression(e, ctx)?;
                let spread = iterate_values(&v)?;
                check_array_length(values.len() + spread.len())?;
                values.extend(spread);
            }
        }
    }
    Ok(new_array(values))
}

/// Evaluate call arguments, expanding spreads.
pub fn evaluate_arguments(
    arguments: &[ExpressionOrSpreadElement],
    ctx: &mut EvalContext,
) -> Result<Vec<JsValue>, JErrorType> {
    let mut values = Vec::with_capacity(arguments.len());
    for argument in arguments {
        match argument {
            ExpressionOrSpreadElement::Expression(e) => values.push(evaluate_expression(e, ctx)?),
            ExpressionOrSpreadElement::SpreadElement(e) => {
                let v = evaluate_expression(e, ctx)?;
                values.extend(iterate_values(&v)?);
            }
        }
    }
    Ok(values)
}

fn evaluate_property_key(key: &PropertyKey, ctx: &mut EvalContext) -> Result<String, JErrorType> {
    match key {
        PropertyKey::Static(name) => Ok(name.clone()),
        PropertyKey::Computed(e) => Ok(to_property_key(&evaluate_expression(e, ctx)?)),
    }
}

fn evaluate_member_key(
    property: &MemberProperty,
    ctx: &mut EvalContext,
) -> Result<String, JErrorType> {
    match property {
        MemberProperty::Static(name) => Ok(name.clone()),
        MemberProperty::Computed(e) => Ok(to_property_key(&evaluate_expression(e, ctx)?)),
    }
}

fn evaluate_object_expression(properties: &[PropertyData], ctx: &mut EvalContext) -> ValueResult {
    let obj: JsObjectType = Rc::new(RefCell::new(JsObject::new(ObjectKind::Ordinary)));
    for property in properties {
        match property {
            PropertyData::KeyValue { key, value } => {
                let key = evaluate_property_key(key, ctx)?;
                let value = evaluate_named(value, &key, ctx)?;
                obj.borrow_mut().define(&key, value, true);
            }
            PropertyData::Shorthand(name) => {
                let value = ctx.get_binding(name)?;
                obj.borrow_mut().define(name, value, true);
            }
            PropertyData::Method { key, function } => {
                let key = evaluate_property_key(key, ctx)?;
                let f = instantiate_function(function, ctx, Some(&key));
                obj.borrow_mut().define(&key, f, true);
            }
            PropertyData::Spread(e) => {
                let source = evaluate_expression(e, ctx)?;
                for (key, value) in own_enumerable_entries(&source) {
                    obj.borrow_mut().define(&key, value, true);
                }
            }
        }
    }
    Ok(JsValue::Object(obj))
}

// ============================================================================
// Member access and calls
// ============================================================================

/// Evaluate a member/call chain. Returns the `this` value a call on the
/// result would receive along with the value, or `None` when an optional
/// link (`?.`) short-circuited.
fn evaluate_chain(
    expr: &ExpressionType,
    ctx: &mut EvalContext,
) -> Result<Option<(JsValue, JsValue)>, JErrorType> {
    match expr {
        ExpressionType::MemberExpression {
            object,
            property,
            optional,
        } => {
            let base = match evaluate_chain(object, ctx)? {
                Some((_, value)) => value,
                None => return Ok(None),
            };
            if *optional && base.is_nullish() {
                return Ok(None);
            }
            let key = evaluate_member_key(property, ctx)?;
            let value = get_property(&base, &key, ctx)?;
            Ok(Some((base, value)))
        }
        ExpressionType::CallExpression {
            callee,
            arguments,
            optional,
        } => {
            let (this, func) = match evaluate_chain(callee, ctx)? {
                Some(pair) => pair,
                None => return Ok(None),
            };
            if *optional && func.is_nullish() {
                return Ok(None);
            }
            let args = evaluate_arguments(arguments, ctx)?;
            if !is_callable(&func) {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a function",
                    describe_callee(callee)
                )));
            }
            let value = call_function(&func, this, args, ctx)?;
            Ok(Some((JsValue::Undefined, value)))
        }
        other => Ok(Some((JsValue::Undefined, evaluate_expression(other, ctx)?))),
    }
}

/// Source-like rendering of a callee for error messages (`obj.run`).
fn describe_callee(expr: &ExpressionType) -> String {
    match expr {
        ExpressionType::Identifier(name) => name.clone(),
        ExpressionType::ThisExpression => "this".to_string(),
        ExpressionType::MemberExpression {
            object, property, ..
        } => match property {
            MemberProperty::Static(name) => format!("{}.{}", describe_callee(object), name),
            MemberProperty::Computed(_) => format!("{}[...]", describe_callee(object)),
        },
        ExpressionType::CallExpression { callee, .. } => format!("{}(...)", describe_callee(callee)),
        ExpressionType::ChainExpression(inner) => describe_callee(inner),
        _ => "expression".to_string(),
    }
}

/// `base[key]`, including string indices, built-in instance methods and the
/// lazily created `prototype` of script functions.
pub fn get_property(base: &JsValue, key: &str, ctx: &mut EvalContext) -> ValueResult {
    match base {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            base, key
        ))),
        JsValue::String(s) => {
            if key == "length" {
                return Ok(JsValue::Number(s.encode_utf16().count() as f64));
            }
            if let Some(index) = array_index(key) {
                return Ok(utf16_char_at(s, index)
                    .map(JsValue::String)
                    .unwrap_or(JsValue::Undefined));
            }
            Ok(ctx.prototype_method("String", key).unwrap_or(JsValue::Undefined))
        }
        JsValue::Number(_) => Ok(ctx.prototype_method("Number", key).unwrap_or(JsValue::Undefined)),
        JsValue::Boolean(_) => Ok(ctx
            .prototype_method("Boolean", key)
            .unwrap_or(JsValue::Undefined)),
        JsValue::BigInt(_) => Ok(ctx.prototype_method("BigInt", key).unwrap_or(JsValue::Undefined)),
        JsValue::Symbol(symbol) => {
            if key == "description" {
                return Ok(symbol
                    .description
                    .clone()
                    .map(JsValue::String)
                    .unwrap_or(JsValue::Undefined));
            }
            Ok(ctx.prototype_method("Symbol", key).unwrap_or(JsValue::Undefined))
        }
        JsValue::Object(o) => {
            if let Some(value) = lookup_property(o, key) {
                return Ok(value);
            }
            if key == "prototype" {
                if let Some(prototype) = function_prototype(base, o) {
                    return Ok(prototype);
                }
            }
            let class = o.borrow().class_name();
            Ok(ctx.prototype_method(class, key).unwrap_or(JsValue::Undefined))
        }
    }
}

/// The `prototype` object of a script function, created on first access.
fn function_prototype(func: &JsValue, o: &JsObjectType) -> Option<JsValue> {
    let constructible = matches!(
        &o.borrow().kind,
        ObjectKind::Function(FunctionKind::Script(s)) if !s.data.is_arrow && !s.data.is_async
    );
    if !constructible {
        return None;
    }
    let prototype = new_object();
    if let JsValue::Object(p) = &prototype {
        p.borrow_mut().define("constructor", func.clone(), false);
    }
    o.borrow_mut().define("prototype", prototype.clone(), false);
    Some(prototype)
}

/// `base[key] = value`.
pub fn set_property(base: &JsValue, key: &str, value: JsValue) -> Result<(), JErrorType> {
    match base {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot set properties of {} (setting '{}')",
            base, key
        ))),
        JsValue::Object(o) => o.borrow_mut().set(key, value),
        _ => Err(JErrorType::TypeError(format!(
            "Cannot create property '{}' on {} '{}'",
            key,
            get_type(base),
            base
        ))),
    }
}

/// `key in base`.
fn has_property(base: &JsValue, key: &str, ctx: &mut EvalContext) -> Result<bool, JErrorType> {
    match base {
        JsValue::Object(o) => {
            if lookup_property(o, key).is_some() {
                return Ok(true);
            }
            if key == "prototype" && function_prototype(base, o).is_some() {
                return Ok(true);
            }
            let class = o.borrow().class_name();
            Ok(ctx.prototype_method(class, key).is_some())
        }
        _ => Err(JErrorType::TypeError(format!(
            "Cannot use 'in' operator to search for '{}' in {}",
            key, base
        ))),
    }
}

/// The values a `for...of` loop, a spread or an array pattern sees.
pub fn iterate_values(value: &JsValue) -> Result<Vec<JsValue>, JErrorType> {
    let not_iterable =
        || JErrorType::TypeError(format!("{} is not iterable", describe_value(value)));
    match value {
        JsValue::Object(o) => o.borrow().array_elements().cloned().ok_or_else(not_iterable),
        JsValue::String(s) => Ok(s.chars().map(|c| JsValue::String(c.to_string())).collect()),
        _ => Err(not_iterable()),
    }
}

/// Own enumerable `(key, value)` pairs, in property order.
pub fn own_enumerable_entries(value: &JsValue) -> Vec<(String, JsValue)> {
    match value {
        JsValue::Object(o) => {
            let obj = o.borrow();
            obj.own_keys()
                .into_iter()
                .filter_map(|k| obj.get_own(&k).map(|v| (k, v)))
                .collect()
        }
        JsValue::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), JsValue::String(c.to_string())))
            .collect(),
        _ => vec![],
    }
}

// ============================================================================
// Operators
// ============================================================================

fn evaluate_unary_expression(
    operator: UnaryOperator,
    argument: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    match operator {
        UnaryOperator::TypeOf => {
            if let ExpressionType::Identifier(name) = argument {
                if !ctx.has_binding(name) {
                    return Ok(JsValue::String("undefined".to_string()));
                }
            }
            let value = evaluate_expression(argument, ctx)?;
            Ok(JsValue::String(get_type(&value).to_string()))
        }
        UnaryOperator::Delete => evaluate_delete(argument, ctx),
        _ => {
            let value = evaluate_expression(argument, ctx)?;
            Ok(match operator {
                UnaryOperator::Minus => match to_numeric(&value)? {
                    Numeric::Number(n) => JsValue::Number(-n),
                    Numeric::BigInt(n) => {
                        JsValue::BigInt(n.checked_neg().ok_or_else(bigint_too_big)?)
                    }
                },
                UnaryOperator::Plus => match to_numeric(&value)? {
                    Numeric::Number(n) => JsValue::Number(n),
                    Numeric::BigInt(_) => {
                        return Err(JErrorType::TypeError(
                            "Cannot convert a BigInt value to a number".to_string(),
                        ))
                    }
                },
                UnaryOperator::LogicalNot => JsValue::Boolean(!to_boolean(&value)),
                _ => JsValue::Undefined,
            })
        }
    }
}

fn evaluate_delete(argument: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match argument {
        ExpressionType::MemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            let key = evaluate_member_key(property, ctx)?;
            match &base {
                JsValue::Object(o) => Ok(JsValue::Boolean(o.borrow_mut().delete(&key)?)),
                JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
                    "Cannot convert undefined or null to object (deleting '{}')",
                    key
                ))),
                _ => Ok(JsValue::Boolean(true)),
            }
        }
        ExpressionType::Identifier(_) => Err(JErrorType::SyntaxError(
            "Delete of an unqualified identifier in strict mode.".to_string(),
        )),
        other => {
            evaluate_expression(other, ctx)?;
            Ok(JsValue::Boolean(true))
        }
    }
}

/// An assignable location.
enum Place {
    Binding(String),
    Property(JsValue, String),
}

fn read_place(place: &Place, ctx: &mut EvalContext) -> ValueResult {
    match place {
        Place::Binding(name) => ctx.get_binding(name),
        Place::Property(base, key) => get_property(base, key, ctx),
    }
}

fn write_place(place: &Place, value: JsValue, ctx: &mut EvalContext) -> Result<(), JErrorType> {
    match place {
        Place::Binding(name) => ctx.set_binding(name, value),
        Place::Property(base, key) => set_property(base, key, value),
    }
}

fn evaluate_update_expression(
    operator: UpdateOperator,
    argument: &ExpressionType,
    prefix: bool,
    ctx: &mut EvalContext,
) -> ValueResult {
    let place = match argument {
        ExpressionType::Identifier(name) => Place::Binding(name.clone()),
        ExpressionType::MemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            let key = evaluate_member_key(property, ctx)?;
            Place::Property(base, key)
        }
        _ => {
            return Err(JErrorType::SyntaxError(
                "Invalid left-hand side expression in postfix operation".to_string(),
            ))
        }
    };
    let (old, new) = match to_numeric(&read_place(&place, ctx)?)? {
        Numeric::Number(old) => {
            let new = match operator {
                UpdateOperator::PlusPlus => old + 1.0,
                UpdateOperator::MinusMinus => old - 1.0,
            };
            (JsValue::Number(old), JsValue::Number(new))
        }
        Numeric::BigInt(old) => {
            let new = match operator {
                UpdateOperator::PlusPlus => old.checked_add(1),
                UpdateOperator::MinusMinus => old.checked_sub(1),
            };
            (JsValue::BigInt(old), JsValue::BigInt(new.ok_or_else(bigint_too_big)?))
        }
    };
    write_place(&place, new.clone(), ctx)?;
    Ok(if prefix { new } else { old })
}

fn evaluate_assignment_expression(
    operator: AssignmentOperator,
    left: &AssignmentTarget,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let (place, name) = match left {
        AssignmentTarget::Pattern(pattern) => {
            let value = evaluate_expression(right, ctx)?;
            bind_pattern(pattern, value.clone(), BindingKind::Assignment, ctx)?;
            return Ok(value);
        }
        AssignmentTarget::Identifier(name) => (Place::Binding(name.clone()), Some(name.as_str())),
        AssignmentTarget::Member { object, property } => {
            let base = evaluate_expression(object, ctx)?;
            let key = evaluate_member_key(property, ctx)?;
            (Place::Property(base, key), None)
        }
    };
    let evaluate_right = |ctx: &mut EvalContext| match name {
        Some(name) => evaluate_named(right, name, ctx),
        None => evaluate_expression(right, ctx),
    };

    let value = match operator {
        AssignmentOperator::Equals => evaluate_right(ctx)?,
        AssignmentOperator::NullishEquals => {
            let current = read_place(&place, ctx)?;
            if !current.is_nullish() {
                return Ok(current);
            }
            evaluate_right(ctx)?
        }
        AssignmentOperator::OrEquals => {
            let current = read_place(&place, ctx)?;
            if to_boolean(&current) {
                return Ok(current);
            }
            evaluate_right(ctx)?
        }
        AssignmentOperator::AndEquals => {
            let current = read_place(&place, ctx)?;
            if !to_boolean(&current) {
                return Ok(current);
            }
            evaluate_right(ctx)?
        }
        compound => {
            let current = read_place(&place, ctx)?;
            let r = evaluate_expression(right, ctx)?;
            match compound.binary_operator() {
                Some(op) => apply_binary_operator(op, &current, &r, ctx)?,
                None => r,
            }
        }
    };
    write_place(&place, value.clone(), ctx)?;
    Ok(value)
}

fn evaluate_logical_expression(
    operator: LogicalOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let l = evaluate_expression(left, ctx)?;
    let short_circuit = match operator {
        LogicalOperator::Or => to_boolean(&l),
        LogicalOperator::And => !to_boolean(&l),
        LogicalOperator::NullishCoalescing => !l.is_nullish(),
    };
    if short_circuit {
        Ok(l)
    } else {
        evaluate_expression(right, ctx)
    }
}

/// Apply a binary operator to two evaluated operands.
pub fn apply_binary_operator(
    operator: BinaryOperator,
    l: &JsValue,
    r: &JsValue,
    ctx: &mut EvalContext,
) -> ValueResult {
    Ok(match operator {
        BinaryOperator::Add => add(l, r)?,
        BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo
        | BinaryOperator::Exponent => arithmetic(operator, l, r)?,
        BinaryOperator::LooselyEqual => JsValue::Boolean(loose_equality(l, r)),
        BinaryOperator::LooselyUnequal => JsValue::Boolean(!loose_equality(l, r)),
        BinaryOperator::StrictlyEqual => JsValue::Boolean(strict_equality(l, r)),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(!strict_equality(l, r)),
        BinaryOperator::LessThan => {
            JsValue::Boolean(matches!(compare_values(l, r), Some(Ordering::Less)))
        }
        BinaryOperator::LessThanEqual => JsValue::Boolean(matches!(
            compare_values(l, r),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOperator::GreaterThan => {
            JsValue::Boolean(matches!(compare_values(l, r), Some(Ordering::Greater)))
        }
        BinaryOperator::GreaterThanEqual => JsValue::Boolean(matches!(
            compare_values(l, r),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOperator::In => JsValue::Boolean(has_property(r, &to_property_key(l), ctx)?),
        BinaryOperator::InstanceOf => JsValue::Boolean(instance_of(l, r, ctx)?),
    })
}

fn to_primitive(v: &JsValue) -> JsValue {
    match v {
        JsValue::Object(_) => JsValue::String(to_string(v)),
        other => other.clone(),
    }
}

fn add(l: &JsValue, r: &JsValue) -> ValueResult {
    let (l, r) = (to_primitive(l), to_primitive(r));
    if matches!(l, JsValue::String(_)) || matches!(r, JsValue::String(_)) {
        let (l, r) = (to_string_implicit(&l)?, to_string_implicit(&r)?);
        check_string_length(l.len() + r.len())?;
        Ok(JsValue::String(l + &r))
    } else {
        arithmetic(BinaryOperator::Add, &l, &r)
    }
}

/// A value converted for arithmetic: numbers and BigInts never mix.
enum Numeric {
    Number(f64),
    BigInt(i128),
}

fn to_numeric(v: &JsValue) -> Result<Numeric, JErrorType> {
    match to_primitive(v) {
        JsValue::BigInt(n) => Ok(Numeric::BigInt(n)),
        JsValue::Symbol(_) => Err(JErrorType::TypeError(
            "Cannot convert a Symbol value to a number".to_string(),
        )),
        other => Ok(Numeric::Number(to_number(&other))),
    }
}

fn bigint_too_big() -> JErrorType {
    JErrorType::RangeError("Maximum BigInt size exceeded".to_string())
}

fn arithmetic(operator: BinaryOperator, l: &JsValue, r: &JsValue) -> ValueResult {
    match (to_numeric(l)?, to_numeric(r)?) {
        (Numeric::Number(a), Numeric::Number(b)) => Ok(JsValue::Number(match operator {
            BinaryOperator::Add => a + b,
            BinaryOperator::Subtract => a - b,
            BinaryOperator::Multiply => a * b,
            BinaryOperator::Divide => a / b,
            BinaryOperator::Modulo => a % b,
            _ => exponentiate(a, b),
        })),
        (Numeric::BigInt(a), Numeric::BigInt(b)) => bigint_arithmetic(operator, a, b),
        _ => Err(JErrorType::TypeError(
            "Cannot mix BigInt and other types, use explicit conversions".to_string(),
        )),
    }
}

/// BigInt arithmetic; division truncates toward zero.
fn bigint_arithmetic(operator: BinaryOperator, a: i128, b: i128) -> ValueResult {
    if b == 0 && matches!(operator, BinaryOperator::Divide | BinaryOperator::Modulo) {
        return Err(JErrorType::RangeError("Division by zero".to_string()));
    }
    let result = match operator {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => a.checked_div(b),
        BinaryOperator::Modulo => a.checked_rem(b),
        _ if b < 0 => {
            return Err(JErrorType::RangeError(
                "Exponent must be non-negative".to_string(),
            ))
        }
        _ => match a {
            0 | 1 => Some(if b == 0 { 1 } else { a }),
            -1 => Some(if b % 2 == 0 { 1 } else { -1 }),
            _ => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
        },
    };
    result.map(JsValue::BigInt).ok_or_else(bigint_too_big)
}

fn exponentiate(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

/// Abstract relational comparison: strings by UTF-16 code units, everything
/// else numerically. `None` when either side is `NaN`.
fn compare_values(l: &JsValue, r: &JsValue) -> Option<Ordering> {
    match (to_primitive(l), to_primitive(r)) {
        (JsValue::String(a), JsValue::String(b)) => Some(a.encode_utf16().cmp(b.encode_utf16())),
        (JsValue::BigInt(a), JsValue::BigInt(b)) => Some(a.cmp(&b)),
        (a, b) => to_number(&a).partial_cmp(&to_number(&b)),
    }
}

/// `value instanceof ctor`. Script constructors are checked against the
/// prototype chain, built-in constructors by class.
pub fn instance_of(value: &JsValue, ctor: &JsValue, ctx: &mut EvalContext) -> Result<bool, JErrorType> {
    let ctor_obj = match ctor {
        JsValue::Object(o) if o.borrow().is_callable() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Right-hand side of 'instanceof' is not callable".to_string(),
            ))
        }
    };
    let obj = match value {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(false),
    };
    let native_name = match &ctor_obj.borrow().kind {
        ObjectKind::Function(FunctionKind::Native(n)) => Some(n.name.clone()),
        _ => None,
    };
    if let Some(name) = native_name {
        let class = instance_class(&obj, ctx);
        return Ok(ctx.registry().inherits_from(&class, &name));
    }

    let prototype = match get_property(ctor, "prototype", ctx)? {
        JsValue::Object(p) => p,
        _ => return Ok(false),
    };
    let mut current = obj.borrow().prototype.clone();
    while let Some(p) = current {
        if Rc::ptr_eq(&p, &prototype) {
            return Ok(true);
        }
        current = p.borrow().prototype.clone();
    }
    Ok(false)
}

/// Built-in class of an object; errors report their registered `name`.
fn instance_class(obj: &JsObjectType, ctx: &EvalContext) -> String {
    let obj = obj.borrow();
    match &obj.kind {
        ObjectKind::Error => match obj.get_own("name") {
            Some(JsValue::String(name)) if ctx.registry().has_object(&name) => name,
            _ => "Error".to_string(),
        },
        _ => obj.class_name().to_string(),
    }
}
