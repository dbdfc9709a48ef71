//! Array built-in.
//!
//! Provides the `Array` constructor, its static helpers and array prototype
//! methods. Callbacks are invoked through the evaluator, so they may be
//! script functions or built-ins.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::parser::ensure_stack;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{check_array_length, new_array, MAX_ARRAY_LENGTH};
use crate::runner::ds::operations::test_and_comparison::{
    is_callable, same_value_zero, strict_equality,
};
use crate::runner::ds::operations::type_conversion::{
    relative_index, to_boolean, to_integer, to_number, to_string,
};
use crate::runner::ds::value::{check_string_length, JsObjectType, JsValue};
use crate::runner::eval::expression::{get_property, iterate_values};
use crate::runner::eval::function::{call_function, describe_value};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Array built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array")
        .with_constructor(array_constructor)
        .add_method("isArray", array_is_array)
        .add_method("of", array_of)
        .add_method("from", array_from)
        // Mutators
        .add_prototype_method("push", array_push)
        .add_prototype_method("pop", array_pop)
        .add_prototype_method("shift", array_shift)
        .add_prototype_method("unshift", array_unshift)
        .add_prototype_method("splice", array_splice)
        .add_prototype_method("reverse", array_reverse)
        .add_prototype_method("sort", array_sort)
        .add_prototype_method("fill", array_fill)
        // Accessors
        .add_prototype_method("slice", array_slice)
        .add_prototype_method("concat", array_concat)
        .add_prototype_method("join", array_join)
        .add_prototype_method("indexOf", array_index_of)
        .add_prototype_method("lastIndexOf", array_last_index_of)
        .add_prototype_method("includes", array_includes)
        .add_prototype_method("at", array_at)
        .add_prototype_method("flat", array_flat)
        .add_prototype_method("toString", array_to_string)
        // Iteration
        .add_prototype_method("forEach", array_for_each)
        .add_prototype_method("map", array_map)
        .add_prototype_method("filter", array_filter)
        .add_prototype_method("find", array_find)
        .add_prototype_method("findIndex", array_find_index)
        .add_prototype_method("findLast", array_find_last)
        .add_prototype_method("findLastIndex", array_find_last_index)
        .add_prototype_method("some", array_some)
        .add_prototype_method("every", array_every)
        .add_prototype_method("reduce", array_reduce)
        .add_prototype_method("reduceRight", array_reduce_right)
        .add_prototype_method("flatMap", array_flat_map);

    registry.register_object(array);
}

// ============================================================================
// Helpers
// ============================================================================

fn this_array(this: &JsValue, method: &str) -> Result<JsObjectType, JErrorType> {
    match this {
        JsValue::Object(o) if o.borrow().is_array() => Ok(o.clone()),
        _ => Err(JErrorType::TypeError(format!(
            "Array.prototype.{} called on non-array {}",
            method,
            describe_value(this)
        ))),
    }
}

fn snapshot(arr: &JsObjectType) -> Vec<JsValue> {
    arr.borrow().array_elements().cloned().unwrap_or_default()
}

fn length(arr: &JsObjectType) -> usize {
    arr.borrow().array_elements().map_or(0, |e| e.len())
}

/// Element `i` as it is now; callbacks may have changed the array.
fn element_at(arr: &JsObjectType, i: usize) -> JsValue {
    arr.borrow()
        .array_elements()
        .and_then(|e| e.get(i).cloned())
        .unwrap_or(JsValue::Undefined)
}

/// Run `f` on the elements of a non-frozen array.
fn mutate<T>(
    arr: &JsObjectType,
    f: impl FnOnce(&mut Vec<JsValue>) -> T,
) -> Result<T, JErrorType> {
    let mut obj = arr.borrow_mut();
    if obj.frozen {
        return Err(JErrorType::TypeError(
            "Cannot assign to read only property 'length' of object '[object Array]'".to_string(),
        ));
    }
    match obj.array_elements_mut() {
        Some(elements) => Ok(f(elements)),
        None => Err(JErrorType::TypeError("not an array".to_string())),
    }
}

fn callback_arg(args: &[JsValue]) -> Result<JsValue, JErrorType> {
    let callback = arg(args, 0);
    if is_callable(&callback) {
        Ok(callback)
    } else {
        Err(JErrorType::TypeError(format!(
            "{} is not a function",
            describe_value(&callback)
        )))
    }
}

/// `callback.call(thisArg, element, index, array)`.
fn invoke(
    ctx: &mut EvalContext,
    callback: &JsValue,
    this_arg: &JsValue,
    arr: &JsObjectType,
    index: usize,
) -> Result<JsValue, JErrorType> {
    call_function(
        callback,
        this_arg.clone(),
        vec![
            element_at(arr, index),
            JsValue::Number(index as f64),
            JsValue::Object(arr.clone()),
        ],
        ctx,
    )
}

fn array_length_arg(n: f64) -> Result<usize, JErrorType> {
    if n < 0.0 || n.fract() != 0.0 || n > MAX_ARRAY_LENGTH as f64 {
        Err(JErrorType::RangeError("Invalid array length".to_string()))
    } else {
        Ok(n as usize)
    }
}

// ============================================================================
// Constructor and statics
// ============================================================================

/// Array(...): a single numeric argument is a length.
fn array_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if let [JsValue::Number(n)] = args.as_slice() {
        let len = array_length_arg(*n)?;
        return Ok(new_array(vec![JsValue::Undefined; len]));
    }
    Ok(new_array(args))
}

/// Array.isArray
fn array_is_array(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(matches!(
        arg(&args, 0),
        JsValue::Object(o) if o.borrow().is_array()
    )))
}

/// Array.of
fn array_of(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(new_array(args))
}

/// Array.from(source, mapFn): arrays, strings and array-likes with a `length`.
fn array_from(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let source = arg(&args, 0);
    if source.is_nullish() {
        return Err(JErrorType::TypeError(format!(
            "{} is not iterable",
            describe_value(&source)
        )));
    }
    let items = match iterate_values(&source) {
        Ok(items) => items,
        Err(_) => {
            let len = to_integer(&get_property(&source, "length", ctx)?).max(0.0);
            let len = array_length_arg(len)?;
            let mut items = Vec::with_capacity(len);
            for i in 0..len {
                items.push(get_property(&source, &i.to_string(), ctx)?);
            }
            items
        }
    };
    let map_fn = arg(&args, 1);
    if matches!(map_fn, JsValue::Undefined) {
        return Ok(new_array(items));
    }
    if !is_callable(&map_fn) {
        return Err(JErrorType::TypeError(format!(
            "{} is not a function",
            describe_value(&map_fn)
        )));
    }
    let mut mapped = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        mapped.push(call_function(
            &map_fn,
            JsValue::Undefined,
            vec![item, JsValue::Number(i as f64)],
            ctx,
        )?);
    }
    Ok(new_array(mapped))
}

// ============================================================================
// Mutators
// ============================================================================

/// Array.prototype.push
fn array_push(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "push")?;
    check_array_length(length(&arr) + args.len())?;
    let len = mutate(&arr, |e| {
        e.extend(args);
        e.len()
    })?;
    Ok(JsValue::Number(len as f64))
}

/// Array.prototype.pop
fn array_pop(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "pop")?;
    Ok(mutate(&arr, |e| e.pop())?.unwrap_or(JsValue::Undefined))
}

/// Array.prototype.shift
fn array_shift(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "shift")?;
    let first = mutate(&arr, |e| {
        if e.is_empty() {
            None
        } else {
            Some(e.remove(0))
        }
    })?;
    Ok(first.unwrap_or(JsValue::Undefined))
}

/// Array.prototype.unshift
fn array_unshift(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "unshift")?;
    check_array_length(length(&arr) + args.len())?;
    let len = mutate(&arr, |e| {
        e.splice(0..0, args);
        e.len()
    })?;
    Ok(JsValue::Number(len as f64))
}

/// Array.prototype.splice(start, deleteCount, ...items)
fn array_splice(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "splice")?;
    let len = length(&arr);
    let start = relative_index(args.first(), len, 0);
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => (to_integer(&args[1]).max(0.0) as usize).min(len - start),
    };
    let items: Vec<JsValue> = args.into_iter().skip(2).collect();
    check_array_length(len - delete_count + items.len())?;
    let removed = mutate(&arr, |e| {
        e.splice(start..start + delete_count, items).collect::<Vec<_>>()
    })?;
    Ok(new_array(removed))
}

/// Array.prototype.reverse: in place.
fn array_reverse(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "reverse")?;
    mutate(&arr, |e| e.reverse())?;
    Ok(this)
}

/// Array.prototype.fill(value, start, end)
fn array_fill(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "fill")?;
    let len = length(&arr);
    let value = arg(&args, 0);
    let start = relative_index(args.get(1), len, 0);
    let end = relative_index(args.get(2), len, len);
    mutate(&arr, |e| {
        for slot in e.iter_mut().take(end).skip(start) {
            *slot = value.clone();
        }
    })?;
    Ok(this)
}

/// Array.prototype.sort: stable. Without a comparator elements compare as
/// strings and `undefined` sorts last.
fn array_sort(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "sort")?;
    let comparator = arg(&args, 0);
    if !matches!(comparator, JsValue::Undefined) && !is_callable(&comparator) {
        return Err(JErrorType::TypeError(
            "The comparison function must be either a function or undefined".to_string(),
        ));
    }
    let elements = snapshot(&arr);
    let (mut defined, undefined_count) = {
        let total = elements.len();
        let defined: Vec<JsValue> = elements
            .into_iter()
            .filter(|v| !matches!(v, JsValue::Undefined))
            .collect();
        let undefined_count = total - defined.len();
        (defined, undefined_count)
    };

    let mut compare = |a: &JsValue, b: &JsValue| -> Result<Ordering, JErrorType> {
        if is_callable(&comparator) {
            let result = call_function(
                &comparator,
                JsValue::Undefined,
                vec![a.clone(), b.clone()],
                ctx,
            )?;
            let n = to_number(&result);
            Ok(if n < 0.0 {
                Ordering::Less
            } else if n > 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            })
        } else {
            Ok(to_string(a).encode_utf16().cmp(to_string(b).encode_utf16()))
        }
    };
    merge_sort(&mut defined, &mut compare)?;
    defined.extend(std::iter::repeat(JsValue::Undefined).take(undefined_count));

    mutate(&arr, |e| *e = defined)?;
    Ok(this)
}

/// Stable merge sort with a fallible comparator. A comparator that is not a
/// consistent ordering yields some permutation rather than a panic.
fn merge_sort<F>(items: &mut Vec<JsValue>, compare: &mut F) -> Result<(), JErrorType>
where
    F: FnMut(&JsValue, &JsValue) -> Result<Ordering, JErrorType>,
{
    if items.len() <= 1 {
        return Ok(());
    }
    let mut right = items.split_off(items.len() / 2);
    merge_sort(items, compare)?;
    merge_sort(&mut right, compare)?;

    let left = std::mem::take(items);
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        if compare(r, l)? == Ordering::Less {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    *items = merged;
    Ok(())
}

// ============================================================================
// Accessors
// ============================================================================

/// Array.prototype.slice
fn array_slice(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "slice")?;
    let elements = snapshot(&arr);
    let start = relative_index(args.first(), elements.len(), 0);
    let end = relative_index(args.get(1), elements.len(), elements.len());
    if start >= end {
        return Ok(new_array(vec![]));
    }
    Ok(new_array(elements[start..end].to_vec()))
}

/// Array.prototype.concat: array arguments are spread one level.
fn array_concat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "concat")?;
    let mut result = snapshot(&arr);
    for value in args {
        match &value {
            JsValue::Object(o) if o.borrow().is_array() => result.extend(snapshot(o)),
            _ => result.push(value),
        }
        check_array_length(result.len())?;
    }
    Ok(new_array(result))
}

fn join(arr: &JsObjectType, separator: &str) -> Result<String, JErrorType> {
    let mut out = String::new();
    for (i, v) in snapshot(arr).iter().enumerate() {
        let part = match v {
            JsValue::Undefined | JsValue::Null => String::new(),
            other => to_string(other),
        };
        let sep = if i == 0 { "" } else { separator };
        check_string_length(out.len() + sep.len() + part.len())?;
        out.push_str(sep);
        out.push_str(&part);
    }
    Ok(out)
}

/// Array.prototype.join
fn array_join(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "join")?;
    let separator = match arg(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        v => to_string(&v),
    };
    Ok(JsValue::String(join(&arr, &separator)?))
}

/// Array.prototype.toString
fn array_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    // Nested arrays and cycles are handled by the generic conversion.
    this_array(&this, "toString")?;
    Ok(JsValue::String(to_string(&this)))
}

/// Array.prototype.indexOf: strict equality, so `NaN` is never found.
fn array_index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "indexOf")?;
    let elements = snapshot(&arr);
    let target = arg(&args, 0);
    let from = relative_index(args.get(1), elements.len(), 0);
    let found = elements
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, v)| strict_equality(v, &target));
    Ok(JsValue::Number(found.map_or(-1.0, |(i, _)| i as f64)))
}

/// Array.prototype.lastIndexOf
fn array_last_index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "lastIndexOf")?;
    let elements = snapshot(&arr);
    if elements.is_empty() {
        return Ok(JsValue::Number(-1.0));
    }
    let target = arg(&args, 0);
    let from = match args.get(1) {
        None => elements.len() - 1,
        Some(v) => {
            let n = to_integer(v);
            if n < 0.0 {
                let adjusted = elements.len() as f64 + n;
                if adjusted < 0.0 {
                    return Ok(JsValue::Number(-1.0));
                }
                adjusted as usize
            } else {
                (n as usize).min(elements.len() - 1)
            }
        }
    };
    let found = (0..=from)
        .rev()
        .find(|&i| strict_equality(&elements[i], &target));
    Ok(JsValue::Number(found.map_or(-1.0, |i| i as f64)))
}

/// Array.prototype.includes: SameValueZero, so `NaN` is found.
fn array_includes(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "includes")?;
    let elements = snapshot(&arr);
    let target = arg(&args, 0);
    let from = relative_index(args.get(1), elements.len(), 0);
    Ok(JsValue::Boolean(
        elements.iter().skip(from).any(|v| same_value_zero(v, &target)),
    ))
}

/// Array.prototype.at
fn array_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "at")?;
    let len = length(&arr) as f64;
    let mut index = to_integer(&arg(&args, 0));
    if index < 0.0 {
        index += len;
    }
    if index < 0.0 || index >= len {
        return Ok(JsValue::Undefined);
    }
    Ok(element_at(&arr, index as usize))
}

/// Flatten `elements` into `out`. `visiting` holds the arrays being
/// flattened; meeting one again is infinite recursion.
fn flatten_into(
    out: &mut Vec<JsValue>,
    elements: Vec<JsValue>,
    depth: f64,
    visiting: &mut Vec<JsObjectType>,
) -> Result<(), JErrorType> {
    for value in elements {
        match &value {
            JsValue::Object(o) if depth >= 1.0 && o.borrow().is_array() => {
                if visiting.iter().any(|seen| Rc::ptr_eq(seen, o)) {
                    return Err(JErrorType::RangeError(
                        "Maximum call stack size exceeded".to_string(),
                    ));
                }
                visiting.push(o.clone());
                ensure_stack(|| flatten_into(out, snapshot(o), depth - 1.0, visiting))?;
                visiting.pop();
            }
            _ => {
                out.push(value);
                check_array_length(out.len())?;
            }
        }
    }
    Ok(())
}

/// Array.prototype.flat(depth = 1)
fn array_flat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "flat")?;
    let depth = match arg(&args, 0) {
        JsValue::Undefined => 1.0,
        v => to_integer(&v),
    };
    let mut out = vec![];
    flatten_into(&mut out, snapshot(&arr), depth, &mut vec![arr])?;
    Ok(new_array(out))
}

// ============================================================================
// Iteration
// ============================================================================

/// Array.prototype.forEach
fn array_for_each(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "forEach")?;
    let callback = callback_arg(&args)?;
    let this_arg = arg(&args, 1);
    for i in 0..length(&arr) {
        invoke(ctx, &callback, &this_arg, &arr, i)?;
    }
    Ok(JsValue::Undefined)
}

/// Array.prototype.map
fn array_map(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "map")?;
    let callback = callback_arg(&args)?;
    let this_arg = arg(&args, 1);
    let len = length(&arr);
    let mut result = Vec::with_capacity(len);
    for i in 0..len {
        result.push(invoke(ctx, &callback, &this_arg, &arr, i)?);
    }
    Ok(new_array(result))
}

/// Array.prototype.filter
fn array_filter(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "filter")?;
    let callback = callback_arg(&args)?;
    let this_arg = arg(&args, 1);
    let mut result = vec![];
    for i in 0..length(&arr) {
        let value = element_at(&arr, i);
        if to_boolean(&invoke(ctx, &callback, &this_arg, &arr, i)?) {
            result.push(value);
        }
    }
    Ok(new_array(result))
}

/// First (or last, with `reverse`) index whose callback result is truthy.
fn find_position(
    ctx: &mut EvalContext,
    this: &JsValue,
    args: &[JsValue],
    method: &str,
    reverse: bool,
) -> Result<Option<(usize, JsValue)>, JErrorType> {
    let arr = this_array(this, method)?;
    let callback = callback_arg(args)?;
    let this_arg = arg(args, 1);
    let len = length(&arr);
    let indices: Box<dyn Iterator<Item = usize>> = if reverse {
        Box::new((0..len).rev())
    } else {
        Box::new(0..len)
    };
    for i in indices {
        let value = element_at(&arr, i);
        if to_boolean(&invoke(ctx, &callback, &this_arg, &arr, i)?) {
            return Ok(Some((i, value)));
        }
    }
    Ok(None)
}

/// Array.prototype.find
fn array_find(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(find_position(ctx, &this, &args, "find", false)?
        .map_or(JsValue::Undefined, |(_, v)| v))
}

/// Array.prototype.findIndex
fn array_find_index(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(
        find_position(ctx, &this, &args, "findIndex", false)?.map_or(-1.0, |(i, _)| i as f64),
    ))
}

/// Array.prototype.findLast
fn array_find_last(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(find_position(ctx, &this, &args, "findLast", true)?
        .map_or(JsValue::Undefined, |(_, v)| v))
}

/// Array.prototype.findLastIndex
fn array_find_last_index(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(
        find_position(ctx, &this, &args, "findLastIndex", true)?.map_or(-1.0, |(i, _)| i as f64),
    ))
}

/// Array.prototype.some
fn array_some(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        find_position(ctx, &this, &args, "some", false)?.is_some(),
    ))
}

/// Array.prototype.every
fn array_every(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "every")?;
    let callback = callback_arg(&args)?;
    let this_arg = arg(&args, 1);
    for i in 0..length(&arr) {
        if !to_boolean(&invoke(ctx, &callback, &this_arg, &arr, i)?) {
            return Ok(JsValue::Boolean(false));
        }
    }
    Ok(JsValue::Boolean(true))
}

fn reduce(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
    method: &str,
    reverse: bool,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, method)?;
    let callback = callback_arg(&args)?;
    let len = length(&arr);
    let mut indices: Box<dyn Iterator<Item = usize>> = if reverse {
        Box::new((0..len).rev())
    } else {
        Box::new(0..len)
    };
    let mut accumulator = match args.get(1) {
        Some(initial) => initial.clone(),
        None => match indices.next() {
            Some(i) => element_at(&arr, i),
            None => {
                return Err(JErrorType::TypeError(
                    "Reduce of empty array with no initial value".to_string(),
                ))
            }
        },
    };
    for i in indices {
        accumulator = call_function(
            &callback,
            JsValue::Undefined,
            vec![
                accumulator,
                element_at(&arr, i),
                JsValue::Number(i as f64),
                this.clone(),
            ],
            ctx,
        )?;
    }
    Ok(accumulator)
}

/// Array.prototype.reduce
fn array_reduce(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    reduce(ctx, this, args, "reduce", false)
}

/// Array.prototype.reduceRight
fn array_reduce_right(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    reduce(ctx, this, args, "reduceRight", true)
}

/// Array.prototype.flatMap
fn array_flat_map(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let arr = this_array(&this, "flatMap")?;
    let callback = callback_arg(&args)?;
    let this_arg = arg(&args, 1);
    let mut mapped = vec![];
    for i in 0..length(&arr) {
        mapped.push(invoke(ctx, &callback, &this_arg, &arr, i)?);
    }
    let mut out = vec![];
    flatten_into(&mut out, mapped, 1.0, &mut vec![])?;
    Ok(new_array(out))
}
