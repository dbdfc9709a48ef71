//! String built-in.
//!
//! Provides the `String` function and string prototype methods. Positions
//! and lengths count UTF-16 code units, as in JavaScript.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::test_and_comparison::is_callable;
use crate::runner::ds::operations::type_conversion::{relative_index, to_integer, to_string};
use crate::runner::ds::value::{check_string_length, JsValue};
use crate::runner::eval::function::call_function;
use crate::runner::ds::object::new_array;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the String built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let string = BuiltInObject::new("String")
        .with_constructor(string_constructor)
        .add_method("fromCharCode", string_from_char_code)
        .add_prototype_method("charAt", string_char_at)
        .add_prototype_method("charCodeAt", string_char_code_at)
        .add_prototype_method("at", string_at)
        .add_prototype_method("substring", string_substring)
        .add_prototype_method("slice", string_slice)
        .add_prototype_method("indexOf", string_index_of)
        .add_prototype_method("lastIndexOf", string_last_index_of)
        .add_prototype_method("includes", string_includes)
        .add_prototype_method("startsWith", string_starts_with)
        .add_prototype_method("endsWith", string_ends_with)
        .add_prototype_method("split", string_split)
        .add_prototype_method("trim", string_trim)
        .add_prototype_method("trimStart", string_trim_start)
        .add_prototype_method("trimEnd", string_trim_end)
        .add_prototype_method("toUpperCase", string_to_upper_case)
        .add_prototype_method("toLowerCase", string_to_lower_case)
        .add_prototype_method("repeat", string_repeat)
        .add_prototype_method("padStart", string_pad_start)
        .add_prototype_method("padEnd", string_pad_end)
        .add_prototype_method("replace", string_replace)
        .add_prototype_method("replaceAll", string_replace_all)
        .add_prototype_method("concat", string_concat)
        .add_prototype_method("toString", string_to_string);

    registry.register_object(string);
}

/// The code unit at `index` as a one-unit string.
pub fn utf16_char_at(s: &str, index: usize) -> Option<String> {
    s.encode_utf16()
        .nth(index)
        .map(|unit| String::from_utf16_lossy(&[unit]))
}

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn from_units(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Position of `needle` in `haystack` at or after `from`, in code units.
fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}

fn this_string(this: &JsValue, method: &str) -> Result<String, JErrorType> {
    match this {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "String.prototype.{} called on null or undefined",
            method
        ))),
        other => Ok(to_string(other)),
    }
}

/// String(value)
fn string_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match args.first() {
        None => Ok(JsValue::String(String::new())),
        Some(v) => Ok(JsValue::String(to_string(v))),
    }
}

/// String.fromCharCode
fn string_from_char_code(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let units: Vec<u16> = args.iter().map(|a| to_integer(a) as i64 as u16).collect();
    Ok(JsValue::String(from_units(&units)))
}

/// String.prototype.charAt
fn string_char_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "charAt")?;
    let index = to_integer(&arg(&args, 0));
    if index < 0.0 {
        return Ok(JsValue::String(String::new()));
    }
    Ok(JsValue::String(
        utf16_char_at(&s, index as usize).unwrap_or_default(),
    ))
}

/// String.prototype.charCodeAt
fn string_char_code_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "charCodeAt")?;
    let index = to_integer(&arg(&args, 0));
    if index < 0.0 {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(
        s.encode_utf16()
            .nth(index as usize)
            .map(|u| u as f64)
            .unwrap_or(f64::NAN),
    ))
}

/// String.prototype.at: negative indices count from the end.
fn string_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "at")?;
    let len = s.encode_utf16().count() as f64;
    let mut index = to_integer(&arg(&args, 0));
    if index < 0.0 {
        index += len;
    }
    if index < 0.0 || index >= len {
        return Ok(JsValue::Undefined);
    }
    Ok(utf16_char_at(&s, index as usize)
        .map(JsValue::String)
        .unwrap_or(JsValue::Undefined))
}

/// String.prototype.substring: negative arguments clamp to 0, swapped bounds swap.
fn string_substring(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let units = units(&this_string(&this, "substring")?);
    let len = units.len();
    let clamp = |v: &JsValue, default: usize| match v {
        JsValue::Undefined => default,
        v => to_integer(v).max(0.0).min(len as f64) as usize,
    };
    let start = clamp(&arg(&args, 0), 0);
    let end = clamp(&arg(&args, 1), len);
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    Ok(JsValue::String(from_units(&units[start..end])))
}

/// String.prototype.slice
fn string_slice(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let units = units(&this_string(&this, "slice")?);
    let len = units.len();
    let start = relative_index(args.first(), len, 0);
    let end = relative_index(args.get(1), len, len);
    if start >= end {
        return Ok(JsValue::String(String::new()));
    }
    Ok(JsValue::String(from_units(&units[start..end])))
}

/// String.prototype.indexOf
fn string_index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let haystack = units(&this_string(&this, "indexOf")?);
    let needle = units(&to_string(&arg(&args, 0)));
    let from = to_integer(&arg(&args, 1)).max(0.0) as usize;
    Ok(JsValue::Number(
        find_units(&haystack, &needle, from)
            .map(|i| i as f64)
            .unwrap_or(-1.0),
    ))
}

/// String.prototype.lastIndexOf
fn string_last_index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let haystack = units(&this_string(&this, "lastIndexOf")?);
    let needle = units(&to_string(&arg(&args, 0)));
    if needle.len() > haystack.len() {
        return Ok(JsValue::Number(-1.0));
    }
    let last_start = haystack.len() - needle.len();
    let from = match arg(&args, 1) {
        JsValue::Undefined => last_start,
        v => {
            let n = crate::runner::ds::operations::type_conversion::to_number(&v);
            if n.is_nan() {
                last_start
            } else {
                (n.max(0.0) as usize).min(last_start)
            }
        }
    };
    let found = (0..=from)
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == needle[..]);
    Ok(JsValue::Number(found.map(|i| i as f64).unwrap_or(-1.0)))
}

/// String.prototype.includes
fn string_includes(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let haystack = units(&this_string(&this, "includes")?);
    let needle = units(&to_string(&arg(&args, 0)));
    let from = to_integer(&arg(&args, 1)).max(0.0) as usize;
    Ok(JsValue::Boolean(find_units(&haystack, &needle, from).is_some()))
}

/// String.prototype.startsWith
fn string_starts_with(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let haystack = units(&this_string(&this, "startsWith")?);
    let needle = units(&to_string(&arg(&args, 0)));
    let start = (to_integer(&arg(&args, 1)).max(0.0) as usize).min(haystack.len());
    Ok(JsValue::Boolean(haystack[start..].starts_with(&needle)))
}

/// String.prototype.endsWith
fn string_ends_with(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let haystack = units(&this_string(&this, "endsWith")?);
    let needle = units(&to_string(&arg(&args, 0)));
    let end = match arg(&args, 1) {
        JsValue::Undefined => haystack.len(),
        v => (to_integer(&v).max(0.0) as usize).min(haystack.len()),
    };
    Ok(JsValue::Boolean(haystack[..end].ends_with(&needle)))
}

/// String.prototype.split: a string separator, or none to get `[s]`.
fn string_split(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "split")?;
    let limit = match arg(&args, 1) {
        JsValue::Undefined => usize::MAX,
        v => to_integer(&v).max(0.0) as usize,
    };
    let parts: Vec<String> = match arg(&args, 0) {
        JsValue::Undefined => vec![s],
        sep => {
            let sep = to_string(&sep);
            if sep.is_empty() {
                s.encode_utf16()
                    .map(|u| String::from_utf16_lossy(&[u]))
                    .collect()
            } else {
                s.split(sep.as_str()).map(str::to_string).collect()
            }
        }
    };
    Ok(new_array(
        parts.into_iter().take(limit).map(JsValue::String).collect(),
    ))
}

/// String.prototype.trim
fn string_trim(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this, "trim")?.trim().to_string()))
}

/// String.prototype.trimStart
fn string_trim_start(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(
        this_string(&this, "trimStart")?.trim_start().to_string(),
    ))
}

/// String.prototype.trimEnd
fn string_trim_end(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(
        this_string(&this, "trimEnd")?.trim_end().to_string(),
    ))
}

/// String.prototype.toUpperCase
fn string_to_upper_case(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(
        this_string(&this, "toUpperCase")?.to_uppercase(),
    ))
}

/// String.prototype.toLowerCase
fn string_to_lower_case(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(
        this_string(&this, "toLowerCase")?.to_lowercase(),
    ))
}

/// String.prototype.repeat
fn string_repeat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "repeat")?;
    let count = to_integer(&arg(&args, 0));
    if count < 0.0 || count.is_infinite() {
        return Err(JErrorType::RangeError(format!(
            "Invalid count value: {}",
            to_string(&arg(&args, 0))
        )));
    }
    check_string_length(s.len().saturating_mul(count as usize))?;
    Ok(JsValue::String(s.repeat(count as usize)))
}

fn padding(s: &str, args: &[JsValue]) -> Result<String, JErrorType> {
    let target = to_integer(&arg(args, 0)).max(0.0) as usize;
    let len = s.encode_utf16().count();
    let filler = match arg(args, 1) {
        JsValue::Undefined => vec![' ' as u16],
        v => units(&to_string(&v)),
    };
    if target <= len || filler.is_empty() {
        return Ok(String::new());
    }
    check_string_length(target)?;
    let pad: Vec<u16> = filler.iter().copied().cycle().take(target - len).collect();
    Ok(from_units(&pad))
}

/// String.prototype.padStart
fn string_pad_start(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "padStart")?;
    Ok(JsValue::String(padding(&s, &args)? + &s))
}

/// String.prototype.padEnd
fn string_pad_end(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "padEnd")?;
    let pad = padding(&s, &args)?;
    Ok(JsValue::String(s + &pad))
}

/// The text replacing one match: the result of a replacer function, or the
/// replacement string with `$&` expanded.
fn replacement_for(
    replacement: &JsValue,
    matched: &str,
    position: usize,
    subject: &str,
    ctx: &mut EvalContext,
) -> Result<String, JErrorType> {
    if is_callable(replacement) {
        let result = call_function(
            replacement,
            JsValue::Undefined,
            vec![
                JsValue::String(matched.to_string()),
                JsValue::Number(position as f64),
                JsValue::String(subject.to_string()),
            ],
            ctx,
        )?;
        Ok(to_string(&result))
    } else {
        Ok(to_string(replacement)
            .replace("$$", "\u{0}")
            .replace("$&", matched)
            .replace('\u{0}', "$"))
    }
}

fn replace_matches(
    this: JsValue,
    args: Vec<JsValue>,
    all: bool,
    ctx: &mut EvalContext,
) -> Result<JsValue, JErrorType> {
    let subject = this_string(&this, if all { "replaceAll" } else { "replace" })?;
    let pattern = to_string(&arg(&args, 0));
    let replacement = arg(&args, 1);

    let haystack = units(&subject);
    let needle = units(&pattern);
    let mut out: Vec<u16> = vec![];
    let mut cursor = 0;
    while let Some(pos) = find_units(&haystack, &needle, cursor) {
        if pos > haystack.len() {
            break;
        }
        out.extend_from_slice(&haystack[cursor..pos]);
        let replaced = replacement_for(&replacement, &pattern, pos, &subject, ctx)?;
        out.extend(replaced.encode_utf16());
        check_string_length(out.len())?;
        if needle.is_empty() {
            if pos < haystack.len() {
                out.push(haystack[pos]);
            }
            cursor = pos + 1;
        } else {
            cursor = pos + needle.len();
        }
        if !all || cursor > haystack.len() {
            break;
        }
    }
    if cursor <= haystack.len() {
        out.extend_from_slice(&haystack[cursor..]);
    }
    Ok(JsValue::String(from_units(&out)))
}

/// String.prototype.replace: first occurrence of a string pattern.
fn string_replace(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    replace_matches(this, args, false, ctx)
}

/// String.prototype.replaceAll
fn string_replace_all(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    replace_matches(this, args, true, ctx)
}

/// String.prototype.concat
fn string_concat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut s = this_string(&this, "concat")?;
    for a in &args {
        let part = to_string(a);
        check_string_length(s.len() + part.len())?;
        s.push_str(&part);
    }
    Ok(JsValue::String(s))
}

/// String.prototype.toString
fn string_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this, "toString")?))
}
