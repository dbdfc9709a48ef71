//! JSON built-in.
//!
//! `JSON.parse` goes through `serde_json` and converts the resulting tree
//! into script values; `JSON.stringify` walks script values itself, since
//! replacers, `toJSON` and cycle detection need the evaluator.

use std::rc::Rc;

use serde_json::Value;

use crate::parser::{ensure_stack, format_number};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{new_array, object_from_properties, to_property_key, ObjectKind};
use crate::runner::ds::operations::test_and_comparison::is_callable;
use crate::runner::ds::operations::type_conversion::{to_integer, to_string};
use crate::runner::ds::value::{JsObjectType, JsValue};
use crate::runner::eval::expression::{get_property, own_enumerable_entries, set_property};
use crate::runner::eval::function::call_function;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the JSON object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let json = BuiltInObject::new("JSON")
        .add_method("parse", json_parse)
        .add_method("stringify", json_stringify);

    registry.register_object(json);
}

// ============================================================================
// JSON.parse
// ============================================================================

/// JSON.parse(text, reviver)
fn json_parse(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let text = to_string(&arg(&args, 0));
    let tree: Value = serde_json::from_str(&text).map_err(|e| {
        JErrorType::SyntaxError(format!("Unexpected token in JSON ({})", e))
    })?;
    let value = from_json(tree);

    let reviver = arg(&args, 1);
    if !is_callable(&reviver) {
        return Ok(value);
    }
    let root = object_from_properties(vec![(String::new(), value)]);
    revive(&root, "", &reviver, ctx)
}

/// Convert a parsed JSON tree into script values.
pub fn from_json(value: Value) -> JsValue {
    match value {
        Value::Null => JsValue::Null,
        Value::Bool(b) => JsValue::Boolean(b),
        Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => JsValue::String(s),
        Value::Array(items) => new_array(items.into_iter().map(from_json).collect()),
        Value::Object(map) => {
            object_from_properties(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

/// Apply a reviver bottom-up. Returning `undefined` removes the property.
fn revive(
    holder: &JsValue,
    key: &str,
    reviver: &JsValue,
    ctx: &mut EvalContext,
) -> Result<JsValue, JErrorType> {
    let value = get_property(holder, key, ctx)?;
    if let JsValue::Object(o) = &value {
        let keys: Vec<String> = o.borrow().own_keys();
        for k in keys {
            let revived = revive(&value, &k, reviver, ctx)?;
            match revived {
                JsValue::Undefined if !o.borrow().is_array() => {
                    o.borrow_mut().delete(&k)?;
                }
                revived => set_property(&value, &k, revived)?,
            }
        }
    }
    call_function(
        reviver,
        holder.clone(),
        vec![JsValue::String(key.to_string()), value],
        ctx,
    )
}

// ============================================================================
// JSON.stringify
// ============================================================================

/// JSON.stringify(value, replacer, space)
fn json_stringify(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let value = arg(&args, 0);
    let mut serializer = Serializer::new(&arg(&args, 1), &arg(&args, 2));
    let holder = object_from_properties(vec![(String::new(), value.clone())]);
    Ok(match serializer.serialize(&holder, "", value, ctx)? {
        Some(text) => JsValue::String(text),
        None => JsValue::Undefined,
    })
}

struct Serializer {
    replacer: Option<JsValue>,
    allowlist: Option<Vec<String>>,
    gap: String,
    indent: String,
    stack: Vec<JsObjectType>,
}

impl Serializer {
    fn new(replacer: &JsValue, space: &JsValue) -> Self {
        let mut allowlist = None;
        let mut replacer_fn = None;
        if is_callable(replacer) {
            replacer_fn = Some(replacer.clone());
        } else if let JsValue::Object(o) = replacer {
            if o.borrow().is_array() {
                let mut keys: Vec<String> = vec![];
                let items = o.borrow().array_elements().cloned().unwrap_or_default();
                for item in items {
                    let key = match &item {
                        JsValue::String(_) | JsValue::Number(_) => to_property_key(&item),
                        _ => continue,
                    };
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                allowlist = Some(keys);
            }
        }

        let gap = match space {
            JsValue::Number(_) => " ".repeat(to_integer(space).clamp(0.0, 10.0) as usize),
            JsValue::String(s) => s.chars().take(10).collect(),
            _ => String::new(),
        };
        Serializer {
            replacer: replacer_fn,
            allowlist,
            gap,
            indent: String::new(),
            stack: vec![],
        }
    }

    /// Text for `holder[key]`, `None` when the value is skipped
    /// (undefined, symbols and functions).
    fn serialize(
        &mut self,
        holder: &JsValue,
        key: &str,
        mut value: JsValue,
        ctx: &mut EvalContext,
    ) -> Result<Option<String>, JErrorType> {
        if let JsValue::Object(_) = &value {
            let to_json = get_property(&value, "toJSON", ctx)?;
            if is_callable(&to_json) {
                value = call_function(
                    &to_json,
                    value.clone(),
                    vec![JsValue::String(key.to_string())],
                    ctx,
                )?;
            }
        }
        if let Some(replacer) = &self.replacer {
            value = call_function(
                replacer,
                holder.clone(),
                vec![JsValue::String(key.to_string()), value],
                ctx,
            )?;
        }

        match &value {
            JsValue::Undefined | JsValue::Symbol(_) => Ok(None),
            JsValue::BigInt(_) => Err(JErrorType::TypeError(
                "Do not know how to serialize a BigInt".to_string(),
            )),
            JsValue::Null => Ok(Some("null".to_string())),
            JsValue::Boolean(b) => Ok(Some(b.to_string())),
            JsValue::Number(n) if n.is_finite() => Ok(Some(format_number(*n))),
            JsValue::Number(_) => Ok(Some("null".to_string())),
            JsValue::String(s) => quote(s).map(Some),
            JsValue::Object(o) => {
                if o.borrow().is_callable() {
                    return Ok(None);
                }
                if self.stack.iter().any(|seen| Rc::ptr_eq(seen, o)) {
                    return Err(JErrorType::TypeError(
                        "Converting circular structure to JSON".to_string(),
                    ));
                }
                self.stack.push(o.clone());
                let result = ensure_stack(|| {
                    if matches!(o.borrow().kind, ObjectKind::Array(_)) {
                        self.serialize_array(&value, o, ctx)
                    } else {
                        self.serialize_object(&value, ctx)
                    }
                });
                self.stack.pop();
                result.map(Some)
            }
        }
    }

    fn serialize_array(
        &mut self,
        value: &JsValue,
        o: &JsObjectType,
        ctx: &mut EvalContext,
    ) -> Result<String, JErrorType> {
        let stepback = self.indent.clone();
        self.indent.push_str(&self.gap);
        let items = o.borrow().array_elements().cloned().unwrap_or_default();
        let mut parts = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let text = self.serialize(value, &i.to_string(), item, ctx)?;
            parts.push(text.unwrap_or_else(|| "null".to_string()));
        }
        let text = self.wrap('[', ']', parts, &stepback);
        self.indent = stepback;
        Ok(text)
    }

    fn serialize_object(&mut self, value: &JsValue, ctx: &mut EvalContext) -> Result<String, JErrorType> {
        let stepback = self.indent.clone();
        self.indent.push_str(&self.gap);
        let entries: Vec<(String, JsValue)> = match &self.allowlist {
            Some(keys) => {
                let mut entries = vec![];
                for k in keys.clone() {
                    let v = get_property(value, &k, ctx)?;
                    entries.push((k, v));
                }
                entries
            }
            None => own_enumerable_entries(value),
        };
        let separator = if self.gap.is_empty() { ":" } else { ": " };
        let mut parts = vec![];
        for (k, v) in entries {
            if let Some(text) = self.serialize(value, &k, v, ctx)? {
                parts.push(format!("{}{}{}", quote(&k)?, separator, text));
            }
        }
        let text = self.wrap('{', '}', parts, &stepback);
        self.indent = stepback;
        Ok(text)
    }

    fn wrap(&self, open: char, close: char, parts: Vec<String>, stepback: &str) -> String {
        if parts.is_empty() {
            format!("{}{}", open, close)
        } else if self.gap.is_empty() {
            format!("{}{}{}", open, parts.join(","), close)
        } else {
            let separator = format!(",\n{}", self.indent);
            format!(
                "{}\n{}{}\n{}{}",
                open,
                self.indent,
                parts.join(&separator),
                stepback,
                close
            )
        }
    }
}

/// A JSON string literal for `s`.
fn quote(s: &str) -> Result<String, JErrorType> {
    serde_json::to_string(s).map_err(|e| JErrorType::TypeError(e.to_string()))
}
