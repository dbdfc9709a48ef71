use std::cell::RefCell;
use std::rc::Rc;

use crate::parser::ast::FunctionData;
use crate::parser::format_number;
use crate::runner::ds::env_record::EnvRef;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::{JsObjectType, JsValue, SYMBOL_KEY_PREFIX};
use crate::runner::plugin::types::BuiltInFn;

pub struct Property {
    pub key: String,
    pub value: JsValue,
    pub enumerable: bool,
}

pub struct ScriptFunction {
    pub data: Rc<FunctionData>,
    /// Scope the function closes over.
    pub env: EnvRef,
}

pub struct NativeFunction {
    pub name: String,
    pub func: BuiltInFn,
    pub is_constructor: bool,
}

pub enum FunctionKind {
    Script(ScriptFunction),
    Native(NativeFunction),
}

pub enum PromiseState {
    Pending,
    Fulfilled(JsValue),
    Rejected(JsValue),
}

/// A `then` registration waiting for its promise to settle.
pub struct PromiseReaction {
    pub on_fulfilled: Option<JsValue>,
    pub on_rejected: Option<JsValue>,
    pub derived: JsObjectType,
}

pub struct PromiseData {
    pub state: PromiseState,
    pub reactions: Vec<PromiseReaction>,
}

pub enum ObjectKind {
    Ordinary,
    Array(Vec<JsValue>),
    Function(FunctionKind),
    Error,
    Promise(PromiseData),
}

pub struct JsObject {
    pub kind: ObjectKind,
    properties: Vec<Property>,
    /// Prototype link for objects created by `new` on script functions.
    pub prototype: Option<JsObjectType>,
    pub frozen: bool,
}

/// Longest array a script may build. Arrays are stored densely, so a write
/// far past the end has to allocate every slot before it.
pub const MAX_ARRAY_LENGTH: usize = 1 << 22;

/// Fail with `Invalid array length` when `len` exceeds [`MAX_ARRAY_LENGTH`].
pub fn check_array_length(len: usize) -> Result<(), JErrorType> {
    if len > MAX_ARRAY_LENGTH {
        Err(JErrorType::RangeError("Invalid array length".to_string()))
    } else {
        Ok(())
    }
}

/// Parse `key` as a canonical array index (`"0"`, `"12"`, not `"01"`).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<usize>().ok()
}

impl JsObject {
    pub fn new(kind: ObjectKind) -> Self {
        JsObject {
            kind,
            properties: vec![],
            prototype: None,
            frozen: false,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Error => "Error",
            ObjectKind::Promise(_) => "Promise",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array(_))
    }

    pub fn array_elements(&self) -> Option<&Vec<JsValue>> {
        match &self.kind {
            ObjectKind::Array(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn array_elements_mut(&mut self) -> Option<&mut Vec<JsValue>> {
        match &mut self.kind {
            ObjectKind::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// An own property, including the virtual `length` and indices of arrays.
    pub fn get_own(&self, key: &str) -> Option<JsValue> {
        if let ObjectKind::Array(elements) = &self.kind {
            if key == "length" {
                return Some(JsValue::Number(elements.len() as f64));
            }
            if let Some(index) = array_index(key) {
                return elements.get(index).cloned();
            }
        }
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.clone())
    }

    pub fn has_own(&self, key: &str) -> bool {
        if let ObjectKind::Array(elements) = &self.kind {
            if key == "length" {
                return true;
            }
            if let Some(index) = array_index(key) {
                return index < elements.len();
            }
        }
        self.properties.iter().any(|p| p.key == key)
    }

    /// Assignment semantics: fails on frozen objects, grows arrays.
    pub fn set(&mut self, key: &str, value: JsValue) -> Result<(), JErrorType> {
        if self.frozen {
            return Err(JErrorType::TypeError(format!(
                "Cannot assign to read only property '{}' of object",
                key
            )));
        }
        if let ObjectKind::Array(elements) = &mut self.kind {
            if key == "length" {
                let n = to_number(&value);
                if n < 0.0 || n.fract() != 0.0 || n > MAX_ARRAY_LENGTH as f64 {
                    return Err(JErrorType::RangeError("Invalid array length".to_string()));
                }
                elements.resize(n as usize, JsValue::Undefined);
                return Ok(());
            }
            if let Some(index) = array_index(key) {
                if index >= elements.len() {
                    check_array_length(index.saturating_add(1))?;
                    elements.resize(index + 1, JsValue::Undefined);
                }
                elements[index] = value;
                return Ok(());
            }
        }
        self.define(key, value, true);
        Ok(())
    }

    /// Create or overwrite a property regardless of `frozen`.
    pub fn define(&mut self, key: &str, value: JsValue, enumerable: bool) {
        match self.properties.iter_mut().find(|p| p.key == key) {
            Some(p) => p.value = value,
            None => self.properties.push(Property {
                key: key.to_string(),
                value,
                enumerable,
            }),
        }
    }

    pub fn delete(&mut self, key: &str) -> Result<bool, JErrorType> {
        if self.frozen && self.has_own(key) {
            return Err(JErrorType::TypeError(format!(
                "Cannot delete property '{}' of object",
                key
            )));
        }
        if let ObjectKind::Array(elements) = &mut self.kind {
            if let Some(index) = array_index(key) {
                if index < elements.len() {
                    elements[index] = JsValue::Undefined;
                }
                return Ok(true);
            }
        }
        self.properties.retain(|p| p.key != key);
        Ok(true)
    }

    /// Enumerable own keys in property order: integer keys ascending, then the
    /// rest in insertion order.
    pub fn own_keys(&self) -> Vec<String> {
        let mut keys = vec![];
        if let ObjectKind::Array(elements) = &self.kind {
            keys.extend((0..elements.len()).map(|i| i.to_string()));
        }
        let mut integer_keys: Vec<(usize, String)> = vec![];
        let mut other_keys = vec![];
        for p in self
            .properties
            .iter()
            .filter(|p| p.enumerable && !p.key.starts_with(SYMBOL_KEY_PREFIX))
        {
            match array_index(&p.key) {
                Some(i) => integer_keys.push((i, p.key.clone())),
                None => other_keys.push(p.key.clone()),
            }
        }
        integer_keys.sort_by_key(|(i, _)| *i);
        keys.extend(integer_keys.into_iter().map(|(_, k)| k));
        keys.extend(other_keys);
        keys
    }
}

/// Look `key` up on `obj` and then along its prototype links.
pub fn lookup_property(obj: &JsObjectType, key: &str) -> Option<JsValue> {
    let mut current = Some(obj.clone());
    while let Some(o) = current {
        let o_ref = o.borrow();
        if let Some(v) = o_ref.get_own(key) {
            return Some(v);
        }
        current = o_ref.prototype.clone();
    }
    None
}

fn wrap(obj: JsObject) -> JsValue {
    JsValue::Object(Rc::new(RefCell::new(obj)))
}

pub fn new_object() -> JsValue {
    wrap(JsObject::new(ObjectKind::Ordinary))
}

pub fn object_from_properties(properties: Vec<(String, JsValue)>) -> JsValue {
    let mut obj = JsObject::new(ObjectKind::Ordinary);
    for (key, value) in properties {
        obj.define(&key, value, true);
    }
    wrap(obj)
}

pub fn new_array(elements: Vec<JsValue>) -> JsValue {
    wrap(JsObject::new(ObjectKind::Array(elements)))
}

pub fn new_error(name: &str, message: &str) -> JsValue {
    let mut obj = JsObject::new(ObjectKind::Error);
    obj.define("name", JsValue::String(name.to_string()), false);
    obj.define("message", JsValue::String(message.to_string()), false);
    wrap(obj)
}

pub fn new_promise() -> JsObjectType {
    Rc::new(RefCell::new(JsObject::new(ObjectKind::Promise(PromiseData {
        state: PromiseState::Pending,
        reactions: vec![],
    }))))
}

pub fn new_native_function(name: &str, func: BuiltInFn, is_constructor: bool) -> JsValue {
    let mut obj = JsObject::new(ObjectKind::Function(FunctionKind::Native(NativeFunction {
        name: name.to_string(),
        func,
        is_constructor,
    })));
    obj.define("name", JsValue::String(name.to_string()), false);
    obj.define("length", JsValue::Number(0.0), false);
    wrap(obj)
}

pub fn new_script_function(data: Rc<FunctionData>, env: EnvRef, name: Option<&str>) -> JsValue {
    let name = data
        .id
        .clone()
        .or_else(|| name.map(|n| n.to_string()))
        .unwrap_or_default();
    let length = data.length() as f64;
    let mut obj = JsObject::new(ObjectKind::Function(FunctionKind::Script(ScriptFunction {
        data,
        env,
    })));
    obj.define("name", JsValue::String(name), false);
    obj.define("length", JsValue::Number(length), false);
    wrap(obj)
}

/// Property key for a computed member access (`o[1]` reads `"1"`).
pub fn to_property_key(value: &JsValue) -> String {
    match value {
        JsValue::Number(n) => format_number(*n),
        JsValue::Symbol(s) => s.property_key(),
        other => other.to_string(),
    }
}
