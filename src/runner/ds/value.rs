use std::cell::RefCell;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::parser::format_number;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObject;
use crate::runner::ds::operations::type_conversion::to_string;

pub type JsObjectType = Rc<RefCell<JsObject>>;

/// Longest string a script may build, in bytes.
pub const MAX_STRING_LENGTH: usize = 1 << 26;

/// Fail with `Invalid string length` when a result would exceed
/// [`MAX_STRING_LENGTH`]; checked before the string is allocated.
pub fn check_string_length(len: usize) -> Result<(), JErrorType> {
    if len > MAX_STRING_LENGTH {
        Err(JErrorType::RangeError("Invalid string length".to_string()))
    } else {
        Ok(())
    }
}

/// Prefix of the hidden property keys symbols are stored under.
pub const SYMBOL_KEY_PREFIX: &str = "\u{0}@@symbol:";

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A symbol. Two symbols are never equal, whatever their descriptions.
#[derive(Debug)]
pub struct JsSymbol {
    id: u64,
    pub description: Option<String>,
}

impl JsSymbol {
    pub fn new(description: Option<String>) -> Rc<JsSymbol> {
        Rc::new(JsSymbol {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description,
        })
    }

    /// Key of the properties keyed by this symbol. Key enumeration skips it.
    pub fn property_key(&self) -> String {
        format!("{}{}", SYMBOL_KEY_PREFIX, self.id)
    }
}

/// `Symbol(description)`, as `String(symbol)` renders it.
impl Display for JsSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    /// BigInts are limited to the `i128` range.
    BigInt(i128),
    String(String),
    Symbol(Rc<JsSymbol>),
    Object(JsObjectType),
}

impl JsValue {
    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn as_object(&self) -> Option<&JsObjectType> {
        match self {
            JsValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Renders the value as `String(value)` would.
impl Display for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_string(self))
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "JsValue::Undefined"),
            JsValue::Null => write!(f, "JsValue::Null"),
            JsValue::Boolean(b) => write!(f, "JsValue::Boolean({})", b),
            JsValue::String(s) => write!(f, "JsValue::String({:?})", s),
            JsValue::Number(n) => write!(f, "JsValue::Number({})", format_number(*n)),
            JsValue::BigInt(n) => write!(f, "JsValue::BigInt({})", n),
            JsValue::Symbol(s) => write!(f, "JsValue::Symbol({})", s),
            JsValue::Object(o) => match o.try_borrow() {
                Ok(obj) => write!(f, "JsValue::Object({})", obj.class_name()),
                Err(_) => write!(f, "JsValue::Object(...)"),
            },
        }
    }
}

/// Identity for objects, `SameValueZero`-like for primitives except that `NaN != NaN`.
impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::BigInt(a), JsValue::BigInt(b)) => a == b,
            (JsValue::Symbol(a), JsValue::Symbol(b)) => Rc::ptr_eq(a, b),
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(s.to_string())
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(s)
    }
}
