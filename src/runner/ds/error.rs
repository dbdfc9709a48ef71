use thiserror::Error;

use crate::runner::ds::value::JsValue;

/// An abrupt evaluation outcome.
///
/// The native error kinds are materialized into error objects only when a
/// script catches them. `Halted` and `Suspended` can never be caught.
#[derive(Debug, Clone, Error)]
pub enum JErrorType {
    #[error("ReferenceError: {0}")]
    ReferenceError(String),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
    #[error("Uncaught {0}")]
    Thrown(JsValue),
    #[error("RangeError: {0}")]
    Halted(String),
    /// An `await` parked the rest of the async function body. Unwinds to the
    /// async call without running `catch` or `finally` blocks.
    #[error("async function suspended")]
    Suspended,
}

impl JErrorType {
    /// Constructor name of the error, `None` for thrown values.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            JErrorType::ReferenceError(_) => Some("ReferenceError"),
            JErrorType::TypeError(_) => Some("TypeError"),
            JErrorType::RangeError(_) | JErrorType::Halted(_) => Some("RangeError"),
            JErrorType::SyntaxError(_) => Some("SyntaxError"),
            JErrorType::Thrown(_) | JErrorType::Suspended => None,
        }
    }

    /// What `err.message` evaluates to in a `catch` block for this error.
    pub fn message(&self) -> String {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m)
            | JErrorType::Halted(m) => m.clone(),
            JErrorType::Thrown(JsValue::Object(o)) => match o.borrow().get_own("message") {
                Some(v) => v.to_string(),
                None => "undefined".to_string(),
            },
            JErrorType::Thrown(_) => "undefined".to_string(),
            JErrorType::Suspended => String::new(),
        }
    }

    pub fn is_catchable(&self) -> bool {
        !matches!(self, JErrorType::Halted(_) | JErrorType::Suspended)
    }
}
