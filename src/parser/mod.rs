mod api;
pub mod ast;
#[cfg(test)]
mod numeric_string_unit_tests;
pub mod static_semantics;
mod util;

pub use api::{parse_numeric_literal, JsParser, ParseError, Rule, MAX_NESTING_DEPTH};
pub use util::{ensure_stack, format_number};
