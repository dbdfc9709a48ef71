//! Runtime data structures: values, objects, scopes and the conversions
//! between them.

pub mod env_record;
pub mod error;
pub mod object;
pub mod operations;
pub mod value;
