//! The evaluation facility: values, environments, the tree-walking
//! interpreter and the built-in library.

pub mod ds;
pub mod eval;
pub mod plugin;
pub mod std_lib;
