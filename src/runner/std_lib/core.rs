//! Core built-ins registration.

use crate::runner::plugin::registry::BuiltInRegistry;

use super::array;
use super::bigint;
use super::console;
use super::error;
use super::function;
use super::json;
use super::math;
use super::number;
use super::object;
use super::promise;
use super::string;
use super::symbol;
use super::timers;

/// Register all core built-in objects with the registry.
pub fn register_core_builtins(registry: &mut BuiltInRegistry) {
    // Object first: every other class falls back to its instance methods.
    object::register(registry);
    function::register(registry);
    array::register(registry);
    string::register(registry);
    number::register(registry);
    bigint::register(registry);
    symbol::register(registry);
    math::register(registry);
    json::register(registry);
    error::register(registry);
    console::register(registry);
    promise::register(registry);
    timers::register(registry);
}
