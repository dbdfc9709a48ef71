//! Tree-walking evaluation of the AST.
//!
//! Statements produce [`Completion`] records; throw completions travel as
//! `Err(JErrorType)` so `?` unwinds through nested evaluation.

pub mod expression;
pub mod function;
pub mod statement;
pub mod types;

use std::rc::Rc;

use crate::parser::ast::{FunctionData, ProgramData};
use crate::runner::ds::object::new_script_function;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

pub use types::{Completion, CompletionType, EvalResult, ValueResult};

/// Run a script at global scope and return the value of its last expression
/// statement.
pub fn evaluate_program(program: &ProgramData, ctx: &mut EvalContext) -> ValueResult {
    {
        let global = ctx.global_env().clone();
        let mut global = global.borrow_mut();
        for name in &program.var_names {
            if !global.has_binding(name) {
                global.create_mutable_binding(name);
                global.initialize_binding(name, JsValue::Undefined);
            }
        }
    }
    function::instantiate_block_declarations(&program.body, ctx);
    let completion = statement::execute_statement_list(&program.body, ctx)?;
    Ok(completion.get_value())
}

/// Invoke `body` as an immediately-invoked function closing over the global
/// scope, with `this` undefined.
pub fn evaluate_function_body(body: Rc<FunctionData>, ctx: &mut EvalContext) -> ValueResult {
    let global = ctx.global_env().clone();
    let f = new_script_function(body, global, None);
    function::call_function(&f, JsValue::Undefined, vec![], ctx)
}
