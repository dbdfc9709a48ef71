//! Statement execution.

use crate::parser::ast::{
    BlockStatementData, CatchClauseData, ExpressionType, ForBinding, ForInit, ForIteratorData,
    PatternType, StatementType, SwitchCaseData, VariableDeclarationData, VariableDeclarationKind,
};
use crate::parser::ensure_stack;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::new_error;
use crate::runner::ds::operations::test_and_comparison::strict_equality;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::expression::{evaluate_expression, evaluate_named, iterate_values};
use super::function::{bind_pattern, instantiate_block_declarations, BindingKind};
use super::types::{Completion, CompletionType, EvalResult};

/// Execute a statement and return its completion.
pub fn execute_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    ensure_stack(|| execute_statement_kind(stmt, ctx))
}

fn execute_statement_kind(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    ctx.tick()?;
    match stmt {
        StatementType::EmptyStatement | StatementType::FunctionDeclaration(_) => {
            Ok(Completion::normal())
        }

        StatementType::ExpressionStatement { expression } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }

        StatementType::BlockStatement(block) => execute_block_statement(block, ctx),

        StatementType::VariableDeclaration(decl) => {
            execute_variable_declaration(decl, ctx)?;
            Ok(Completion::normal())
        }

        StatementType::IfStatement {
            test,
            consequent,
            alternate,
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                execute_statement(consequent, ctx)
            } else if let Some(alternate) = alternate {
                execute_statement(alternate, ctx)
            } else {
                Ok(Completion::normal())
            }
        }

        StatementType::WhileStatement { test, body } => execute_while_statement(test, body, ctx),

        StatementType::DoWhileStatement { body, test } => {
            execute_do_while_statement(body, test, ctx)
        }

        StatementType::ForStatement {
            init,
            test,
            update,
            body,
        } => execute_for_statement(init.as_ref(), test.as_ref(), update.as_ref(), body, ctx),

        StatementType::ForInStatement(data) => execute_for_in_statement(data, ctx),

        StatementType::ForOfStatement(data) => execute_for_of_statement(data, ctx),

        StatementType::SwitchStatement {
            discriminant,
            cases,
        } => execute_switch_statement(discriminant, cases, ctx),

        StatementType::BreakStatement => Ok(Completion::break_completion()),

        StatementType::ContinueStatement => Ok(Completion::continue_completion()),

        StatementType::ReturnStatement { argument } => {
            let value = match argument {
                Some(arg) => evaluate_expression(arg, ctx)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::return_value(value))
        }

        StatementType::ThrowStatement { argument } => {
            let value = evaluate_expression(argument, ctx)?;
            Err(JErrorType::Thrown(value))
        }

        StatementType::TryStatement {
            block,
            handler,
            finalizer,
        } => execute_try_statement(block, handler.as_ref(), finalizer.as_ref(), ctx),
    }
}

/// Execute statements in order, stopping at the first abrupt completion.
pub fn execute_statement_list(body: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut last = Completion::normal();
    for statement in body {
        let completion = execute_statement(statement, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion.update_empty(last.get_value()));
        }
        if completion.value.is_some() {
            last = completion;
        }
    }
    Ok(last)
}

/// Execute a block statement in its own scope.
fn execute_block_statement(block: &BlockStatementData, ctx: &mut EvalContext) -> EvalResult {
    ctx.with_block_scope(|ctx| {
        instantiate_block_declarations(&block.body, ctx);
        execute_statement_list(&block.body, ctx)
    })
}

fn binding_kind(kind: VariableDeclarationKind) -> BindingKind {
    match kind {
        VariableDeclarationKind::Var => BindingKind::Var,
        VariableDeclarationKind::Let => BindingKind::Let,
        VariableDeclarationKind::Const => BindingKind::Const,
    }
}

/// Execute a variable declaration.
fn execute_variable_declaration(
    decl: &VariableDeclarationData,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    let kind = binding_kind(decl.kind);
    for declarator in &decl.declarations {
        match &declarator.init {
            Some(init) => {
                let value = match &declarator.id {
                    PatternType::Identifier(name) => evaluate_named(init, name, ctx)?,
                    _ => evaluate_expression(init, ctx)?,
                };
                bind_pattern(&declarator.id, value, kind, ctx)?;
            }
            // `var x;` was hoisted with its value.
            None if kind == BindingKind::Var => {}
            None => bind_pattern(&declarator.id, JsValue::Undefined, kind, ctx)?,
        }
    }
    Ok(())
}

/// `Some` ends the loop with that completion.
fn loop_exit(completion: Completion) -> Option<Completion> {
    match completion.completion_type {
        CompletionType::Break => Some(Completion::normal()),
        CompletionType::Return => Some(completion),
        CompletionType::Normal | CompletionType::Continue => None,
    }
}

/// Execute a while statement.
fn execute_while_statement(
    test: &ExpressionType,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    while to_boolean(&evaluate_expression(test, ctx)?) {
        if let Some(done) = loop_exit(execute_statement(body, ctx)?) {
            return Ok(done);
        }
    }
    Ok(Completion::normal())
}

/// Execute a do-while statement.
fn execute_do_while_statement(
    body: &StatementType,
    test: &ExpressionType,
    ctx: &mut EvalContext,
) -> EvalResult {
    loop {
        if let Some(done) = loop_exit(execute_statement(body, ctx)?) {
            return Ok(done);
        }
        if !to_boolean(&evaluate_expression(test, ctx)?) {
            return Ok(Completion::normal());
        }
    }
}

/// Execute a for statement. A `let`/`const` head gives every iteration a
/// fresh copy of the loop bindings, so closures capture per-iteration values.
fn execute_for_statement(
    init: Option<&ForInit>,
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    ctx.with_block_scope(|ctx| {
        let per_iteration = matches!(
            init,
            Some(ForInit::VariableDeclaration(d)) if d.kind != VariableDeclarationKind::Var
        );
        match init {
            Some(ForInit::VariableDeclaration(decl)) => execute_variable_declaration(decl, ctx)?,
            Some(ForInit::Expression(e)) => {
                evaluate_expression(e, ctx)?;
            }
            None => {}
        }
        if per_iteration {
            next_iteration_scope(ctx);
        }
        loop {
            if let Some(test) = test {
                if !to_boolean(&evaluate_expression(test, ctx)?) {
                    break;
                }
            }
            if let Some(done) = loop_exit(execute_statement(body, ctx)?) {
                return Ok(done);
            }
            if per_iteration {
                next_iteration_scope(ctx);
            }
            if let Some(update) = update {
                evaluate_expression(update, ctx)?;
            }
        }
        Ok(Completion::normal())
    })
}

fn next_iteration_scope(ctx: &mut EvalContext) {
    let copy = ctx.lex_env.borrow().copy_for_iteration();
    ctx.lex_env = copy;
}

/// Execute a for-in statement over enumerable keys, own keys first and then
/// those inherited through prototype links.
fn execute_for_in_statement(data: &ForIteratorData, ctx: &mut EvalContext) -> EvalResult {
    let object = evaluate_expression(&data.right, ctx)?;
    let keys: Vec<JsValue> = match &object {
        JsValue::Object(o) => {
            let mut keys: Vec<String> = vec![];
            let mut current = Some(o.clone());
            while let Some(obj) = current {
                for key in obj.borrow().own_keys() {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                current = obj.borrow().prototype.clone();
            }
            keys.into_iter().map(JsValue::String).collect()
        }
        JsValue::String(s) => (0..s.chars().count())
            .map(|i| JsValue::String(i.to_string()))
            .collect(),
        _ => vec![],
    };
    execute_iteration(&data.left, &data.body, keys, ctx)
}

/// Execute a for-of statement over an array's elements or a string's characters.
fn execute_for_of_statement(data: &ForIteratorData, ctx: &mut EvalContext) -> EvalResult {
    let iterable = evaluate_expression(&data.right, ctx)?;
    let values = iterate_values(&iterable)?;
    execute_iteration(&data.left, &data.body, values, ctx)
}

fn execute_iteration(
    left: &ForBinding,
    body: &StatementType,
    values: Vec<JsValue>,
    ctx: &mut EvalContext,
) -> EvalResult {
    for value in values {
        let completion = ctx.with_block_scope(|ctx| {
            match left {
                ForBinding::Declaration(kind, pattern) => {
                    bind_pattern(pattern, value, binding_kind(*kind), ctx)?
                }
                ForBinding::Identifier(name) => ctx.set_binding(name, value)?,
            }
            execute_statement(body, ctx)
        })?;
        if let Some(done) = loop_exit(completion) {
            return Ok(done);
        }
    }
    Ok(Completion::normal())
}

/// Execute a switch statement. Cases are matched with `===` and fall through
/// until a `break`.
fn execute_switch_statement(
    discriminant: &ExpressionType,
    cases: &[SwitchCaseData],
    ctx: &mut EvalContext,
) -> EvalResult {
    let value = evaluate_expression(discriminant, ctx)?;
    ctx.with_block_scope(|ctx| {
        for case in cases {
            instantiate_block_declarations(&case.consequent, ctx);
        }
        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if strict_equality(&value, &evaluate_expression(test, ctx)?) {
                    start = Some(i);
                    break;
                }
            }
        }
        let start = match start.or_else(|| cases.iter().position(|c| c.test.is_none())) {
            Some(start) => start,
            None => return Ok(Completion::normal()),
        };
        for case in &cases[start..] {
            for statement in &case.consequent {
                let completion = execute_statement(statement, ctx)?;
                match completion.completion_type {
                    CompletionType::Normal => {}
                    CompletionType::Break => return Ok(Completion::normal()),
                    CompletionType::Return | CompletionType::Continue => return Ok(completion),
                }
            }
        }
        Ok(Completion::normal())
    })
}

/// Execute a try statement. An abrupt `finally` overrides the outcome of the
/// `try`/`catch` blocks. Uncatchable exits skip the `finally` block too.
fn execute_try_statement(
    block: &BlockStatementData,
    handler: Option<&CatchClauseData>,
    finalizer: Option<&BlockStatementData>,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut result = execute_block_statement(block, ctx);

    let caught = match (&result, handler) {
        (Err(err), Some(handler)) if err.is_catchable() => Some((error_to_js_value(err), handler)),
        _ => None,
    };
    if let Some((thrown, handler)) = caught {
        result = ctx.with_block_scope(|ctx| {
            if let Some(param) = &handler.param {
                bind_pattern(param, thrown, BindingKind::Let, ctx)?;
            }
            execute_block_statement(&handler.body, ctx)
        });
    }

    if matches!(&result, Err(e) if !e.is_catchable()) {
        return result;
    }
    if let Some(finalizer) = finalizer {
        let completion = execute_block_statement(finalizer, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
    }
    result
}

/// The value a `catch` clause binds for an error.
pub fn error_to_js_value(err: &JErrorType) -> JsValue {
    match err {
        JErrorType::Thrown(value) => value.clone(),
        other => new_error(other.name().unwrap_or("Error"), &other.message()),
    }
}
