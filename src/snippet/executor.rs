//! Runs one snippet and classifies the outcome.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info_span};
use uuid::Uuid;

use crate::parser::JsParser;
use crate::runner::ds::error::JErrorType;
use crate::runner::eval::evaluate_function_body;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{EvalContext, ExecutionLimits};
use crate::runner::std_lib::console::ConsoleBindings;

use super::interceptor::{ConsoleInterceptor, SharedBindings};
use super::sink::OutputSink;

/// Outcome of one [`SnippetExecutor::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The captured transcript, or the no-output placeholder.
    Success(String),
    /// `"Error: "` followed by the error's message.
    Failure(String),
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    /// The transcript or the failure message.
    pub fn text(&self) -> &str {
        match self {
            ExecutionResult::Success(text) | ExecutionResult::Failure(text) => text,
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Evaluates snippets as the body of an immediately-invoked function, with
/// console output captured for the duration of each run.
///
/// Each run gets a fresh realm: nothing a snippet defines survives into
/// the next one. Work a snippet defers (timers, promise reactions) is
/// dropped when the run ends.
pub struct SnippetExecutor {
    bindings: SharedBindings,
    registry: Rc<BuiltInRegistry>,
    limits: ExecutionLimits,
}

impl SnippetExecutor {
    /// An executor whose console writes to the process's stdout/stderr
    /// outside of runs.
    pub fn new() -> Self {
        SnippetExecutor::with_bindings(ConsoleBindings::host())
    }

    pub fn with_bindings(bindings: ConsoleBindings) -> Self {
        SnippetExecutor {
            bindings: Rc::new(RefCell::new(bindings)),
            registry: Rc::new(BuiltInRegistry::with_core()),
            limits: ExecutionLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The console bindings currently in effect.
    pub fn bindings(&self) -> ConsoleBindings {
        self.bindings.borrow().clone()
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    /// Run `code` and report the captured output or the error. Never fails.
    pub fn run(&self, code: &str) -> ExecutionResult {
        let execution_id = Uuid::new_v4();
        let span = info_span!("snippet", %execution_id, code_len = code.len());
        let _entered = span.enter();

        let sink = OutputSink::new();
        let mut interceptor = ConsoleInterceptor::new(self.bindings.clone());
        interceptor.install(&sink);

        let outcome = self.evaluate(code);
        interceptor.restore();

        let lines = sink.len();
        let result = match outcome {
            Ok(()) => ExecutionResult::Success(sink.drain()),
            Err(message) => ExecutionResult::Failure(format!("Error: {}", message)),
        };
        debug!(success = result.is_success(), lines, "snippet finished");
        result
    }

    /// Parse and evaluate in a fresh realm; `Err` carries the error message.
    fn evaluate(&self, code: &str) -> Result<(), String> {
        let body = JsParser::parse_function_body(code).map_err(|e| {
            debug!(line = e.line, column = e.column, "snippet failed to parse");
            e.message
        })?;

        let mut ctx = EvalContext::new(self.registry.clone(), self.bindings(), self.limits);
        let outcome = evaluate_function_body(body, &mut ctx);

        let discarded = ctx.take_jobs();
        if !discarded.is_empty() {
            debug!(jobs = discarded.len(), "discarding deferred jobs");
        }
        debug!(steps = ctx.steps(), "evaluation finished");

        outcome.map(|_| ()).map_err(|e: JErrorType| e.message())
    }
}

impl Default for SnippetExecutor {
    fn default() -> Self {
        SnippetExecutor::new()
    }
}
