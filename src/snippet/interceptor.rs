//! Scoped redirection of the console channels into an [`OutputSink`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::console::{format_args, ConsoleBindings, ConsoleWriter};

use super::sink::OutputSink;

/// The console bindings a host shares with its executions.
pub type SharedBindings = Rc<RefCell<ConsoleBindings>>;

/// Prefix of lines written through the error channel.
pub const ERROR_PREFIX: &str = "Error: ";

/// Writes each call as one line into a sink.
pub struct SinkWriter {
    sink: OutputSink,
    prefix: Option<&'static str>,
}

impl SinkWriter {
    pub fn new(sink: OutputSink) -> Self {
        SinkWriter { sink, prefix: None }
    }

    /// A writer whose lines start with `"Error: "`.
    pub fn error_channel(sink: OutputSink) -> Self {
        SinkWriter {
            sink,
            prefix: Some(ERROR_PREFIX),
        }
    }
}

impl ConsoleWriter for SinkWriter {
    fn write(&self, args: &[JsValue]) {
        let text = format_args(args);
        match self.prefix {
            Some(prefix) => self.sink.append(format!("{}{}", prefix, text)),
            None => self.sink.append(text),
        }
    }
}

/// Replaces both console channels for as long as it is installed.
///
/// The bindings captured by [`install`](Self::install) are put back by
/// [`restore`](Self::restore) or, at the latest, when the guard is dropped.
pub struct ConsoleInterceptor {
    target: SharedBindings,
    saved: Option<ConsoleBindings>,
}

impl ConsoleInterceptor {
    /// An interceptor for `target` that has not replaced anything yet.
    pub fn new(target: SharedBindings) -> Self {
        ConsoleInterceptor {
            target,
            saved: None,
        }
    }

    /// Point both channels of `target` at `sink`.
    ///
    /// Installing again while installed redirects to the new sink but keeps
    /// the bindings saved the first time.
    pub fn install(&mut self, sink: &OutputSink) {
        let redirected = ConsoleBindings::new(
            Rc::new(SinkWriter::new(sink.clone())),
            Rc::new(SinkWriter::error_channel(sink.clone())),
        );
        let previous = std::mem::replace(&mut *self.target.borrow_mut(), redirected);
        if self.saved.is_none() {
            self.saved = Some(previous);
        }
        tracing::trace!("console intercepted");
    }

    pub fn is_installed(&self) -> bool {
        self.saved.is_some()
    }

    /// Put back the saved bindings. A no-op when nothing is installed.
    pub fn restore(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.target.borrow_mut() = saved;
            tracing::trace!("console restored");
        }
    }
}

impl Drop for ConsoleInterceptor {
    fn drop(&mut self) {
        self.restore();
    }
}
