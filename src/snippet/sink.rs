//! Per-execution capture of console lines.

use std::cell::RefCell;
use std::rc::Rc;

/// What a run with no captured lines reports.
pub const NO_OUTPUT_PLACEHOLDER: &str = "Code executed successfully (no output)";

/// Ordered lines captured during one execution.
///
/// Clones share the same buffer, so the writers installed by the
/// interceptor and the executor that drains the sink see the same lines.
#[derive(Debug, Clone, Default)]
pub struct OutputSink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl OutputSink {
    pub fn new() -> Self {
        OutputSink::default()
    }

    /// Append one line. Empty lines are kept.
    pub fn append(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    /// Take every captured line, joined with `\n`, or the placeholder when
    /// nothing was captured. The sink is empty afterwards.
    pub fn drain(&self) -> String {
        let lines = std::mem::take(&mut *self.lines.borrow_mut());
        if lines.is_empty() {
            NO_OUTPUT_PLACEHOLDER.to_string()
        } else {
            lines.join("\n")
        }
    }
}
