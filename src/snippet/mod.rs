//! Snippet execution with captured console output.
//!
//! ```
//! use jsprimer::snippet::{ExecutionResult, SnippetExecutor};
//!
//! let executor = SnippetExecutor::new();
//! assert_eq!(
//!     executor.run("console.log('Start'); console.log('End')"),
//!     ExecutionResult::Success("Start\nEnd".to_string())
//! );
//! assert_eq!(
//!     executor.run("throw new Error('boom')"),
//!     ExecutionResult::Failure("Error: boom".to_string())
//! );
//! ```

pub mod executor;
pub mod interceptor;
pub mod sink;

pub use executor::{ExecutionResult, SnippetExecutor};
pub use interceptor::{ConsoleInterceptor, SharedBindings, SinkWriter};
pub use sink::{OutputSink, NO_OUTPUT_PLACEHOLDER};
