//! # jsprimer - runnable JavaScript lessons
//!
//! Runs short JavaScript teaching snippets in an embedded interpreter and
//! hands back everything they printed, or the error that stopped them.
//!
//! - **[`snippet`]** - the snippet executor, console interception and output sink
//! - **[`parser`]** - PEG parser and AST types
//! - **[`runner`]** - values, the tree-walking interpreter and the built-in library
//!   - **[`runner::plugin`]** - built-in registry and super-global scope
//!   - **[`runner::ds`]** - data structures (values, objects, environments)
//!   - **[`runner::eval`]** - statement and expression evaluation
//! - **[`course`]** - the topic catalog and the event-loop walkthrough
//! - **[`config`]** - `jsprimer.toml` loading
//!
//! ## Quick Start
//!
//! ```
//! use jsprimer::snippet::SnippetExecutor;
//!
//! let executor = SnippetExecutor::new();
//! let result = executor.run(r#"
//!     const squares = [1, 2, 3].map(n => n * n);
//!     console.log(squares.join(", "));
//!     console.log(typeof squares, squares.length);
//! "#);
//! assert!(result.is_success());
//! assert_eq!(result.text(), "1, 4, 9\nobject 3");
//! ```
//!
//! Snippets that print nothing succeed with a placeholder:
//!
//! ```
//! use jsprimer::snippet::{ExecutionResult, SnippetExecutor, NO_OUTPUT_PLACEHOLDER};
//!
//! let result = SnippetExecutor::new().run("let x = 1 + 1;");
//! assert_eq!(result, ExecutionResult::Success(NO_OUTPUT_PLACEHOLDER.to_string()));
//! ```
//!
//! ## Parsing only
//!
//! ```
//! use jsprimer::parser::JsParser;
//!
//! let ast = JsParser::parse_to_ast_from_str("var x = 5 + 3;").unwrap();
//! assert_eq!(ast.body.len(), 1);
//! ```

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod course;
pub mod parser;
pub mod runner;
pub mod snippet;
