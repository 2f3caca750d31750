//! # Dataflow DSL
//!
//! Parsers for the two definition languages of a data pipeline platform:
//!
//! - **Streams** chain apps with pipes, optionally reading from and writing
//!   to named destinations: `:orders > filter --expression=true | log`.
//! - **Composed tasks** run task apps in sequence (`&&`), in parallel
//!   (`<a || b>`), and branch on exit statuses (`a 'FAILED'->cleanup`).
//!
//! Parsing goes from text to tokens to a syntax tree. Task trees can be
//! checked with [`validate_task`] and lowered to an executable
//! [`Graph`](graph::Graph), which renders back into definition text.
//!
//! ## Usage
//!
//! ```
//! # use dataflow_dsl::{parse_stream, parse_task, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let stream = parse_stream(Some("ticktock"), "time | log")?;
//!     assert_eq!(stream.apps().len(), 2);
//!
//!     let task = parse_task(Some("nightly"), "extract && <clean || index>", false, true)?;
//!     assert!(task.is_composed());
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod error;
pub mod graph;
pub mod validate;
pub mod visitor;

mod cursor;
mod lexer;
mod parser;
mod span;
mod tokens;

pub use lexer::{Dialect, is_valid_name, tokenize};
pub use parser::{parse_stream, parse_task};
pub use span::{Span, Spanned};
pub use tokens::{Token, TokenKind, TokenStream};
pub use validate::validate_task;
