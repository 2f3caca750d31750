//! Error and diagnostic system for the definition parsers.
//!
//! Problems are reported as [`Diagnostic`]s: a stable [`ErrorCode`], the
//! formatted message, and labeled spans into the definition text. A failed
//! parse returns a [`ParseError`] carrying one diagnostic for syntax errors
//! or every diagnostic found by validation.
//!
//! # Example
//!
//! ```
//! # use dataflow_dsl::error::{Diagnostic, ErrorCode};
//! # use dataflow_dsl::Span;
//! let diag = ErrorCode::E143.diagnostic(
//!     Span::new(17..31),
//!     &["foo", "timestamp", "0", "timestamp", "1"],
//! );
//!
//! assert_eq!(diag.code(), Some(ErrorCode::E143));
//! assert!(diag.formatted_message().starts_with("143E:(pos 17): label 'foo'"));
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
