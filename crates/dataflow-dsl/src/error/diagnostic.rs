//! The core diagnostic type.
//!
//! A [`Diagnostic`] is one problem found in a definition: a severity, an
//! optional [`ErrorCode`], the formatted message and the spans it refers to.

use std::fmt;

use crate::{
    error::{ErrorCode, Label, Severity},
    span::Span,
};

/// A single problem with source location information.
///
/// # Example
///
/// ```
/// # use dataflow_dsl::error::{Diagnostic, ErrorCode};
/// # use dataflow_dsl::Span;
/// let diag = Diagnostic::error("this label has already been defined")
///     .with_code(ErrorCode::E159)
///     .with_label(Span::new(13..16), "label already defined")
///     .with_secondary_label(Span::new(0..3), "first defined here");
///
/// assert_eq!(diag.position(), Some(13));
/// assert_eq!(diag.to_string(), "error[159E]: this label has already been defined");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Offset of the first primary label, the place the problem is reported at.
    pub fn position(&self) -> Option<usize> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(|label| label.span().start())
    }

    /// Renders the message the way the definition language reports problems:
    /// `"{code}:(pos {p}): {message}"`.
    pub fn formatted_message(&self) -> String {
        let mut rendered = String::new();
        if let Some(code) = self.code {
            rendered.push_str(code.as_str());
            rendered.push(':');
        }
        if let Some(position) = self.position() {
            rendered.push_str(&format!("(pos {position}): "));
        }
        rendered.push_str(&self.message);
        rendered
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
