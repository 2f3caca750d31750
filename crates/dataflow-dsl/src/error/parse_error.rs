//! The error type returned by the parsers.
//!
//! [`ParseError`] wraps the diagnostics of a failed parse together with the
//! definition text and the checkpoint, the offset up to which the text was
//! known to be well formed.

use std::fmt;

use crate::error::Diagnostic;

/// A type alias for `Result<T, Diagnostic>`.
///
/// Tokenizing and parsing stop at the first problem, so the internal
/// functions carry a single diagnostic.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Error type for parsing and validating a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
    expression: String,
    checkpoint: usize,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            expression: String::new(),
            checkpoint: 0,
        }
    }

    /// Attach the definition text and the last known good offset.
    pub fn with_source(mut self, expression: impl Into<String>, checkpoint: usize) -> Self {
        self.expression = expression.into();
        self.checkpoint = checkpoint;
        self
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The definition text that failed to parse.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Offset up to which the definition parsed successfully.
    pub fn checkpoint(&self) -> usize {
        self.checkpoint
    }

    /// Offset of the first problem.
    pub fn position(&self) -> usize {
        self.diagnostics
            .first()
            .and_then(Diagnostic::position)
            .unwrap_or_default()
    }

    /// The first diagnostic rendered with the definition line it points at
    /// and a caret under the failing offset. A `*` marks the checkpoint when
    /// it lies earlier on the same line.
    ///
    /// ```text
    /// 154E:(pos 2): transition conditions must be quoted literals, numerics or '*' but 'abc' is not
    /// A abc->B
    ///   ^
    /// ```
    pub fn annotated(&self) -> String {
        let Some(first) = self.diagnostics.first() else {
            return String::new();
        };
        let position = self.position().min(self.expression.len());
        let line_start = self.expression[..position]
            .rfind('\n')
            .map_or(0, |offset| offset + 1);
        let line_end = self.expression[position..]
            .find('\n')
            .map_or(self.expression.len(), |offset| position + offset);
        let column = position - line_start;

        let mut rendered = first.formatted_message();
        rendered.push('\n');
        rendered.push_str(&self.expression[line_start..line_end]);
        rendered.push('\n');
        if self.checkpoint > line_start && self.checkpoint < position {
            let checkpoint_column = self.checkpoint - line_start;
            rendered.push_str(&" ".repeat(checkpoint_column));
            rendered.push('*');
            rendered.push_str(&" ".repeat(column - checkpoint_column - 1));
        } else {
            rendered.push_str(&" ".repeat(column));
        }
        rendered.push('^');
        rendered
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_parse_error_from_diagnostic() {
        let err: ParseError = ErrorCode::E112.diagnostic(Span::new(3..3), &[]).into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.position(), 3);
        assert_eq!(err.expression(), "");
    }

    #[test]
    fn test_parse_error_display_multiple() {
        let diags = vec![
            Diagnostic::error("first error"),
            Diagnostic::error("second error"),
            Diagnostic::error("third error"),
        ];
        let err: ParseError = diags.into();

        assert_eq!(err.to_string(), "error: first error (+2 more)");
    }

    #[test]
    fn test_annotated_without_checkpoint() {
        let err = ParseError::from(ErrorCode::E154.diagnostic(Span::new(2..5), &["abc"]))
            .with_source("A abc->B", 0);

        assert_eq!(
            err.annotated(),
            "154E:(pos 2): transition conditions must be quoted literals, numerics or '*' \
             but 'abc' is not\nA abc->B\n  ^"
        );
    }

    #[test]
    fn test_annotated_with_checkpoint() {
        let err = ParseError::from(ErrorCode::E100.diagnostic(Span::new(11..12), &["|"]))
            .with_source("time | log |", 4);

        assert_eq!(err.checkpoint(), 4);
        assert_eq!(
            err.annotated(),
            "100E:(pos 11): Found unexpected data after stream definition: '|'\n\
             time | log |\n    *      ^"
        );
    }

    #[test]
    fn test_annotated_points_into_the_failing_line() {
        let err = ParseError::from(ErrorCode::E158.diagnostic(Span::new(15..19), &[]))
            .with_source("appA;foo: appB\nappC", 0);

        assert_eq!(
            err.annotated(),
            "158E:(pos 15): secondary sequences must have labels or are unreachable\nappC\n^"
        );
    }

    #[test]
    fn test_annotated_empty() {
        assert_eq!(ParseError::new(Vec::new()).annotated(), "");
    }
}
