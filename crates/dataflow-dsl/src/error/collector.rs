//! Collector for accumulating diagnostics during validation.
//!
//! Syntax errors stop the parser at the first problem; semantic checks keep
//! going and report everything they find through a [`DiagnosticCollector`].

use crate::error::{Diagnostic, ParseError};

/// Accumulates diagnostics and turns them into a single result.
///
/// ```text
/// let mut collector = DiagnosticCollector::new();
/// collector.emit(ErrorCode::E160.diagnostic(span, &[]));
/// collector.emit(ErrorCode::E158.diagnostic(other, &[]));
/// let result = collector.finish(); // Err with both diagnostics
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Errors mark the collection as failed.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Number of diagnostics recorded so far.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Finish collection.
    ///
    /// Returns `Err` with every diagnostic when at least one error was
    /// emitted. Warnings alone are dropped.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_collector_new_finish_ok() {
        let collector = DiagnosticCollector::new();
        assert!(collector.is_empty());
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_collector_emit_warning_finish_ok() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::warning("split runs a single flow"));

        assert_eq!(collector.len(), 1);
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_collector_keeps_every_error() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(ErrorCode::E160.diagnostic(Span::new(4..7), &[]));
        collector.emit(Diagnostic::warning("warning"));
        collector.emit(ErrorCode::E158.diagnostic(Span::new(12..16), &[]));

        let err = collector.finish().unwrap_err();
        assert_eq!(err.diagnostics().len(), 3);
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E160));
        assert_eq!(err.diagnostics()[2].code(), Some(ErrorCode::E158));
    }
}
