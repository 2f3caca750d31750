//! Labeled source spans attached to diagnostics.

use crate::span::Span;

/// A message pinned to a range of the definition text.
///
/// The primary label marks the offending token; secondary labels point at
/// related places, such as the first definition of a duplicated label:
///
/// ```text
/// error[159E]: this label has already been defined
///   |
/// 1 | foo: appA && foo: appB
///   | ---          ^^^ label already defined
///   | |
///   | first defined here
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_label() {
        let label = Label::primary(Span::new(5..8), "label already defined");

        assert_eq!(label.span(), Span::new(5..8));
        assert_eq!(label.message(), "label already defined");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_secondary_label() {
        let label = Label::secondary(Span::new(0..3), "first defined here");

        assert_eq!(label.span().start(), 0);
        assert_eq!(label.span().end(), 3);
        assert!(label.is_secondary());
    }
}
