//! Severity levels for diagnostics.

use std::fmt;

/// How serious a diagnostic is.
///
/// Every rule of the definition language reports [`Severity::Error`];
/// [`Severity::Warning`] is reserved for advisory findings that leave the
/// definition usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The definition is rejected.
    Error,

    /// The definition is accepted but worth a second look.
    Warning,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}
