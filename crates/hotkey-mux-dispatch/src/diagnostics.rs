//! Severity-tagged diagnostics from registration
//!
//! Conflicts are reported here rather than returned, unless the caller asked
//! for the `error` conflict policy.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable identifier, e.g. `hotkey::conflict`
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }
}

/// Receives diagnostics.
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: Diagnostic);
}

impl<D: DiagnosticSink + ?Sized> DiagnosticSink for Rc<D> {
    fn emit(&self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic)
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!(code = diagnostic.code, "{}", diagnostic.message),
            Severity::Error => tracing::error!(code = diagnostic.code, "{}", diagnostic.message),
        }
    }
}

/// Keeps every diagnostic for later inspection. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Rc<RefCell<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.records.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.records
            .borrow()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.records.borrow_mut().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_shares_records() {
        let sink = RecordingSink::new();
        let view = sink.clone();

        sink.emit(Diagnostic::warning("hotkey::conflict", "twice"));
        sink.emit(Diagnostic::error("hotkey::other", "broken"));

        assert_eq!(view.diagnostics().len(), 2);
        assert_eq!(view.warnings().len(), 1);
        assert_eq!(view.warnings()[0].message, "twice");

        view.clear();
        assert!(sink.diagnostics().is_empty());
    }
}
