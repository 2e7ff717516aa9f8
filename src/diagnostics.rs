//! Diagnostic infrastructure.
//!
//! The transform assumes well-typed input, so everything reported here is a
//! programming error in the pipeline rather than a user error: an ES2015
//! construct the dispatcher does not recognize, or an internal invariant
//! break (an object literal flagged as containing computed properties that
//! contains none, an unbalanced lexical environment). Diagnostics carry the
//! file name and one-based line/column of the offending node's source
//! position.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

impl DiagnosticSeverity {
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub file_name: String,
    /// One-based; 0 when no location is known.
    pub line: u32,
    /// One-based; 0 when no location is known.
    pub column: u32,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, file_name: impl Into<String>, line: u32, column: u32) -> Diagnostic {
        Diagnostic {
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            file_name: file_name.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(
                f,
                "{}({},{}): {}: {}",
                self.file_name, self.line, self.column, self.severity, self.message
            )
        } else {
            write!(f, "{}: {}: {}", self.file_name, self.severity, self.message)
        }
    }
}

/// Diagnostics collected over one transform.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> DiagnosticBag {
        DiagnosticBag::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let d = Diagnostic::error("unexpected kind", "a.ts", 3, 7);
        assert_eq!(d.to_string(), "a.ts(3,7): error: unexpected kind");
    }

    #[test]
    fn bag_tracks_errors() {
        let mut bag = DiagnosticBag::new();
        assert!(!bag.has_errors());
        bag.push(Diagnostic::error("boom", "a.ts", 0, 0));
        assert!(bag.has_errors());
        assert_eq!(bag.len(), 1);
    }
}
