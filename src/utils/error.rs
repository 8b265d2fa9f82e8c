//! Diagnostics for command-line output.
//!
//! Library errors stay [`EvalError`]; this module turns them into something
//! a terminal can show.

use std::fmt;

use crate::core::engine::{EvalError, EvalErrorKind};

/// Severity level for CLI diagnostics (determines coloring).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// Input that cannot produce a value (red)
    Error,
    /// Input that parsed but needs more from the caller (yellow)
    Warning,
    /// Informational (cyan)
    Info,
}

/// A message ready for the terminal.
#[derive(Debug, Clone)]
pub struct CliDiagnostic {
    pub severity: DiagnosticSeverity,
    /// Short kind label, e.g. "parse error"
    pub kind: String,
    pub message: String,
    /// Location context, e.g. "1:7"
    pub location: Option<String>,
}

impl CliDiagnostic {
    pub fn new(
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind: kind.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Build from an error, locating its span in `source` when it has one.
    pub fn from_error(err: &EvalError, source: &str) -> Self {
        let diagnostic = Self::from(err);
        match err.span {
            Some(span) => diagnostic.with_location(line_col(source, span.start)),
            None => diagnostic,
        }
    }

    /// Get ANSI color code for this diagnostic's severity.
    pub fn color_code(&self) -> &'static str {
        match self.severity {
            DiagnosticSeverity::Error => "\x1b[31m",
            DiagnosticSeverity::Warning => "\x1b[33m",
            DiagnosticSeverity::Info => "\x1b[36m",
        }
    }

    /// The diagnostic wrapped in its color.
    pub fn colored(&self) -> String {
        format!("{}{}\x1b[0m", self.color_code(), self)
    }
}

impl fmt::Display for CliDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "[{}] {}: {}", self.kind, loc, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

impl From<&EvalError> for CliDiagnostic {
    fn from(err: &EvalError) -> Self {
        let (severity, kind) = match &err.kind {
            EvalErrorKind::ParseError(_) => (DiagnosticSeverity::Error, "parse error"),
            EvalErrorKind::UnrecognizedSymbols(_) => {
                (DiagnosticSeverity::Error, "unrecognized symbols")
            }
            EvalErrorKind::WrongExecutionType { .. } | EvalErrorKind::WrongInputType { .. } => {
                (DiagnosticSeverity::Error, "type mismatch")
            }
            EvalErrorKind::DivisionByZero => (DiagnosticSeverity::Error, "division by zero"),
            EvalErrorKind::NonFiniteResult => (DiagnosticSeverity::Error, "non-finite result"),
            EvalErrorKind::MissingOperand(_) => (DiagnosticSeverity::Error, "missing operand"),
            EvalErrorKind::NonConvergence(_) => (DiagnosticSeverity::Error, "non-convergence"),
            EvalErrorKind::UnassignedVariable(_) => {
                (DiagnosticSeverity::Warning, "unassigned variable")
            }
            EvalErrorKind::IndexOutOfBounds { .. } => {
                (DiagnosticSeverity::Error, "index out of bounds")
            }
            EvalErrorKind::KeyNotFound(_) => (DiagnosticSeverity::Error, "key not found"),
        };
        CliDiagnostic::new(severity, kind, err.kind.to_string())
    }
}

impl From<EvalError> for CliDiagnostic {
    fn from(err: EvalError) -> Self {
        CliDiagnostic::from(&err)
    }
}

/// 1-based `line:col` of a byte offset.
fn line_col(source: &str, offset: usize) -> String {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    format!("{}:{}", line, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{parse, SourceSpan};

    #[test]
    fn test_diagnostic_from_parse_error() {
        let source = "[1,\n 2))";
        let err = parse(source).unwrap_err();
        let diag = CliDiagnostic::from_error(&err, source);
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert_eq!(diag.kind, "parse error");
        assert_eq!(diag.location.as_deref(), Some("2:3"));
        assert!(diag.colored().starts_with("\x1b[31m[parse error] 2:3: "));
    }

    #[test]
    fn test_unassigned_is_a_warning() {
        let err = EvalError::unassigned("rate");
        let diag = CliDiagnostic::from(err);
        assert_eq!(diag.severity, DiagnosticSeverity::Warning);
        assert!(diag.location.is_none());
    }

    #[test]
    fn test_line_col() {
        assert_eq!(line_col("abc", 0), "1:1");
        assert_eq!(line_col("ab\ncd", 4), "2:2");
        let span = SourceSpan::at(1);
        assert_eq!(line_col("x\ny", span.start + 1), "2:1");
    }
}
