//! Utility modules
//!
//! Terminal diagnostics and machine-readable reports for the CLI.

pub mod error;
pub mod report;

pub use error::{CliDiagnostic, DiagnosticSeverity};
pub use report::{ValueReport, VariableRecord};
