//! Scan diagnostics.
//!
//! A scan never fails because of one package. Anything skipped along the
//! way is recorded here and returned with the scan result; the caller
//! decides how to report it.

use serde::{Deserialize, Serialize};

/// Diagnostic codes.
pub mod codes {
    pub const SCAN_ROOT_UNREADABLE: &str = "SCAN_ROOT_UNREADABLE";
    pub const SCAN_NAMESPACE_UNREADABLE: &str = "SCAN_NAMESPACE_UNREADABLE";
    pub const SCAN_NESTED_NAMESPACE: &str = "SCAN_NESTED_NAMESPACE";
    pub const SCAN_MANIFEST_INVALID: &str = "SCAN_MANIFEST_INVALID";
    pub const SCAN_EXPORTS_INVALID: &str = "SCAN_EXPORTS_INVALID";
    pub const SCAN_EXPORTS_EXHAUSTED: &str = "SCAN_EXPORTS_EXHAUSTED";
    pub const SCAN_WILDCARD_MISMATCH: &str = "SCAN_WILDCARD_MISMATCH";
    pub const SCAN_PATTERN_INVALID: &str = "SCAN_PATTERN_INVALID";
    pub const SCAN_FILES_UNREADABLE: &str = "SCAN_FILES_UNREADABLE";
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Part of a package was skipped.
    Warn,
    /// A whole package (or directory) was skipped.
    Error,
}

/// One thing the scan skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostic {
    /// Stable error code.
    pub code: String,
    pub severity: Severity,
    /// Package the diagnostic belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Path where the problem was found.
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ScanDiagnostic {
    fn new(
        code: &str,
        severity: Severity,
        package: Option<&str>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.to_string(),
            severity,
            package: package.map(str::to_string),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning: something inside a package was skipped.
    #[must_use]
    pub fn warn(
        code: &str,
        package: Option<&str>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, Severity::Warn, package, path, message)
    }

    /// Create an error: a package or directory was skipped.
    #[must_use]
    pub fn error(
        code: &str,
        package: Option<&str>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, Severity::Error, package, path, message)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
