//! Severity-tagged problem reports.
//!
//! Diagnostics accumulate across the whole inspection pipeline. A component
//! only aborts its own pass when a condition is unrecoverable; everything else
//! is appended here and the caller decides the exit status from
//! [`Diagnostics::has_errors`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Something looked wrong but output is still meaningful
    Warning,
    /// A definite problem
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A single problem report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Short machine-friendly summary (e.g. `initDirErr`)
    pub summary: String,
    /// Human-readable detail
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(severity: Severity, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Error, summary, detail)
    }

    #[must_use]
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Warning, summary, detail)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}: {}", self.severity, self.summary)
        } else {
            write!(f, "{}: {}; {}", self.severity, self.summary, self.detail)
        }
    }
}

/// Ordered list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// True iff any entry is error-severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Re-labels diagnostics raised inside a child module call.
    #[must_use]
    pub fn in_module(self, qualified_name: &str) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|mut d| {
                    d.detail = if d.detail.is_empty() {
                        format!("module.{qualified_name}")
                    } else {
                        format!("module.{qualified_name}: {}", d.detail)
                    };
                    d
                })
                .collect(),
        )
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self(diagnostics)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors_only_for_error_severity() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_errors());

        diags.push(Diagnostic::warning("moduleDirErr", "no modules downloaded"));
        assert!(!diags.has_errors());

        diags.push(Diagnostic::error("initDirErr", "missing .terraform"));
        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_order_is_preserved() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::error("first", ""));
        diags.extend(Diagnostics::from(vec![
            Diagnostic::warning("second", ""),
            Diagnostic::error("third", ""),
        ]));
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_in_module_prefixes_detail() {
        let diags = Diagnostics::from(vec![
            Diagnostic::error("module path error", "source x not supported"),
            Diagnostic::warning("bare", ""),
        ])
        .in_module("db.network");

        let details: Vec<_> = diags.iter().map(|d| d.detail.clone()).collect();
        assert_eq!(
            details,
            vec![
                "module.db.network: source x not supported".to_string(),
                "module.db.network".to_string()
            ]
        );
    }

    #[test]
    fn test_serialized_as_plain_list() {
        let diags = Diagnostics::from(vec![Diagnostic::error("initDirErr", "")]);
        let json = serde_json::to_value(&diags).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "severity": "error", "summary": "initDirErr" }])
        );
    }
}
