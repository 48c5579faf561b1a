//! Error types for tfinspect.
//!
//! This module defines the error hierarchy using `thiserror`. Most failures
//! inside the inspection pipeline are recoverable and end up on the
//! [`Diagnostics`](crate::diagnostics::Diagnostics) channel; an
//! [`InspectError`] only crosses the public boundary when nothing useful can be
//! produced (for example a root directory that cannot be read at all).
//!
//! # Error Categories
//!
//! - **IO errors**: unreadable directories and files
//! - **Parse errors**: HCL syntax failures in configuration files
//! - **Metadata errors**: unreadable, malformed, or mis-shaped provider metadata
//! - **Config errors**: invalid `tfinspect.yaml` files
//! - **Report errors**: rendering failures
//!
//! # Example
//!
//! ```rust
//! use tfinspect::error::{InspectError, Result};
//!
//! fn read_metadata(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).map_err(|e| InspectError::MetadataRead {
//!         path: path.into(),
//!         source: e,
//!         src_path: file!(),
//!         src_line: line!(),
//!     })
//! }
//! ```

use crate::diagnostics::{Diagnostic, Severity};
use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(DirectoryNotFound { path: dir.to_path_buf() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident: $value:expr),* $(,)? }) => {
        $crate::error::InspectError::$variant {
            $($field: $value,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for tfinspect operations.
pub type Result<T> = std::result::Result<T, InspectError>;

/// The main error type for tfinspect.
#[derive(Error, Debug)]
pub enum InspectError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Directory not found or not readable.
    #[error("Directory not found: {path} ({src_path}:{src_line})")]
    DirectoryNotFound {
        /// The missing directory path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // HCL Parsing Errors
    // =========================================================================
    /// HCL parsing error.
    #[error("Failed to parse HCL in '{file}' ({src_path}:{src_line}): {message}")]
    HclParse {
        /// The file being parsed
        file: PathBuf,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Provider Metadata Errors
    // =========================================================================
    /// The metadata document could not be read.
    #[error("Failed to read metadata file '{path}' ({src_path}:{src_line}): {source}")]
    MetadataRead {
        /// Path of the metadata document
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The metadata document is not valid JSON or not a JSON object.
    #[error("Failed to unmarshal metadata json '{path}' ({src_path}:{src_line}): {message}")]
    MetadataParse {
        /// Path (or label) of the metadata document
        path: PathBuf,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// A metadata value does not have the shape its field requires.
    #[error("Metadata field '{field}' of '{record}' expected {expected}, found {found} ({src_path}:{src_line})")]
    MetadataShape {
        /// Resource or data source type plus attribute name
        record: String,
        /// Field name within the record
        field: String,
        /// Expected JSON shape
        expected: &'static str,
        /// Actual JSON shape
        found: &'static str,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        /// The configuration key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    /// Report generation error.
    #[error("Failed to generate report ({src_path}:{src_line}): {message}")]
    ReportGeneration {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Internal error (should not happen in normal operation).
    #[error("Internal error ({src_path}:{src_line}): {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },
}

impl InspectError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
        src_path: &'static str,
        src_line: u32,
    ) -> Self {
        Self::Io {
            path: path.into(),
            source,
            src_path,
            src_line,
        }
    }

    /// Returns the appropriate exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::DirectoryNotFound { .. } => 15,
            Self::MetadataRead { .. } | Self::MetadataParse { .. } => 16,
            Self::ConfigParse { .. } => 18,
            Self::ConfigValue { .. } => 19,
            _ => 1,
        }
    }

    /// Converts the error into an error-severity diagnostic with the given summary.
    #[must_use]
    pub fn to_diagnostic(&self, summary: &str) -> Diagnostic {
        let severity = match self {
            Self::MetadataShape { .. } => Severity::Warning,
            _ => Severity::Error,
        };
        Diagnostic::new(severity, summary, self.detail())
    }

    /// Error message without the source-location suffix, for user-facing diagnostics.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Io { path, source, .. } => format!("{}: {source}", path.display()),
            Self::DirectoryNotFound { path, .. } => {
                format!("Directory {} does not exist or cannot be read", path.display())
            }
            Self::HclParse { file, message, .. } => format!("{}: {message}", file.display()),
            Self::MetadataRead { path, source, .. } => {
                format!("Failed to read metadataPath file {} {source}", path.display())
            }
            Self::MetadataParse { path, message, .. } => {
                format!("Failed to unmarshal metadata json {}: {message}", path.display())
            }
            Self::MetadataShape {
                record,
                field,
                expected,
                found,
                ..
            } => format!("{record}: field '{field}' expected {expected}, found {found}"),
            Self::ConfigParse { message, .. }
            | Self::ReportGeneration { message, .. }
            | Self::Internal { message, .. } => message.clone(),
            Self::ConfigValue { key, message, .. } => format!("{key}: {message}"),
        }
    }
}

impl From<serde_json::Error> for InspectError {
    fn from(source: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization/deserialization error: {source}"),
            src_path: file!(),
            src_line: line!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_err_macro_records_location() {
        let error = crate::err!(DirectoryNotFound {
            path: PathBuf::from("/missing"),
        });
        match &error {
            InspectError::DirectoryNotFound { src_path, src_line, .. } => {
                assert!(src_path.ends_with("error.rs"));
                assert!(*src_line > 0);
            }
            _ => panic!("Expected DirectoryNotFound"),
        }
        assert_eq!(error.exit_code(), 15);
    }

    #[test]
    fn test_shape_error_becomes_warning() {
        let error = crate::err!(MetadataShape {
            record: "ibm_is_vpc.name".to_string(),
            field: "hidden".to_string(),
            expected: "boolean",
            found: "string",
        });
        let diagnostic = error.to_diagnostic("metadataShapeErr");
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(
            diagnostic.detail,
            "ibm_is_vpc.name: field 'hidden' expected boolean, found string"
        );
    }

    #[test]
    fn test_parse_error_becomes_error_diagnostic() {
        let error = crate::err!(MetadataParse {
            path: PathBuf::from("meta.json"),
            message: "expected value at line 1".to_string(),
        });
        let diagnostic = error.to_diagnostic("unmarshalErr");
        assert_eq!(diagnostic.severity, Severity::Error);
        assert!(diagnostic.detail.contains("meta.json"));
    }
}
