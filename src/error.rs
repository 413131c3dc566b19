//! Error handling for survey workbook sessions
//!
//! Every failure surfaces as a single terminal [`SurveyError`]. Nothing is retried: the
//! caller either shows the generic user message or, for storage failures, degrades silently.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// SURVEY ERRORS
// =============================================================================

/// Result alias used across the library.
pub type SurveyResult<T> = Result<T, SurveyError>;

/// Failures raised by the survey core and its collaborators.
#[derive(Debug, Error)]
pub enum SurveyError {
    /// The uploaded bytes are not a workbook we can read, or it has no worksheet.
    #[error("unrecognized workbook '{name}': {reason}")]
    UnrecognizedFile { name: String, reason: String },

    /// Serializing the workbook for download failed.
    #[error("workbook export failed: {reason}")]
    ExportFailed { reason: String },

    /// The persistent store could not be read or written.
    #[error("session store error: {reason}")]
    Storage { reason: String },

    /// Configuration file could not be loaded.
    #[error("configuration error in {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// Row position does not belong to an indexed entity.
    #[error("row {row} is not an indexed entity")]
    UnknownRow { row: u32 },

    /// Column position is not part of the extracted schema.
    #[error("column {column} is not part of the schema")]
    UnknownField { column: u32 },

    /// Source-optional cells carry their exemption from the file and cannot be toggled.
    #[error("cell {row}-{column} is optional in the source file and cannot be toggled")]
    NotToggleable { row: u32, column: u32 },
}

impl SurveyError {
    pub fn unrecognized(name: impl Into<String>, reason: impl ToString) -> Self {
        SurveyError::UnrecognizedFile {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn storage(reason: impl ToString) -> Self {
        SurveyError::Storage {
            reason: reason.to_string(),
        }
    }

    /// Error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            SurveyError::UnrecognizedFile { .. } => "load_failure",
            SurveyError::ExportFailed { .. } => "export_failure",
            SurveyError::Storage { .. } => "storage_unavailable",
            SurveyError::Config { .. } => "config_error",
            SurveyError::UnknownRow { .. } | SurveyError::UnknownField { .. } => {
                "resource_not_found"
            }
            SurveyError::NotToggleable { .. } => "validation_error",
        }
    }

    /// The single generic message shown to the person filling the survey.
    pub fn user_message(&self) -> &'static str {
        match self {
            SurveyError::UnrecognizedFile { .. } => {
                "Erreur: Structure du fichier non reconnue ou fichier invalide."
            }
            SurveyError::ExportFailed { .. } => "Export failed",
            SurveyError::Storage { .. } => "Session non sauvegardée.",
            SurveyError::Config { .. } => "Configuration invalide.",
            SurveyError::UnknownRow { .. } | SurveyError::UnknownField { .. } => {
                "Champ ou auditoire introuvable."
            }
            SurveyError::NotToggleable { .. } => "Ce champ est facultatif dans le fichier source.",
        }
    }
}

impl From<serde_json::Error> for SurveyError {
    fn from(err: serde_json::Error) -> Self {
        SurveyError::storage(err)
    }
}

impl From<std::io::Error> for SurveyError {
    fn from(err: std::io::Error) -> Self {
        SurveyError::storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failures_share_one_user_message() {
        let a = SurveyError::unrecognized("a.xlsx", "zip error");
        let b = SurveyError::unrecognized("b.txt", "no worksheet");
        assert_eq!(a.user_message(), b.user_message());
        assert_eq!(a.category(), "load_failure");
    }

    #[test]
    fn io_errors_map_to_storage() {
        let err: SurveyError = std::io::Error::other("disk gone").into();
        assert_eq!(err.category(), "storage_unavailable");
        assert!(err.to_string().contains("disk gone"));
    }
}
