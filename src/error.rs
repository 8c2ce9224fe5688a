//! Structured error types for the merge engine.
//!
//! Fatal errors stop a run before (or instead of) processing rows. Row-scoped
//! errors are recorded against the failing row and the run moves on.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// The unified error type returned by all public formletter API functions.
#[derive(Error, Debug)]
pub enum MergeError {
    /// One or more required top-level inputs are missing.
    #[error("All fields are required! Missing: {}", .0.join(", "))]
    Precondition(Vec<String>),

    /// A placeholder names a field that the data source does not have.
    #[error("Tag '{tag}' not found in CSV headers: [{}]", .headers.join(", "))]
    UnknownTag { tag: String, headers: Vec<String> },

    /// A numeric setting could not be parsed.
    #[error("Invalid value for {field}: '{value}' is not a number")]
    NumericParse { field: &'static str, value: String },

    /// A setting parsed but is out of its accepted range.
    #[error("Invalid value for {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    /// The font family is not one of the supported built-in families.
    #[error("Unknown font '{0}' (expected Helvetica, Times-Roman or Courier)")]
    UnknownFont(String),

    /// The template PDF cannot be used.
    #[error("Template error: {0}")]
    Template(String),

    /// Building or composing a PDF page failed.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// An output file could not be created.
    #[error("Cannot write {}: {source}", .path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The data source could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The data source failed partway through a run. `written` lists the
    /// documents produced before the failure.
    #[error("CSV error after {} document(s) were written: {source}", .written.len())]
    DataInterrupted {
        written: Vec<PathBuf>,
        #[source]
        source: csv::Error,
    },

    /// A job file failed to parse.
    #[error("Invalid job file: {0}")]
    Config(#[from] serde_json::Error),

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl MergeError {
    /// Whether this error belongs to a single row rather than the whole run.
    ///
    /// Row-scoped errors are caught at the row boundary and reported in the
    /// final summary; everything else aborts the run.
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            MergeError::UnknownTag { .. } | MergeError::IoWrite { .. } | MergeError::Pdf(_)
        )
    }
}

impl From<lopdf::Error> for MergeError {
    fn from(e: lopdf::Error) -> Self {
        MergeError::Pdf(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_message_lists_headers() {
        let err = MergeError::UnknownTag {
            tag: "missing".to_string(),
            headers: vec!["name".to_string(), "surname".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Tag 'missing' not found in CSV headers: [name, surname]"
        );
        assert!(err.is_row_scoped());
    }

    #[test]
    fn test_precondition_is_fatal() {
        let err = MergeError::Precondition(vec!["template".to_string(), "data".to_string()]);
        assert!(!err.is_row_scoped());
        assert!(err.to_string().contains("template, data"));
    }
}
