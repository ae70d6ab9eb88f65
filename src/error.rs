//! Error types for the declaration sync engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors surfaced by a declaration-sync pipeline run.
///
/// A missing target file is not an error; the loader reports it as
/// absent and the pipeline synthesizes from scratch.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to parse {path}:{line}:{column}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("printed output for {path} does not parse back: {reason}")]
    Serialization { path: PathBuf, reason: String },

    #[error("malformed {what} `{fragment}`: {reason}")]
    MalformedNode {
        what: &'static str,
        fragment: String,
        reason: String,
    },

    #[error("invalid declaration spec `{name}`: {reason}")]
    InvalidSpec { name: String, reason: String },

    #[error("`{name}` exists but cannot be merged: {detail}")]
    UnsupportedShape { name: String, detail: String },
}

impl SyncError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(path: &Path, err: &syn::Error) -> Self {
        let start = err.span().start();
        SyncError::Parse {
            path: path.to_path_buf(),
            line: start.line,
            column: start.column + 1,
            message: err.to_string(),
        }
    }

    pub fn malformed(what: &'static str, fragment: &str, reason: impl ToString) -> Self {
        SyncError::MalformedNode {
            what,
            fragment: fragment.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_spec(name: &str, reason: impl Into<String>) -> Self {
        SyncError::InvalidSpec {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is a defect in node assembly rather than bad input on disk.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            SyncError::Serialization { .. } | SyncError::MalformedNode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
