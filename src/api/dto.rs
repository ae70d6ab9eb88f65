use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::application::{SyncOutcome, SyncReport};
use crate::domain::declaration::{DeclarationKind, DeclarationSpec};

/// A list of declarations to sync, read from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecDocument {
    pub entries: Vec<SpecEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecEntry {
    /// Target file; relative paths are resolved against the document's directory.
    pub path: PathBuf,
    pub declaration: DeclarationSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDto {
    pub path: String,
    pub name: String,
    pub kind: DeclarationKind,
    pub outcome: String,
    pub appended: usize,
    pub imports_added: usize,
    pub changed: bool,
}

impl From<&SyncReport> for ReportDto {
    fn from(report: &SyncReport) -> Self {
        ReportDto {
            path: report.path.display().to_string(),
            name: report.name.clone(),
            kind: report.kind,
            outcome: match report.outcome {
                SyncOutcome::Created => "created",
                SyncOutcome::Merged => "merged",
            }
            .to_string(),
            appended: report.appended,
            imports_added: report.imports_added,
            changed: report.changed,
        }
    }
}
