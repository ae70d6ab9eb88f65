// JSON entry point: apply a document of declaration specs.

pub mod dto;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::application::{SyncDeclaration, SyncReport};
use crate::domain::merger::MemberMerger;
use crate::infrastructure::{PrettyPrinter, SynTreeParser};
use crate::ports::SourceStore;

pub use dto::{ReportDto, SpecDocument, SpecEntry};

impl SpecDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read spec document {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid spec document {}", path.display()))
    }
}

/// Apply every entry in order, relative paths against `base_dir`. Stops at
/// the first failure; entries before it stay applied.
pub fn apply_document(
    document: &SpecDocument,
    base_dir: &Path,
    store: &dyn SourceStore,
    max_depth: usize,
) -> Result<Vec<SyncReport>> {
    let sync = SyncDeclaration {
        store,
        parser: &SynTreeParser,
        printer: &PrettyPrinter,
        merger: MemberMerger::new(max_depth).context("Invalid merge depth")?,
    };
    document
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let path = base_dir.join(&entry.path);
            sync.run(&path, &entry.declaration).with_context(|| {
                format!(
                    "Entry #{index} ({}) failed on {}",
                    entry.declaration.key(),
                    path.display()
                )
            })
        })
        .collect()
}
