// Application layer: the declaration-sync pipeline over the ports.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::declaration::{DeclarationKind, DeclarationSpec};
use crate::domain::locator::{locate, MatchResult};
use crate::domain::merger::MemberMerger;
use crate::domain::synthesizer::synthesize;
use crate::domain::tree::SyntaxTree;
use crate::error::{Result, SyncError};
use crate::ports::{SourceStore, TreeParser, TreePrinter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The declaration did not exist and was synthesized.
    Created,
    /// The declaration existed and missing members were appended.
    Merged,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Created => write!(f, "created"),
            SyncOutcome::Merged => write!(f, "merged"),
        }
    }
}

/// What one pipeline run did to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub path: PathBuf,
    pub name: String,
    pub kind: DeclarationKind,
    pub outcome: SyncOutcome,
    /// Members appended, nested literal entries included.
    pub appended: usize,
    pub imports_added: usize,
    /// Whether the written text differs from what was on disk.
    pub changed: bool,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} in {} (+{} members, +{} imports)",
            self.outcome,
            self.kind,
            self.name,
            self.path.display(),
            self.appended,
            self.imports_added
        )
    }
}

/// Ensures one declaration exists in one file with at least the requested
/// members.
///
/// Load, imports, locate, synthesize or merge, print, write. The file is
/// only written once the in-memory tree is final, so any failure leaves it
/// as it was.
pub struct SyncDeclaration<'a> {
    pub store: &'a dyn SourceStore,
    pub parser: &'a dyn TreeParser,
    pub printer: &'a dyn TreePrinter,
    pub merger: MemberMerger,
}

impl<'a> SyncDeclaration<'a> {
    pub fn run(&self, path: &Path, spec: &DeclarationSpec) -> Result<SyncReport> {
        let key = spec.key();
        debug!(path = %path.display(), declaration = %key, "validate");
        spec.validate()?;

        let existing = self.store.load(path)?;
        let mut tree = match existing.as_deref() {
            Some(src) => {
                let tree = self.parser.parse(path, src)?;
                debug!(
                    path = %path.display(),
                    declarations = tree.declarations().len(),
                    "loaded"
                );
                tree
            }
            None => {
                debug!(path = %path.display(), "missing, starting from an empty file");
                SyntaxTree::empty()
            }
        };

        let imports_added = tree.merge_imports(&spec.imports)?;
        debug!(imports_added, "imports");

        let (outcome, appended) = match locate(&tree, &key) {
            MatchResult::Found(node) => {
                debug!(declaration = %key, ?node, "found");
                let target = tree
                    .declaration_mut(node)
                    .ok_or_else(|| SyncError::UnsupportedShape {
                        name: spec.name.clone(),
                        detail: format!("located node {node:?} is not a {}", spec.kind),
                    })?;
                (SyncOutcome::Merged, self.merger.merge(target, spec)?)
            }
            MatchResult::NotFound => {
                debug!(declaration = %key, "not found, synthesizing");
                let (node, appended) = synthesize(spec, &self.merger)?;
                node.insert_into(&mut tree, key.receiver.as_deref())?;
                (SyncOutcome::Created, appended)
            }
        };

        let text = self.printer.print(path, &tree)?;
        let changed = existing.as_deref() != Some(text.as_str());
        self.store.store(path, &text)?;
        debug!(path = %path.display(), bytes = text.len(), "written");

        let report = SyncReport {
            path: path.to_path_buf(),
            name: spec.name.clone(),
            kind: spec.kind,
            outcome,
            appended,
            imports_added,
            changed,
        };
        info!(
            path = %report.path.display(),
            declaration = %key,
            outcome = %report.outcome,
            appended,
            imports_added,
            "declaration synced"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::declaration::MemberSpec;
    use crate::infrastructure::{MemorySourceStore, PrettyPrinter, SynTreeParser};

    fn usecase(store: &MemorySourceStore) -> SyncDeclaration<'_> {
        SyncDeclaration {
            store,
            parser: &SynTreeParser,
            printer: &PrettyPrinter,
            merger: MemberMerger::default(),
        }
    }

    #[test]
    fn test_created_then_merged() {
        let store = MemorySourceStore::new();
        let path = Path::new("model/widget.rs");
        let spec = DeclarationSpec::structure("Widget")
            .import("serde::Serialize")
            .member(MemberSpec::field("id", "String"));

        let first = usecase(&store).run(path, &spec).unwrap();
        assert_eq!(first.outcome, SyncOutcome::Created);
        assert_eq!((first.appended, first.imports_added), (1, 1));
        assert!(first.changed);

        let second = usecase(&store).run(path, &spec).unwrap();
        assert_eq!(second.outcome, SyncOutcome::Merged);
        assert_eq!((second.appended, second.imports_added), (0, 0));
        assert!(!second.changed);
    }

    #[test]
    fn test_invalid_spec_touches_nothing() {
        let store = MemorySourceStore::new();
        let spec = DeclarationSpec::structure("Widget").member(MemberSpec::param("id", "u64"));
        let err = usecase(&store).run(Path::new("w.rs"), &spec).unwrap_err();
        assert!(matches!(err, SyncError::InvalidSpec { .. }));
        assert!(store.get(Path::new("w.rs")).is_none());
    }

    #[test]
    fn test_unparsable_file_is_left_alone() {
        let store = MemorySourceStore::new();
        let path = Path::new("broken.rs");
        store.insert(path, "pub struct Widget {\n    id: ,\n}\n");
        let spec = DeclarationSpec::structure("Widget").member(MemberSpec::field("id", "String"));
        let err = usecase(&store).run(path, &spec).unwrap_err();
        assert!(matches!(err, SyncError::Parse { line: 2, .. }), "{err}");
        assert_eq!(store.get(path).as_deref(), Some("pub struct Widget {\n    id: ,\n}\n"));
    }

    #[test]
    fn test_report_line() {
        let report = SyncReport {
            path: PathBuf::from("routes.rs"),
            name: "register_routes".to_string(),
            kind: DeclarationKind::Method,
            outcome: SyncOutcome::Merged,
            appended: 2,
            imports_added: 0,
            changed: true,
        };
        assert_eq!(
            report.to_string(),
            "merged method register_routes in routes.rs (+2 members, +0 imports)"
        );
    }
}
