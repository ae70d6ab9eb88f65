use std::path::Path;

use crate::domain::tree::SyntaxTree;
use crate::error::{Result, SyncError};
use crate::ports::TreeParser;

/// Parses whole Rust files with `syn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SynTreeParser;

impl TreeParser for SynTreeParser {
    fn parse(&self, path: &Path, src: &str) -> Result<SyntaxTree> {
        let file = syn::parse_file(src).map_err(|e| SyncError::parse(path, &e))?;
        Ok(SyntaxTree::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_is_empty_tree() {
        let tree = SynTreeParser.parse(Path::new("empty.rs"), "").unwrap();
        assert!(tree.items().is_empty());
    }

    #[test]
    fn test_parse_failure_reports_location() {
        let err = SynTreeParser
            .parse(Path::new("broken.rs"), "pub struct Widget {}\n\nfn broken() { let = 1; }\n")
            .unwrap_err();
        match err {
            SyncError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
