use std::path::Path;

use crate::domain::tree::SyntaxTree;
use crate::error::{Result, SyncError};
use crate::ports::TreePrinter;

/// Prints a tree with `prettyplease` and checks that the text parses back.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrettyPrinter;

impl TreePrinter for PrettyPrinter {
    fn print(&self, path: &Path, tree: &SyntaxTree) -> Result<String> {
        let text = prettyplease::unparse(tree.file());
        syn::parse_file(&text).map_err(|e| SyncError::Serialization {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(text)
    }
}
