use std::path::Path;

use crate::domain::tree::SyntaxTree;
use crate::error::Result;

/// Where source text comes from and goes back to.
pub trait SourceStore {
    /// `Ok(None)` when nothing exists at `path` yet.
    fn load(&self, path: &Path) -> Result<Option<String>>;
    /// Overwrite `path` with `contents`, creating parent directories.
    fn store(&self, path: &Path, contents: &str) -> Result<()>;
}

pub trait TreeParser {
    fn parse(&self, path: &Path, src: &str) -> Result<SyntaxTree>;
}

pub trait TreePrinter {
    fn print(&self, path: &Path, tree: &SyntaxTree) -> Result<String>;
}
