//! Project configuration for the layered generator.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::domain::merger::DEFAULT_MAX_DEPTH;
use crate::generator::layers::Layer;

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectSection,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    /// Relative paths are resolved against the config file's directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_merge_depth")]
    pub max_merge_depth: usize,
    /// Error type used in generated `Result`s.
    #[serde(default = "default_error_type")]
    pub error_type: String,
    #[serde(default = "Layer::all")]
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    /// Storage table name; the plural of `name` when omitted.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Attribute put on the field, e.g. `serde(rename = "id")`.
    #[serde(default)]
    pub tag: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_max_merge_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_error_type() -> String {
    "anyhow::Error".to_string()
}

impl ProjectConfig {
    /// Read, parse and validate a TOML project file. A relative `output_dir`
    /// is made relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project config {}", path.display()))?;
        let mut config = Self::from_toml(&text)
            .with_context(|| format!("Invalid project config {}", path.display()))?;
        if config.project.output_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            config.project.output_dir = base.join(&config.project.output_dir);
        }
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(text).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            bail!("project.name must not be empty");
        }
        if self.project.max_merge_depth == 0 {
            bail!("project.max_merge_depth must be at least 1");
        }
        if self.entities.is_empty() {
            bail!("at least one [[entities]] entry is required");
        }
        let mut seen = HashSet::new();
        for entity in &self.entities {
            if entity.name.trim().is_empty() {
                bail!("entity name must not be empty");
            }
            if !seen.insert(entity.name.as_str()) {
                bail!("duplicate entity `{}`", entity.name);
            }
            if entity.fields.is_empty() {
                bail!("entity `{}` has no fields", entity.name);
            }
        }
        Ok(())
    }

    /// Enabled layers in generation order, without duplicates.
    pub fn ordered_layers(&self) -> Vec<Layer> {
        Layer::all()
            .into_iter()
            .filter(|layer| self.project.layers.contains(layer))
            .collect()
    }
}
