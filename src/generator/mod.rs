//! Layered code generator driving the declaration-sync pipeline.

pub mod config;
pub mod layers;
pub mod naming;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::{SyncDeclaration, SyncReport};
use crate::domain::merger::MemberMerger;
use crate::generator::config::ProjectConfig;
use crate::infrastructure::{FsSourceStore, PrettyPrinter, SynTreeParser};
use crate::ports::SourceStore;

/// Where and how deep a generator run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub output_dir: PathBuf,
    pub max_depth: usize,
}

impl GeneratorOptions {
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            output_dir: config.project.output_dir.clone(),
            max_depth: config.project.max_merge_depth,
        }
    }
}

/// Runs every enabled layer, in order, against one output directory.
pub struct Generator<'a> {
    pub config: &'a ProjectConfig,
    pub options: GeneratorOptions,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a ProjectConfig, options: GeneratorOptions) -> Self {
        Self { config, options }
    }

    /// Generate into the filesystem.
    pub fn run(&self) -> Result<Vec<SyncReport>> {
        self.run_with(&FsSourceStore)
    }

    /// Generate through `store`. Stops at the first failing declaration.
    pub fn run_with(&self, store: &dyn SourceStore) -> Result<Vec<SyncReport>> {
        let merger = MemberMerger::new(self.options.max_depth)
            .context("Invalid generator options")?;
        let sync = SyncDeclaration {
            store,
            parser: &SynTreeParser,
            printer: &PrettyPrinter,
            merger,
        };

        let mut reports = Vec::new();
        for layer in self.config.ordered_layers() {
            let jobs = layer.jobs(self.config);
            info!(layer = %layer, jobs = jobs.len(), "generating layer");
            for job in jobs {
                let path = self.options.output_dir.join(&job.path);
                let report = sync.run(&path, &job.spec).with_context(|| {
                    format!(
                        "Layer `{}`{} failed on {} in {}",
                        layer,
                        job.entity
                            .as_deref()
                            .map(|e| format!(" (entity `{e}`)"))
                            .unwrap_or_default(),
                        job.spec.key(),
                        path.display()
                    )
                })?;
                reports.push(report);
            }
        }
        info!(
            project = %self.config.project.name,
            declarations = reports.len(),
            changed = reports.iter().filter(|r| r.changed).count(),
            "generation finished"
        );
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SyncOutcome;
    use crate::infrastructure::MemorySourceStore;
    use std::path::Path;

    const PROJECT: &str = r#"
        [project]
        name = "shop"
        output_dir = "out"
        layers = ["registry", "model"]

        [[entities]]
        name = "widget"
        [[entities.fields]]
        name = "id"
        type = "String"
    "#;

    #[test]
    fn test_layers_run_in_fixed_order() {
        let config = ProjectConfig::from_toml(PROJECT).unwrap();
        let store = MemorySourceStore::new();
        let reports = Generator::new(&config, GeneratorOptions::from_config(&config))
            .run_with(&store)
            .unwrap();
        let paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("out/model/widget.rs"),
                PathBuf::from("out/registry.rs"),
                PathBuf::from("out/registry.rs"),
            ]
        );
        assert!(reports.iter().all(|r| r.outcome == SyncOutcome::Created));
        let registry = store.get(Path::new("out/registry.rs")).unwrap();
        assert!(registry.contains("widget: \"widgets\""), "{registry}");
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let config = ProjectConfig::from_toml(PROJECT).unwrap();
        let options = GeneratorOptions {
            output_dir: PathBuf::from("out"),
            max_depth: 0,
        };
        let err = Generator::new(&config, options)
            .run_with(&MemorySourceStore::new())
            .unwrap_err();
        assert!(format!("{err:#}").contains("max_depth"), "{err:#}");
    }

    #[test]
    fn test_failure_names_layer_and_entity() {
        let config = ProjectConfig::from_toml(PROJECT).unwrap();
        let store = MemorySourceStore::new();
        store.insert("out/model/widget.rs", "pub struct Widget(String);\n");
        let err = Generator::new(&config, GeneratorOptions::from_config(&config))
            .run_with(&store)
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Layer `model` (entity `widget`)"), "{message}");
        assert!(message.contains("cannot be merged"), "{message}");
    }
}
