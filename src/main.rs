// Command-line entry point for declsmith.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use declsmith::api::{self, ReportDto, SpecDocument};
use declsmith::generator::config::ProjectConfig;
use declsmith::generator::{Generator, GeneratorOptions};
use declsmith::infrastructure::FsSourceStore;
use declsmith::SyncReport;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every pipeline step
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the layered project described by a TOML config
    Generate {
        /// Project config file
        #[arg(short, long)]
        config: PathBuf,

        /// Override `project.output_dir`
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Override `project.max_merge_depth`
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Apply a JSON document of declaration specs
    Apply {
        /// Spec document file
        #[arg(short, long)]
        spec: PathBuf,

        /// Literal merge depth
        #[arg(long, default_value_t = declsmith::domain::merger::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn generate(config_path: &Path, output_dir: Option<PathBuf>, max_depth: Option<usize>) -> Result<Vec<SyncReport>> {
    let config = ProjectConfig::load(config_path)?;
    let mut options = GeneratorOptions::from_config(&config);
    if let Some(dir) = output_dir {
        options.output_dir = dir;
    }
    if let Some(depth) = max_depth {
        options.max_depth = depth;
    }
    Generator::new(&config, options).run()
}

fn apply(spec_path: &Path, max_depth: usize) -> Result<Vec<SyncReport>> {
    let document = SpecDocument::load(spec_path)?;
    let base_dir = spec_path.parent().unwrap_or_else(|| Path::new(""));
    api::apply_document(&document, base_dir, &FsSourceStore, max_depth)
}

fn print_reports(reports: &[SyncReport], format: Format) -> Result<()> {
    match format {
        Format::Text => {
            for report in reports {
                println!("{report}");
            }
        }
        Format::Json => {
            let dtos: Vec<ReportDto> = reports.iter().map(ReportDto::from).collect();
            let json = serde_json::to_string_pretty(&dtos).context("Failed to serialize reports")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let reports = match cli.command {
        Command::Generate {
            config,
            output_dir,
            max_depth,
        } => generate(&config, output_dir, max_depth)?,
        Command::Apply { spec, max_depth } => apply(&spec, max_depth)?,
    };
    print_reports(&reports, cli.format)
}
