//! Template Importer - command-line entry point
//!
//! Imports one template archive against an in-memory host and prints the
//! import report as JSON on stdout. Logs go to stderr, filtered by `RUST_LOG`.

use anyhow::{Context, Result};
use clap::Parser;
use host::{HostServices, MemoryHost};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use template_import::{SettingsLoader, TemplateImporter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Template archive (ZIP), relative to the application root
    archive: PathBuf,
    /// Application root; defaults to the archive's directory
    #[clap(long)]
    app_root: Option<PathBuf>,
    /// Settings file; defaults to `importer.json` in the application root
    #[clap(long)]
    settings: Option<PathBuf>,
    /// Write the effective settings back to the settings file before importing
    #[clap(long)]
    write_settings: bool,
}

impl Cli {
    /// Application root and archive path relative to it
    fn locations(&self) -> Result<(PathBuf, PathBuf)> {
        if let Some(root) = &self.app_root {
            return Ok((root.clone(), self.archive.clone()));
        }

        let name = self
            .archive
            .file_name()
            .with_context(|| format!("{} is not a file path", self.archive.display()))?;
        let root = self
            .archive
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Ok((root.to_path_buf(), PathBuf::from(name)))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let (app_root, archive) = cli.locations()?;

    let mut loader = match &cli.settings {
        Some(file) => SettingsLoader::from_file(file.clone()),
        None => SettingsLoader::new(&app_root),
    };
    let settings_path = loader.settings_path().to_path_buf();
    loader
        .load()
        .await
        .with_context(|| format!("reading {}", settings_path.display()))?;
    if cli.write_settings {
        loader
            .save()
            .await
            .with_context(|| format!("writing {}", settings_path.display()))?;
        tracing::info!(path = %settings_path.display(), "Settings written");
    }
    let settings = loader.into_settings();

    tracing::info!(app_root = %app_root.display(), archive = %archive.display(), "Starting template import");

    let host = Arc::new(MemoryHost::new());
    let importer = TemplateImporter::new(archive, app_root, HostServices::from_shared(host))
        .with_settings(settings);

    let report = tokio::task::spawn_blocking(move || importer.run())
        .await
        .context("import worker panicked")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
