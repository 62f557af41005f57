//! # escola-api
//!
//! Serves the agenda, learning guide and elective syllabus generators over
//! HTTP, and scaffolds the Word templates they render.

use anyhow::Context;
use clap::{Parser, Subcommand};
use escola_core::{EscolaConfig, logging};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// School document generation service
#[derive(Parser)]
#[command(name = "escola-api", version, about = "School document generation service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file, created with defaults when missing
    #[arg(long, env = "ESCOLA_CONFIG", default_value = "escola.json")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Write starter Word templates into the templates directory
    ScaffoldTemplates {
        /// Replace templates that already exist
        #[arg(long)]
        force: bool,
    },
}

/// Loads the config file (writing defaults when absent) and applies the
/// environment overrides. The flag is `true` when the file was just created.
fn load_config(path: &Path) -> anyhow::Result<(EscolaConfig, bool)> {
    let created = !path.exists();
    let mut config = EscolaConfig::load_from_path(path)?;
    config.apply_env_overrides()?;
    Ok((config, created))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging depends on the config, so report how it was obtained afterwards.
    let (config, created) = load_config(&cli.config)?;
    let _guard = logging::init_logging(&config.log_level, config.log_dir.as_deref())?;
    if created {
        info!(config = %cli.config.display(), "default configuration created");
    } else {
        info!(config = %cli.config.display(), "configuration loaded");
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            config
                .ensure_output_dirs()
                .context("failed to create output directories")?;
            for template in [config.guide_template_path(), config.elective_template_path()] {
                if !template.exists() {
                    warn!(
                        path = %template.display(),
                        "template missing, run `escola-api scaffold-templates` to create it"
                    );
                }
            }
            escola_api::app::start_server(config).await?;
        }
        Commands::ScaffoldTemplates { force } => {
            let written = escola_docs::scaffold::write_templates(&config, force)?;
            info!(count = written.len(), "templates scaffolded");
            for path in written {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
