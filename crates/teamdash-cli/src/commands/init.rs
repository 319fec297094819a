//! First-time setup

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use teamdash_core::{BackendKind, Config, Dashboard, SqliteBackend};

use crate::output::{Output, OutputFormat};

/// Write a config file if none exists and prepare the selected backend
///
/// For SQLite this creates the database and its tables. For REST it
/// performs one full read to check that the API is reachable.
pub async fn run(config: &Config, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config_file = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    let created_config = !config_file.exists();
    if created_config {
        config
            .save_to_path(&config_file)
            .context("Failed to write initial configuration")?;
    }

    let target = match config.backend {
        BackendKind::Sqlite => {
            let path = config.sqlite_path();
            SqliteBackend::open(&path)
                .with_context(|| format!("Failed to create database at {:?}", path))?;
            path.display().to_string()
        }
        BackendKind::Rest => {
            let Some(url) = config.rest_url.clone() else {
                bail!(
                    "REST backend selected but rest_url is not set.\n\
                     Set it with: teamdash config set rest_url https://<project>.supabase.co"
                );
            };
            let mut dashboard = Dashboard::open(config)?;
            dashboard
                .refresh()
                .await
                .with_context(|| format!("Could not reach {}", url))?;
            url
        }
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "backend": config.backend,
                    "target": target,
                    "config_file": config_file,
                    "created_config": created_config
                })
            );
        }
        OutputFormat::Quiet => {}
        OutputFormat::Human => {
            println!();
            println!("Backend ready ({}): {}", config.backend, target);
            if created_config {
                println!("Wrote config file: {}", config_file.display());
            }
            println!();
            println!("Add your first server with:");
            println!("  teamdash server add <name> --ip <address>");
        }
    }

    Ok(())
}
