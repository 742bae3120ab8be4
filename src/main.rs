//! What Got Done export - dump one user's journal data.
//!
//! Reads the journal database and produces the same two artifacts the web
//! service serves: the structured JSON export and the Markdown zip archive.
//!
//!   whatgotdone-export export alice -o alice.json
//!   whatgotdone-export archive alice -d backups/
//!   whatgotdone-export summary alice

mod cli;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use whatgotdone_export::application::{
    archive_filename, json_export_response, markdown_export_response, ExportResponse,
    ExportService,
};
use whatgotdone_export::domain::{Datastore, Username};
use whatgotdone_export::infrastructure::{
    config_file_path, ensure_config_exists, load_config, load_config_from_file, SqliteDatastore,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Export { username, output } => {
            let service = open_service(cli.config.as_deref(), cli.database)?;
            cmd_export(&service, &Username::new(username), today, output.as_deref()).await?;
        }
        Commands::Archive { username, dir } => {
            let service = open_service(cli.config.as_deref(), cli.database)?;
            cmd_archive(&service, &Username::new(username), today, &dir)?;
        }
        Commands::Summary { username } => {
            let service = open_service(cli.config.as_deref(), cli.database)?;
            cmd_summary(&service, &Username::new(username), today).await?;
        }
        Commands::Config => {
            cmd_config(cli.config.as_deref())?;
        }
    }

    Ok(())
}

/// Loads configuration and opens the journal database it points at.
fn open_service(config_path: Option<&Path>, database: Option<PathBuf>) -> anyhow::Result<ExportService> {
    let mut config = match config_path {
        Some(path) => load_config_from_file(path)?,
        None => load_config()?,
    };
    if let Some(database) = database {
        config.storage.database = Some(database);
    }

    let db_path = config.database_path();
    if !db_path.exists() {
        bail!("journal database not found at {}", db_path.display());
    }
    let store: Arc<dyn Datastore> = Arc::new(SqliteDatastore::open(&db_path)?);
    Ok(ExportService::new(store, config.export.calendar()?))
}

/// Turns a non-success response into an error carrying its message.
fn ensure_success(response: &ExportResponse) -> anyhow::Result<()> {
    if !response.is_success() {
        bail!(
            "export failed with status {}: {}",
            response.status,
            String::from_utf8_lossy(&response.body)
        );
    }
    Ok(())
}

/// Structured JSON export.
async fn cmd_export(
    service: &ExportService,
    username: &Username,
    today: NaiveDate,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let response = json_export_response(service, username, today).await;
    ensure_success(&response)?;

    match output {
        Some(path) => {
            std::fs::write(path, &response.body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Exported {} to {}",
                "✓".green().bold(),
                username.to_string().cyan(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&response.body)
                .context("Failed to write to stdout")?;
            writeln!(stdout).context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Markdown zip archive.
fn cmd_archive(
    service: &ExportService,
    username: &Username,
    today: NaiveDate,
    dir: &Path,
) -> anyhow::Result<()> {
    let response = markdown_export_response(service.store(), username, today);
    ensure_success(&response)?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    let path = dir.join(archive_filename(username, today));
    std::fs::write(&path, &response.body)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} {} → {} ({} bytes)",
        "📦".bold(),
        username.to_string().cyan(),
        path.display(),
        response.body.len()
    );

    Ok(())
}

/// Table of what an export would contain.
async fn cmd_summary(service: &ExportService, username: &Username, today: NaiveDate) -> anyhow::Result<()> {
    let bundle = service.export_user_data(username, today).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Section", "Count"]);
    table.add_row(vec!["Published entries".to_string(), bundle.entries.len().to_string()]);
    table.add_row(vec!["Drafts".to_string(), bundle.drafts.len().to_string()]);
    table.add_row(vec!["Entries with reactions".to_string(), bundle.reactions.len().to_string()]);
    table.add_row(vec!["Reactions".to_string(), bundle.reaction_count().to_string()]);
    table.add_row(vec!["Following".to_string(), bundle.following.len().to_string()]);

    println!("{} {}", "📊 Export summary for".bold(), username.to_string().cyan());
    println!("{table}");

    if let (Some(first), Some(last)) = (bundle.entries.last(), bundle.entries.first()) {
        println!("  Entries span {} to {}", first.date, last.date);
    }

    Ok(())
}

/// Create the default config file if needed and show where it lives.
fn cmd_config(path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map_or_else(config_file_path, Path::to_path_buf);
    ensure_config_exists(&path)?;
    println!("{} {}", "⚙".bold(), path.display());
    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
