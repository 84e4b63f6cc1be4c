//! Docket upload CLI.
//!
//! Set `DOCKET_API_URL` and `DOCKET_TOKEN` (or pass `--api-url` / `--token`).
//! `login` prints a token to export as `DOCKET_TOKEN`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docket_client::{
    ClientConfig, FileProgress, HttpBackend, LocalFile, ProgressTracker, UploadCoordinator,
    UploadMode, UploadOptions, UploadStatus,
};
use docket_shared::target::TargetStatus;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "docket-upload", about = "Docket targets and uploads")]
struct Cli {
    /// Server base URL
    #[arg(long, env = "DOCKET_API_URL", default_value = "http://localhost:8080")]
    api_url: String,
    /// Bearer token from `login`
    #[arg(long, env = "DOCKET_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a token
    Login {
        /// Username
        username: String,
        /// Password
        #[arg(long, env = "DOCKET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List your targets
    Targets {
        /// Filter by status: pending or completed
        #[arg(long)]
        status: Option<TargetStatus>,
    },
    /// Show one target with its files
    Show {
        /// Target UUID
        target_id: Uuid,
    },
    /// Upload files to a target
    Upload {
        /// Target UUID
        target_id: Uuid,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Send files through the server instead of straight to storage
        #[arg(long)]
        server_upload: bool,
        /// Parallel direct transfers
        #[arg(long, default_value = "4")]
        concurrency: usize,
        /// Per-file timeout in seconds
        #[arg(long, default_value = "300")]
        timeout_secs: u64,
    },
    /// Remove a file from a target
    Remove {
        /// Target UUID
        target_id: Uuid,
        /// URL of the file to remove
        file_url: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{out}");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = ClientConfig::new(cli.api_url);
    if let Some(token) = cli.token {
        config = config.with_token(token);
    }

    match cli.command {
        Commands::Login { username, password } => {
            let backend = HttpBackend::new(config)?;
            let response = backend.login(&username, &password).await?;
            print_json(&response)?;
        }
        Commands::Targets { status } => {
            let backend = HttpBackend::new(config)?;
            print_json(&backend.list_targets(status).await?)?;
        }
        Commands::Show { target_id } => {
            let backend = HttpBackend::new(config)?;
            print_json(&backend.get_target(target_id).await?)?;
        }
        Commands::Upload {
            target_id,
            files,
            server_upload,
            concurrency,
            timeout_secs,
        } => {
            let config = config
                .with_max_concurrency(concurrency)
                .with_per_file_timeout(Duration::from_secs(timeout_secs));
            upload(config, target_id, &files, server_upload).await?;
        }
        Commands::Remove {
            target_id,
            file_url,
        } => {
            let backend = HttpBackend::new(config)?;
            let coordinator = UploadCoordinator::new(Arc::new(backend.clone()), backend.config());
            print_json(&coordinator.remove(target_id, &file_url).await?)?;
        }
    }

    Ok(())
}

async fn upload(
    config: ClientConfig,
    target_id: Uuid,
    paths: &[PathBuf],
    force_server_upload: bool,
) -> anyhow::Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = LocalFile::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }

    let tracker = ProgressTracker::new(files.iter().map(|f| f.file_name.clone()));
    let mut updates = tracker.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let board = updates.borrow_and_update().clone();
            eprintln!("{}", render(&board));
        }
    });

    let coordinator = UploadCoordinator::new(Arc::new(HttpBackend::new(config.clone())?), &config);
    let result = coordinator
        .upload(
            target_id,
            files,
            UploadOptions {
                force_server_upload,
            },
            &tracker,
        )
        .await;
    printer.abort();

    let report = result?;
    let mode = match report.mode {
        UploadMode::Direct => "direct",
        UploadMode::ServerMediated => "server",
    };
    print_json(&json!({
        "mode": mode,
        "fallbackReason": report.fallback_reason,
        "message": report.response.message,
        "target": report.response.target,
        "uploadedFiles": report.response.uploaded_files,
    }))
}

fn render(board: &[FileProgress]) -> String {
    board
        .iter()
        .map(|f| {
            let state = match f.status {
                UploadStatus::Pending => "pending",
                UploadStatus::Uploading => "uploading",
                UploadStatus::Completed => "done",
                UploadStatus::Error => "error",
            };
            format!("{} {:>3}% {state}", f.file_name, f.percent)
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
