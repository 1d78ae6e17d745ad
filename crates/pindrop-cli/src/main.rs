use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pindrop_client::{ClientConfig, HttpExtractionClient};
use pindrop_core::models::PlaceRecord;
use pindrop_core::orchestrator::{JobOrchestrator, JobOutcome, OrchestratorConfig};
use pindrop_core::reachability::ReachabilityMonitor;
use pindrop_core::registry::{RegistryConfig, TaskRegistry};
use pindrop_core::traits::{ExtractionApi, MediaApi};

#[derive(Parser)]
#[command(name = "pindrop", version, about = "Extract places from shared URLs")]
struct Cli {
    /// Base URL of the extraction API
    #[arg(long, env = "PINDROP_API_URL")]
    api_url: String,

    /// Bearer token for the extraction API
    #[arg(long, env = "PINDROP_API_TOKEN", hide_env_values = true)]
    api_token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a URL and wait for the extracted places
    Extract {
        /// Shared URL to extract places from
        #[arg(short, long)]
        url: String,

        /// Print records as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the current status of a task
    Status {
        /// Server-assigned task id
        #[arg(short, long)]
        task_id: String,
    },

    /// Fetch the result of a completed task
    Result {
        /// Server-assigned task id
        #[arg(short, long)]
        task_id: String,

        /// Print records as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Upload a photo or cover image for a place
    Upload {
        /// Place the image belongs to
        #[arg(short, long)]
        place_id: String,

        /// Path to the image file
        #[arg(short, long)]
        file: PathBuf,

        /// Upload as the cover image instead of a photo
        #[arg(long, default_value_t = false)]
        cover: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pindrop=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::new(cli.api_url.as_str(), cli.api_token.as_str());
    let client = HttpExtractionClient::new(config)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to create API client")?;

    match cli.command {
        Commands::Extract { url, json } => cmd_extract(client, &url, json).await?,
        Commands::Status { task_id } => cmd_status(client, &task_id).await?,
        Commands::Result { task_id, json } => cmd_result(client, &task_id, json).await?,
        Commands::Upload {
            place_id,
            file,
            cover,
        } => cmd_upload(client, &place_id, &file, cover).await?,
    }

    Ok(())
}

/// Run one job end to end: submit, poll, fetch, print.
async fn cmd_extract(client: HttpExtractionClient, url: &str, json: bool) -> Result<()> {
    let orchestrator = JobOrchestrator::new(
        client,
        ReachabilityMonitor::default(),
        TaskRegistry::new(RegistryConfig::default()),
        OrchestratorConfig::default(),
    );

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling job");
            canceller.cancel();
        }
    });

    match orchestrator.process(url, cancel).await? {
        JobOutcome::Complete(records) => print_records(&records, json),
        JobOutcome::Cancelled => {
            eprintln!("Extraction cancelled");
            std::process::exit(130);
        }
    }
}

async fn cmd_status(client: HttpExtractionClient, task_id: &str) -> Result<()> {
    let status = client.status(task_id).await?;

    println!("Task {}: {}", status.task_id, status.phase);
    if let Some(progress) = status.progress {
        println!("  progress: {progress}%");
    }
    if let Some(message) = &status.message {
        println!("  stage: {message}");
    }
    if let Some(updated_at) = status.updated_at {
        println!("  updated: {}", updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    Ok(())
}

async fn cmd_result(client: HttpExtractionClient, task_id: &str, json: bool) -> Result<()> {
    let result = client.result(task_id).await?;
    print_records(&result.into_records(), json)
}

async fn cmd_upload(
    client: HttpExtractionClient,
    place_id: &str,
    file: &PathBuf,
    cover: bool,
) -> Result<()> {
    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read image file: {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();

    let url = if cover {
        client.upload_cover(place_id, bytes, &filename).await?
    } else {
        client.upload_photo(place_id, bytes, &filename).await?
    };

    println!("{url}");
    Ok(())
}

fn print_records(records: &[PlaceRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No places found");
        return Ok(());
    }

    for record in records {
        print!("{}", record.name);
        if let Some(rating) = record.rating {
            print!(" ({rating:.1})");
        }
        if let Some(address) = &record.address {
            print!(" — {address}");
        }
        println!();
    }
    println!("\nTotal: {} places", records.len());

    Ok(())
}
