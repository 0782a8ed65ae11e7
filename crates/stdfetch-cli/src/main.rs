//! stdfetch CLI - command line client for the download server.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stdfetch_core::TaskStatus;

mod client;
mod error;

use client::{HttpClient, StatusView};
use error::ClientError;

/// stdfetch CLI - search and download national standards
#[derive(Parser)]
#[command(name = "stdfetch")]
#[command(about = "CLI for the stdfetch download server", long_about = None)]
struct Cli {
    /// Download server address
    #[arg(short, long, env = "STDFETCH_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog by keyword
    Search {
        /// Keyword or partial standard number
        keyword: String,
    },

    /// Download a standard as PDF and wait for it
    Download {
        /// Standard number, e.g. "GB/T 19001-2016"
        standard: String,

        /// Directory to save the PDF into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 1000)]
        poll_ms: u64,
    },

    /// Show a task's status
    Status {
        /// Task ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = HttpClient::new(&cli.server);

    match cli.command {
        Commands::Search { keyword } => {
            search(&client, &keyword).await?;
        }
        Commands::Download {
            standard,
            out,
            poll_ms,
        } => {
            download(&client, &standard, out, Duration::from_millis(poll_ms.max(50))).await?;
        }
        Commands::Status { id } => {
            let view = client.status(&id).await?;
            print_status(&id, &view);
        }
    }

    Ok(())
}

async fn search(client: &HttpClient, keyword: &str) -> Result<(), ClientError> {
    let hits = client.search(keyword).await?;

    if hits.is_empty() {
        println!("No standards found for \"{keyword}\".");
        return Ok(());
    }

    println!(
        "{:<28} {:<12} {:<8} {:>6}  NAME",
        "NUMBER", "RELEASED", "STATUS", "PAGES"
    );
    println!("{}", "-".repeat(80));
    for hit in &hits {
        println!(
            "{:<28} {:<12} {:<8} {:>6}  {}",
            hit.standard_num, hit.release_date, hit.status, hit.page_count, hit.standard_name
        );
    }
    println!("\nTotal: {} standard(s)", hits.len());

    Ok(())
}

async fn download(
    client: &HttpClient,
    standard: &str,
    out: PathBuf,
    poll: Duration,
) -> Result<(), ClientError> {
    let task_id = client.submit(standard).await?;
    println!("Task queued: {task_id}");

    let mut last_line = String::new();
    let view = loop {
        let view = client.status(&task_id).await?;
        let line = status_line(&view);
        if line != last_line {
            println!("{line}");
            last_line = line;
        }
        if view.status.is_terminal() {
            break view;
        }
        tokio::time::sleep(poll).await;
    };

    match (view.status, view.download_url, view.filename) {
        (TaskStatus::Completed, Some(url), Some(filename)) => {
            tokio::fs::create_dir_all(&out).await?;
            let path = client.download(&url, &filename, &out).await?;
            println!("Saved to {}", path.display());
            Ok(())
        }
        _ => Err(ClientError::TaskFailed(
            view.message.unwrap_or_else(|| "unknown error".to_string()),
        )),
    }
}

fn status_line(view: &StatusView) -> String {
    let message = view.message.as_deref().unwrap_or("");
    match view.progress {
        Some(progress) => format!("[{:<11}] {:>3}% {}", view.status, progress, message),
        None => format!("[{:<11}]      {}", view.status, message),
    }
}

fn print_status(id: &str, view: &StatusView) {
    println!("  ID:       {id}");
    println!("  Status:   {}", view.status);
    if let Some(progress) = view.progress {
        println!("  Progress: {progress}%");
    }
    if let Some(message) = &view.message {
        println!("  Message:  {message}");
    }
    if let Some(filename) = &view.filename {
        println!("  File:     {filename}");
    }
    if let Some(url) = &view.download_url {
        println!("  URL:      {url}");
    }
}
