//! CLI commands implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::models::ComparisonEntry;
use crate::render::{check_tools, PdftoppmRenderer};
use crate::report::{ReportBuilder, ReportConfig, ReportEvent, SIGNED_LINK_EXPIRY_SECS};
use crate::storage::S3ObjectStore;

#[derive(Parser)]
#[command(name = "pagereview")]
#[command(about = "Side-by-side HTML review pages for PDF transcription evaluation")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Build a review page from a JSONL file of comparison entries
    Build {
        /// JSONL file with one comparison entry per line
        input: PathBuf,

        /// Output HTML file
        #[arg(short, long, default_value = "review_page.html")]
        output: PathBuf,

        /// Number of parallel workers (default: available parallelism)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Lifetime of signed PDF links in seconds
        #[arg(long, default_value_t = SIGNED_LINK_EXPIRY_SECS)]
        link_expiry: u64,

        /// AWS profile to use for storage access
        #[arg(long, env = "AWS_PROFILE")]
        profile: Option<String>,
    },

    /// Check that required external tools are installed
    Check,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            workers,
            link_expiry,
            profile,
        } => cmd_build(&input, &output, workers, link_expiry, profile.as_deref()).await,
        Commands::Check => cmd_check(),
    }
}

/// Load comparison entries from a JSONL file, one JSON object per line.
fn load_entries(path: &Path) -> anyhow::Result<Vec<ComparisonEntry>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading entries from {}", path.display()))?;

    let mut entries = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: ComparisonEntry = serde_json::from_str(line)
            .with_context(|| format!("parsing entry on line {} of {}", lineno + 1, path.display()))?;
        entries.push(entry);
    }
    Ok(entries)
}

async fn cmd_build(
    input: &Path,
    output: &Path,
    workers: Option<usize>,
    link_expiry: u64,
    profile: Option<&str>,
) -> anyhow::Result<()> {
    let entries = load_entries(input)?;
    if entries.is_empty() {
        println!("{} no entries in {}", style("!").yellow(), input.display());
        return Ok(());
    }
    let total = entries.len();

    let store = Arc::new(S3ObjectStore::from_env(profile).await);
    let renderer = Arc::new(PdftoppmRenderer::new());

    let mut config = ReportConfig::default();
    if let Some(w) = workers {
        config.workers = w;
    }
    config.link_expiry = Duration::from_secs(link_expiry);

    let builder = ReportBuilder::new(store, renderer, config);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let (event_tx, mut event_rx) = mpsc::channel(64);
    let progress = pb.clone();
    let progress_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ReportEvent::EntryStarted { entry_id } => {
                    progress.set_message(format!("entry {}", entry_id));
                }
                ReportEvent::EntryCompleted { .. } => progress.inc(1),
            }
        }
    });

    builder.write_report(entries, output, event_tx).await?;
    let _ = progress_task.await;
    pb.finish_and_clear();

    println!(
        "{} wrote review page for {} entries to {}",
        style("✓").green(),
        total,
        output.display()
    );
    Ok(())
}

fn cmd_check() -> anyhow::Result<()> {
    println!("\n{}", style("Rendering Tool Status").bold());
    println!("{}", "-".repeat(40));

    let mut all_found = true;
    for (tool, available) in check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<12} {}", tool, status);
    }

    if !all_found {
        println!(
            "\n{} install poppler-utils to render PDF pages",
            style("!").yellow()
        );
        anyhow::bail!("missing required tools");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_entries_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"s3_path":"s3://b/a.pdf","page":1,"gold_text":"g","eval_text":"e"}"#,
                "\n\n",
                r#"{"s3_path":"s3://b/b.pdf","page":2,"gold_text":"g","eval_text":"e","alignment":0.5}"#,
                "\n",
            ),
        )
        .unwrap();

        let entries = load_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].page, 1);
        assert_eq!(entries[1].s3_path, "s3://b/b.pdf");
    }

    #[test]
    fn test_load_entries_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        let err = load_entries(&path).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
