//! CLI entry for quizboard.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::job::RunReport;
use crate::orchestrator::Orchestrator;
use crate::publish::{GoogleSheets, MemoryStore, SpreadsheetStore};
use crate::scraper::Browser;

#[derive(Parser)]
#[command(name = "quizboard")]
#[command(version, about = "Scrapes the quiz rating and republishes it to Google Sheets", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to quizboard.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only run the jobs publishing to these tabs
    #[arg(short, long = "job", value_name = "TAB")]
    pub jobs: Vec<String>,

    /// Print the tables instead of publishing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Run all selected jobs.
///
/// Fails only when the run cannot start; failed jobs are logged and reported.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.select_jobs(&cli.jobs)?;
    info!(
        "Configuration loaded: {} jobs, spreadsheet {}",
        config.jobs.len(),
        config.sheets.document
    );

    if cli.dry_run {
        let store = config
            .jobs
            .iter()
            .fold(MemoryStore::new(), |store, job| store.with_tab(&config.sheets.document, &job.tab));
        let report = run_jobs(&config, &store).await?;
        print_tables(&config, &store, &report);
        return Ok(());
    }

    let store = match &config.sheets.access_token {
        Some(token) => GoogleSheets::with_token(&config.sheets, token.clone())?,
        None => GoogleSheets::from_settings(&config.sheets)?,
    };
    info!("Spreadsheet client ready");

    run_jobs(&config, &store).await?;
    Ok(())
}

async fn run_jobs<St: SpreadsheetStore>(config: &AppConfig, store: &St) -> anyhow::Result<RunReport> {
    let session = Browser::launch(&config.browser, config.scrape.poll_interval())
        .await
        .context("Failed to launch browser")?;
    info!("Browser launched");

    let report = Orchestrator::new(store, &config.sheets.document, &config.scrape)
        .run(session, &config.jobs)
        .await;

    for job in &report.jobs {
        if let Some(error) = &job.error {
            warn!("[{}] {}: {}", job.job.tab, job.state, error);
        }
    }

    Ok(report)
}

/// Print each tab as tab-separated text.
fn print_tables(config: &AppConfig, store: &MemoryStore, report: &RunReport) {
    for job in &report.jobs {
        println!("=== {} ({}) ===", job.job.tab, job.state);
        let Some(rows) = store.contents(&config.sheets.document, &job.job.tab) else {
            continue;
        };
        for row in rows {
            let line: Vec<String> = row.iter().map(ToString::to_string).collect();
            println!("{}", line.join("\t"));
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["quizboard", "--dry-run", "-j", "Season", "--job", "All"]).unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.jobs, ["Season", "All"]);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["quizboard"]).unwrap();
        assert!(!cli.dry_run);
        assert!(cli.jobs.is_empty());
    }
}
