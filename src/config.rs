//! Configuration for quizboard.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::job::ScrapeJob;
use crate::retry::RetryConfig;

/// Browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Chrome binary; detected automatically when unset
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

/// CSS selectors for the rating page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selectors {
    /// Present once the table has rendered
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_row")]
    pub row: String,
    /// Cells inside a row: rank+team, games, points
    #[serde(default = "default_cells")]
    pub cells: String,
    /// Enabled "next" link of the pagination widget
    #[serde(default = "default_next_link")]
    pub next_link: String,
}

fn default_marker() -> String {
    ".rating-table".to_string()
}

fn default_row() -> String {
    "div.rating-table-row.flex-row".to_string()
}

fn default_cells() -> String {
    "div.rating-table-row-td1, div.rating-table-row-td2, div.rating-table-row-td3".to_string()
}

fn default_next_link() -> String {
    "ul.pagination li.next:not(.disabled) a".to_string()
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            row: default_row(),
            cells: default_cells(),
            next_link: default_next_link(),
        }
    }
}

/// Page loading and traversal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeSettings {
    #[serde(default = "default_marker_timeout_secs")]
    pub marker_timeout_secs: u64,
    /// Upper bound for one navigate + wait attempt
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub selectors: Selectors,
}

fn default_marker_timeout_secs() -> u64 {
    30
}

fn default_attempt_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    1000
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_max_pages() -> u32 {
    200
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            marker_timeout_secs: default_marker_timeout_secs(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            max_pages: default_max_pages(),
            poll_interval_ms: default_poll_interval_ms(),
            selectors: Selectors::default(),
        }
    }
}

impl ScrapeSettings {
    pub fn marker_timeout(&self) -> Duration {
        Duration::from_secs(self.marker_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Retry policy for page loads
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            attempt_timeout: Some(Duration::from_secs(self.attempt_timeout_secs)),
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            multiplier: 2.0,
        }
    }
}

/// Spreadsheet store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsSettings {
    /// Name of the spreadsheet holding the destination tabs
    #[serde(default = "default_document")]
    pub document: String,
    /// Service account key file
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    /// Pre-issued OAuth access token; the credentials file is not read when set
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_sheets_endpoint")]
    pub sheets_endpoint: String,
    #[serde(default = "default_drive_endpoint")]
    pub drive_endpoint: String,
}

fn default_document() -> String {
    "Квиз".to_string()
}

fn default_credentials_path() -> String {
    "credentials.json".to_string()
}

fn default_sheets_endpoint() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_drive_endpoint() -> String {
    "https://www.googleapis.com".to_string()
}

impl Default for SheetsSettings {
    fn default() -> Self {
        Self {
            document: default_document(),
            credentials_path: default_credentials_path(),
            access_token: None,
            sheets_endpoint: default_sheets_endpoint(),
            drive_endpoint: default_drive_endpoint(),
        }
    }
}

fn default_jobs() -> Vec<ScrapeJob> {
    vec![
        ScrapeJob::new(
            "https://orenburg.quizplease.ru/rating?QpRaitingSearch[general]=0",
            "Season",
        ),
        ScrapeJob::new(
            "https://orenburg.quizplease.ru/rating?QpRaitingSearch[general]=1",
            "All",
        ),
    ]
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub scrape: ScrapeSettings,
    #[serde(default)]
    pub sheets: SheetsSettings,
    #[serde(default = "default_jobs")]
    pub jobs: Vec<ScrapeJob>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            browser: BrowserSettings::default(),
            scrape: ScrapeSettings::default(),
            sheets: SheetsSettings::default(),
            jobs: default_jobs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, a config file and the environment.
    ///
    /// Without an explicit path, `quizboard.toml` in the working directory is
    /// read if present. Environment variables such as
    /// `QUIZBOARD__SHEETS__CREDENTIALS_PATH` override both.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("quizboard").required(false),
        };

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("QUIZBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the run cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scrape = &self.scrape;
        if scrape.max_attempts == 0 {
            return Err(ConfigError::Invalid("scrape.max_attempts must be at least 1".into()));
        }
        if scrape.marker_timeout_secs == 0 || scrape.attempt_timeout_secs == 0 {
            return Err(ConfigError::Invalid("scrape timeouts must be positive".into()));
        }
        if scrape.max_pages == 0 {
            return Err(ConfigError::Invalid("scrape.max_pages must be at least 1".into()));
        }
        if self.sheets.document.trim().is_empty() {
            return Err(ConfigError::Invalid("sheets.document must not be empty".into()));
        }

        for job in &self.jobs {
            if job.tab.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("job {} has an empty tab name", job.url)));
            }
            url::Url::parse(&job.url)
                .map_err(|e| ConfigError::Invalid(format!("job {}: invalid url {}: {}", job.tab, job.url, e)))?;
        }

        Ok(())
    }

    /// Keep only the jobs publishing to one of `tabs`
    pub fn select_jobs(&mut self, tabs: &[String]) -> Result<(), ConfigError> {
        if tabs.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = tabs.iter().find(|t| !self.jobs.iter().any(|j| &j.tab == *t)) {
            return Err(ConfigError::Invalid(format!("no job publishes to tab {}", unknown)));
        }
        self.jobs.retain(|j| tabs.contains(&j.tab));
        Ok(())
    }
}
