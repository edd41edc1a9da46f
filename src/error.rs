//! Error types for each stage of a run.
//!
//! Only [`ConfigError`] is allowed to end a run. Fetch and publish failures
//! abort the current job, parse failures only drop the offending row.

use std::time::Duration;
use thiserror::Error;

/// Startup configuration or credential failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read credentials from {path}: {source}")]
    Credentials {
        path: String,
        #[source]
        source: gcp_auth::Error,
    },
}

/// A single page session operation failed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("marker `{selector}` did not appear within {timeout:?}")]
    MarkerMissing { selector: String, timeout: Duration },

    #[error("DOM query `{selector}` failed: {message}")]
    Query { selector: String, message: String },

    #[error("operation timed out")]
    TimedOut(#[from] tokio::time::error::Elapsed),

    #[error("browser error: {0}")]
    Browser(String),
}

/// A leaderboard could not be traversed. Abandons the current job.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page {page} ({url}) unavailable after {attempts} attempts: {source}")]
    Unavailable {
        url: String,
        page: u32,
        attempts: u32,
        #[source]
        source: SessionError,
    },

    #[error("failed to read page {page}: {source}")]
    Read {
        page: u32,
        #[source]
        source: SessionError,
    },

    #[error("invalid next-page link `{href}` on page {page}: {source}")]
    BadLink {
        href: String,
        page: u32,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid leaderboard url `{url}`: {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("pagination exceeded the limit of {limit} pages")]
    PageLimit { limit: u32 },

    #[error("pagination returned to already visited page {url}")]
    PaginationLoop { url: String },
}

/// One table row could not be turned into a record.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no rank separator in `{0}`")]
    MissingRankSeparator(String),

    #[error("games played `{text}` is not a number")]
    InvalidGames { text: String },

    #[error("points `{text}` is not a number")]
    InvalidPoints { text: String },
}

/// The spreadsheet store rejected the publish step.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("spreadsheet `{0}` not found")]
    DocumentNotFound(String),

    #[error("worksheet `{tab}` not found in `{document}`")]
    WorksheetNotFound { document: String, tab: String },

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("spreadsheet API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to obtain access token: {0}")]
    Auth(#[from] gcp_auth::Error),
}
