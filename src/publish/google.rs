//! Google Sheets store over the Sheets v4 and Drive v3 REST APIs.
//!
//! Documents are looked up by name through Drive, tabs through the
//! spreadsheet metadata. Requests are authorized with a service account key.

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::{Spreadsheet, SpreadsheetStore, Worksheet};
use crate::config::SheetsSettings;
use crate::error::{ConfigError, PublishError};
use crate::types::CellValue;

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

enum Auth {
    ServiceAccount(CustomServiceAccount),
    Static(String),
}

struct Inner {
    http: Client,
    auth: Auth,
    sheets_endpoint: Url,
    drive_endpoint: Url,
}

/// Google Sheets client; cheap to clone
#[derive(Clone)]
pub struct GoogleSheets {
    inner: Arc<Inner>,
}

impl GoogleSheets {
    /// Create a client from the service account key at `credentials_path`
    pub fn from_settings(settings: &SheetsSettings) -> Result<Self, ConfigError> {
        let account = CustomServiceAccount::from_file(&settings.credentials_path).map_err(|source| {
            ConfigError::Credentials {
                path: settings.credentials_path.clone(),
                source,
            }
        })?;
        Self::build(settings, Auth::ServiceAccount(account))
    }

    /// Create a client sending a fixed bearer token
    pub fn with_token(settings: &SheetsSettings, token: impl Into<String>) -> Result<Self, ConfigError> {
        Self::build(settings, Auth::Static(token.into()))
    }

    fn build(settings: &SheetsSettings, auth: Auth) -> Result<Self, ConfigError> {
        let inner = Inner {
            http: Client::new(),
            auth,
            sheets_endpoint: parse_endpoint(&settings.sheets_endpoint)?,
            drive_endpoint: parse_endpoint(&settings.drive_endpoint)?,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, PublishError> {
        let token = match &self.inner.auth {
            Auth::ServiceAccount(account) => account.token(SCOPES).await?.as_str().to_string(),
            Auth::Static(token) => token.clone(),
        };
        debug!("{} {}", method, url);
        Ok(self.inner.http.request(method, url).bearer_auth(token))
    }

    fn sheets_url(&self, segments: &[&str]) -> Url {
        join_segments(&self.inner.sheets_endpoint, segments)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::Invalid(format!("invalid endpoint {}: {}", endpoint, e)))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid(format!("invalid endpoint {}", endpoint)));
    }
    Ok(url)
}

fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Quote a tab title for use in an A1 range
fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Escape a value inside a Drive query string literal
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

async fn check(response: Response) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => PublishError::Unauthorized(message),
        429 => PublishError::Quota(message),
        code => PublishError::Api { status: code, message },
    })
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[async_trait]
impl SpreadsheetStore for GoogleSheets {
    type Document = RemoteSpreadsheet;

    async fn open_document(&self, name: &str) -> Result<RemoteSpreadsheet, PublishError> {
        let mut url = join_segments(&self.inner.drive_endpoint, &["drive", "v3", "files"]);
        url.query_pairs_mut()
            .append_pair(
                "q",
                &format!(
                    "name = '{}' and mimeType = '{}' and trashed = false",
                    escape_query(name),
                    SPREADSHEET_MIME
                ),
            )
            .append_pair("fields", "files(id,name)")
            .append_pair("supportsAllDrives", "true")
            .append_pair("includeItemsFromAllDrives", "true");

        let response = self.request(Method::GET, url).await?.send().await?;
        let list: FileList = check(response).await?.json().await?;

        let file = list
            .files
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::DocumentNotFound(name.to_string()))?;

        Ok(RemoteSpreadsheet {
            client: self.clone(),
            id: file.id,
            name: name.to_string(),
        })
    }
}

/// A spreadsheet found by name
pub struct RemoteSpreadsheet {
    client: GoogleSheets,
    id: String,
    name: String,
}

#[async_trait]
impl Spreadsheet for RemoteSpreadsheet {
    type Sheet = RemoteWorksheet;

    async fn worksheet(&self, title: &str) -> Result<RemoteWorksheet, PublishError> {
        let mut url = self.client.sheets_url(&["v4", "spreadsheets", &self.id]);
        url.query_pairs_mut().append_pair("fields", "sheets.properties.title");

        let response = self.client.request(Method::GET, url).await?.send().await?;
        let meta: SpreadsheetMeta = check(response).await?.json().await?;

        if !meta.sheets.iter().any(|s| s.properties.title == title) {
            return Err(PublishError::WorksheetNotFound {
                document: self.name.clone(),
                tab: title.to_string(),
            });
        }

        Ok(RemoteWorksheet {
            client: self.client.clone(),
            spreadsheet_id: self.id.clone(),
            title: title.to_string(),
        })
    }
}

/// One tab of a remote spreadsheet
pub struct RemoteWorksheet {
    client: GoogleSheets,
    spreadsheet_id: String,
    title: String,
}

#[async_trait]
impl Worksheet for RemoteWorksheet {
    async fn clear(&self) -> Result<(), PublishError> {
        let range = format!("{}:clear", quote_title(&self.title));
        let url = self
            .client
            .sheets_url(&["v4", "spreadsheets", &self.spreadsheet_id, "values", &range]);

        let response = self
            .client
            .request(Method::POST, url)
            .await?
            .json(&json!({}))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn write(&self, origin: &str, rows: &[Vec<CellValue>]) -> Result<(), PublishError> {
        let range = format!("{}!{}", quote_title(&self.title), origin);
        let mut url = self
            .client
            .sheets_url(&["v4", "spreadsheets", &self.spreadsheet_id, "values", &range]);
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });

        let response = self
            .client
            .request(Method::PUT, url)
            .await?
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
