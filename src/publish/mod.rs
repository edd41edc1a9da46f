//! Publishing leaderboards to a spreadsheet store.
//!
//! A publish is a full overwrite of one existing tab: clear, then write the
//! header and every record from `A1`.

pub mod google;
pub mod memory;

use async_trait::async_trait;
use tracing::info;

use crate::error::PublishError;
use crate::types::{table_rows, CellValue, LeaderboardRecord};

pub use google::GoogleSheets;
pub use memory::MemoryStore;

/// A store of named spreadsheet documents
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    type Document: Spreadsheet;

    /// Open a document by its name
    async fn open_document(&self, name: &str) -> Result<Self::Document, PublishError>;
}

#[async_trait]
pub trait Spreadsheet: Send + Sync {
    type Sheet: Worksheet;

    /// Select an existing tab by exact title
    async fn worksheet(&self, title: &str) -> Result<Self::Sheet, PublishError>;
}

#[async_trait]
pub trait Worksheet: Send + Sync {
    /// Remove every value in the tab
    async fn clear(&self) -> Result<(), PublishError>;

    /// Write `rows` with the first cell at `origin` (A1 notation)
    async fn write(&self, origin: &str, rows: &[Vec<CellValue>]) -> Result<(), PublishError>;
}

/// Replace the contents of `tab` in `document` with `records`.
///
/// Returns the number of data rows written.
pub async fn publish<St: SpreadsheetStore>(
    store: &St,
    document: &str,
    tab: &str,
    records: &[LeaderboardRecord],
) -> Result<usize, PublishError> {
    let spreadsheet = store.open_document(document).await?;
    let sheet = spreadsheet.worksheet(tab).await?;

    sheet.clear().await?;
    sheet.write("A1", &table_rows(records)).await?;

    info!("Published {} records to {}/{}", records.len(), document, tab);
    Ok(records.len())
}
