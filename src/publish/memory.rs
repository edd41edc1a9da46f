//! In-memory spreadsheet store, used for dry runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Spreadsheet, SpreadsheetStore, Worksheet};
use crate::error::PublishError;
use crate::types::CellValue;

type Grid = Vec<Vec<CellValue>>;
type Documents = HashMap<String, HashMap<String, Grid>>;

/// Documents and tabs held in memory; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<Documents>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty tab, creating the document if needed
    pub fn with_tab(self, document: &str, tab: &str) -> Self {
        self.with_tab_contents(document, tab, Vec::new())
    }

    pub fn with_tab_contents(self, document: &str, tab: &str, rows: Grid) -> Self {
        self.lock()
            .entry(document.to_string())
            .or_default()
            .insert(tab.to_string(), rows);
        self
    }

    /// Current values of a tab
    pub fn contents(&self, document: &str, tab: &str) -> Option<Grid> {
        self.lock().get(document)?.get(tab).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Documents> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SpreadsheetStore for MemoryStore {
    type Document = MemoryDocument;

    async fn open_document(&self, name: &str) -> Result<MemoryDocument, PublishError> {
        if !self.lock().contains_key(name) {
            return Err(PublishError::DocumentNotFound(name.to_string()));
        }
        Ok(MemoryDocument {
            store: self.clone(),
            name: name.to_string(),
        })
    }
}

pub struct MemoryDocument {
    store: MemoryStore,
    name: String,
}

#[async_trait]
impl Spreadsheet for MemoryDocument {
    type Sheet = MemoryWorksheet;

    async fn worksheet(&self, title: &str) -> Result<MemoryWorksheet, PublishError> {
        let exists = self
            .store
            .lock()
            .get(&self.name)
            .is_some_and(|tabs| tabs.contains_key(title));
        if !exists {
            return Err(PublishError::WorksheetNotFound {
                document: self.name.clone(),
                tab: title.to_string(),
            });
        }
        Ok(MemoryWorksheet {
            store: self.store.clone(),
            document: self.name.clone(),
            tab: title.to_string(),
        })
    }
}

pub struct MemoryWorksheet {
    store: MemoryStore,
    document: String,
    tab: String,
}

impl MemoryWorksheet {
    fn with_grid<T>(&self, f: impl FnOnce(&mut Grid) -> T) -> Result<T, PublishError> {
        let mut documents = self.store.lock();
        let grid = documents
            .get_mut(&self.document)
            .and_then(|tabs| tabs.get_mut(&self.tab))
            .ok_or_else(|| PublishError::WorksheetNotFound {
                document: self.document.clone(),
                tab: self.tab.clone(),
            })?;
        Ok(f(grid))
    }
}

#[async_trait]
impl Worksheet for MemoryWorksheet {
    async fn clear(&self) -> Result<(), PublishError> {
        self.with_grid(|grid| grid.clear())
    }

    async fn write(&self, origin: &str, rows: &[Vec<CellValue>]) -> Result<(), PublishError> {
        let (row0, col0) = parse_a1(origin).ok_or_else(|| PublishError::Api {
            status: 400,
            message: format!("invalid cell reference {}", origin),
        })?;

        self.with_grid(|grid| {
            for (r, values) in rows.iter().enumerate() {
                let target = row0 + r;
                if grid.len() <= target {
                    grid.resize(target + 1, Vec::new());
                }
                let line = &mut grid[target];
                for (c, value) in values.iter().enumerate() {
                    let col = col0 + c;
                    if line.len() <= col {
                        line.resize(col + 1, CellValue::Text(String::new()));
                    }
                    line[col] = value.clone();
                }
            }
        })
    }
}

/// Zero-based (row, column) of an A1 cell reference
fn parse_a1(cell: &str) -> Option<(usize, usize)> {
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let col = letters
        .to_ascii_uppercase()
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1));
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}
