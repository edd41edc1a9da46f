//! Leaderboard extraction across all pages of a rating table.

use tracing::{debug, info, warn};

use super::paginator::{Advance, Paginator};
use super::parser::{parse_row, RowOutcome};
use super::session::{PageElement, PageSession};
use crate::config::{ScrapeSettings, Selectors};
use crate::error::{FetchError, ParseError};
use crate::job::{JobProgress, JobState, ScrapeJob};
use crate::types::{LeaderboardRecord, RawRow};

/// Records of one leaderboard in page order, then DOM order
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<LeaderboardRecord>,
    pub pages: u32,
}

/// Drives a page session through every page of one leaderboard
pub struct Extractor<'a, S> {
    session: &'a S,
    settings: &'a ScrapeSettings,
}

impl<'a, S: PageSession> Extractor<'a, S> {
    pub fn new(session: &'a S, settings: &'a ScrapeSettings) -> Self {
        Self { session, settings }
    }

    /// Extract every record of `job`'s leaderboard.
    ///
    /// Bad rows are skipped and logged. Only page-level failures end the
    /// extraction; an empty leaderboard is not one.
    pub async fn extract(
        &self,
        job: &ScrapeJob,
        progress: &mut JobProgress,
    ) -> Result<Extraction, FetchError> {
        let mut paginator = Paginator::new(self.session, self.settings);
        let mut records = Vec::new();

        progress.transition(JobState::Fetching);
        let mut cursor = paginator.open(&job.url).await?;

        loop {
            info!("[{}] Processing page {}", job.tab, cursor.current_page);

            let rows = read_rows(self.session, &self.settings.selectors, cursor.current_page).await?;
            let before = records.len();
            collect_records(&job.tab, cursor.current_page, &rows, &mut records);
            debug!(
                "[{}] Page {}: {} rows, {} records",
                job.tab,
                cursor.current_page,
                rows.len(),
                records.len() - before
            );
            progress.page_done();

            progress.transition(JobState::Paginating);
            match paginator.advance(cursor).await? {
                Advance::Next(next) => {
                    progress.transition(JobState::Fetching);
                    cursor = next;
                }
                Advance::Done => break,
            }
        }

        info!(
            "[{}] All pages processed: {} pages, {} records",
            job.tab,
            progress.pages(),
            records.len()
        );
        progress.transition(JobState::Extracted);

        Ok(Extraction {
            records,
            pages: progress.pages(),
        })
    }
}

/// Read the three text cells of every table row on the current page.
///
/// Rows with any other number of cells are layout noise and dropped.
pub async fn read_rows<S: PageSession>(
    session: &S,
    selectors: &Selectors,
    page: u32,
) -> Result<Vec<RawRow>, FetchError> {
    let read_error = |source| FetchError::Read { page, source };

    let rows = session.find_all(&selectors.row).await.map_err(read_error)?;
    let mut raw_rows = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let cells = row.find_all(&selectors.cells).await.map_err(read_error)?;
        if cells.len() != 3 {
            debug!("Page {}: skipping row {} with {} cells", page, index + 1, cells.len());
            continue;
        }

        raw_rows.push(RawRow::new(
            cells[0].text().await.map_err(read_error)?,
            cells[1].text().await.map_err(read_error)?,
            cells[2].text().await.map_err(read_error)?,
        ));
    }

    Ok(raw_rows)
}

/// Parse rows into records, logging the ones that are skipped
pub fn collect_records(tab: &str, page: u32, rows: &[RawRow], records: &mut Vec<LeaderboardRecord>) {
    for row in rows {
        match parse_row(row) {
            Ok(RowOutcome::Record(record)) => records.push(record),
            Ok(RowOutcome::NoGames) => {
                debug!("[{}] Page {}: no games played, skipping {}", tab, page, row);
            }
            Err(e @ ParseError::MissingRankSeparator(_)) => {
                debug!("[{}] Page {}: skipping {}: {}", tab, page, row, e);
            }
            Err(e) => {
                warn!("[{}] Page {}: skipping malformed row {}: {}", tab, page, row, e);
            }
        }
    }
}
