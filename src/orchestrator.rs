//! Runs every configured job: extract, then publish.

use tracing::{error, info, warn};

use crate::config::ScrapeSettings;
use crate::job::{JobProgress, JobReport, JobState, RunReport, ScrapeJob};
use crate::publish::{publish, SpreadsheetStore};
use crate::scraper::extractor::Extractor;
use crate::scraper::session::PageSession;

/// Sequential job runner.
///
/// One failing job is logged and recorded in the report; the remaining jobs
/// still run.
pub struct Orchestrator<'a, St> {
    store: &'a St,
    document: &'a str,
    settings: &'a ScrapeSettings,
}

impl<'a, St: SpreadsheetStore> Orchestrator<'a, St> {
    pub fn new(store: &'a St, document: &'a str, settings: &'a ScrapeSettings) -> Self {
        Self {
            store,
            document,
            settings,
        }
    }

    /// Run `jobs` in order on `session`, closing it afterwards
    pub async fn run<S: PageSession>(&self, mut session: S, jobs: &[ScrapeJob]) -> RunReport {
        let mut report = RunReport::default();

        for job in jobs {
            report.jobs.push(self.run_job(&session, job).await);
        }

        if let Err(e) = session.close().await {
            warn!("Failed to close page session: {}", e);
        }

        info!(
            "Run finished: {} of {} jobs published, {} failed",
            report.succeeded(),
            report.jobs.len(),
            report.failed()
        );
        report
    }

    async fn run_job<S: PageSession>(&self, session: &S, job: &ScrapeJob) -> JobReport {
        info!("[{}] Scraping {}", job.tab, job.url);
        let mut progress = JobProgress::new();

        let extraction = match Extractor::new(session, self.settings)
            .extract(job, &mut progress)
            .await
        {
            Ok(extraction) => extraction,
            Err(e) => {
                error!("[{}] Abandoning job for {}: {}", job.tab, job.url, e);
                progress.transition(JobState::Abandoned);
                return report(job, &progress, 0, Some(e.to_string()));
            }
        };

        progress.transition(JobState::Publishing);
        match publish(self.store, self.document, &job.tab, &extraction.records).await {
            Ok(written) => {
                progress.transition(JobState::Done);
                report(job, &progress, written, None)
            }
            Err(e) => {
                error!("[{}] Failed to publish to {}: {}", job.tab, self.document, e);
                progress.transition(JobState::PublishFailed);
                report(job, &progress, 0, Some(e.to_string()))
            }
        }
    }
}

fn report(job: &ScrapeJob, progress: &JobProgress, records: usize, error: Option<String>) -> JobReport {
    debug_assert!(progress.state().is_terminal());
    JobReport {
        job: job.clone(),
        state: progress.state(),
        pages: progress.pages(),
        records,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::MemoryStore;
    use crate::scraper::snapshot::{rating_page, SnapshotSession};
    use crate::types::CellValue;

    const SEASON: &str = "https://rating.test/rating?general=0";
    const ALL: &str = "https://rating.test/rating?general=1";

    fn settings() -> ScrapeSettings {
        ScrapeSettings {
            retry_initial_delay_ms: 0,
            retry_max_delay_ms: 0,
            ..Default::default()
        }
    }

    fn jobs() -> Vec<ScrapeJob> {
        vec![ScrapeJob::new(SEASON, "Season"), ScrapeJob::new(ALL, "All")]
    }

    #[tokio::test]
    async fn test_both_jobs_published() {
        let session = SnapshotSession::new()
            .page(SEASON, rating_page(&[("1. Alpha", "4", "40")], None))
            .page(ALL, rating_page(&[("1. Beta", "10", "95,5"), ("2. Gamma", "8", "70")], None));
        let log = session.log();
        let store = MemoryStore::new().with_tab("Квиз", "Season").with_tab("Квиз", "All");
        let settings = settings();

        let report = Orchestrator::new(&store, "Квиз", &settings)
            .run(session, &jobs())
            .await;

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.jobs[1].records, 2);
        assert_eq!(report.jobs[1].pages, 1);
        assert_eq!(store.contents("Квиз", "Season").unwrap().len(), 2);
        assert_eq!(
            store.contents("Квиз", "All").unwrap()[1][3],
            CellValue::Number(95.5)
        );
        assert!(log.is_closed());
    }

    #[tokio::test]
    async fn test_abandoned_job_does_not_stop_the_run() {
        let session = SnapshotSession::new()
            .page(SEASON, rating_page(&[("1. Alpha", "4", "40")], None))
            .flaky(SEASON, 3)
            .page(ALL, rating_page(&[("1. Beta", "10", "95")], None));
        let log = session.log();
        let stale = vec![vec![CellValue::Text("previous".to_string())]];
        let store = MemoryStore::new()
            .with_tab_contents("Квиз", "Season", stale.clone())
            .with_tab("Квиз", "All");
        let settings = settings();

        let report = Orchestrator::new(&store, "Квиз", &settings)
            .run(session, &jobs())
            .await;

        assert_eq!(report.jobs[0].state, JobState::Abandoned);
        assert_eq!(report.jobs[0].records, 0);
        assert!(report.jobs[0].error.is_some());
        assert_eq!(report.jobs[1].state, JobState::Done);

        // nothing was published for the abandoned job
        assert_eq!(store.contents("Квиз", "Season").unwrap(), stale);
        assert_eq!(store.contents("Квиз", "All").unwrap().len(), 2);
        assert!(log.is_closed());
    }

    #[tokio::test]
    async fn test_publish_failure_is_isolated() {
        let session = SnapshotSession::new()
            .page(SEASON, rating_page(&[("1. Alpha", "4", "40")], None))
            .page(ALL, rating_page(&[("1. Beta", "10", "95")], None));
        let store = MemoryStore::new().with_tab("Квиз", "All");
        let settings = settings();

        let report = Orchestrator::new(&store, "Квиз", &settings)
            .run(session, &jobs())
            .await;

        assert_eq!(report.jobs[0].state, JobState::PublishFailed);
        assert_eq!(report.jobs[0].pages, 1);
        assert_eq!(report.jobs[1].state, JobState::Done);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_session_closed_when_every_job_fails() {
        let session = SnapshotSession::new();
        let log = session.log();
        let store = MemoryStore::new();
        let settings = settings();

        let report = Orchestrator::new(&store, "Квиз", &settings)
            .run(session, &jobs())
            .await;

        assert_eq!(report.succeeded(), 0);
        assert!(report.jobs.iter().all(|j| j.state == JobState::Abandoned));
        assert!(log.is_closed());
    }

    #[tokio::test]
    async fn test_no_jobs() {
        let session = SnapshotSession::new();
        let log = session.log();
        let store = MemoryStore::new();
        let settings = settings();

        let report = Orchestrator::new(&store, "Квиз", &settings)
            .run(session, &[])
            .await;

        assert!(report.jobs.is_empty());
        assert!(log.is_closed());
    }
}
