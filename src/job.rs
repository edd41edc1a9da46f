//! Scrape jobs and their lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// One leaderboard URL and the tab it is published to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub url: String,
    pub tab: String,
}

impl ScrapeJob {
    pub fn new(url: impl Into<String>, tab: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tab: tab.into(),
        }
    }
}

/// Job lifecycle.
///
/// ```text
/// Pending -> Fetching <-> Paginating -> Extracted -> Publishing -> Done
///               |             |                          |
///               +--> Abandoned <--+                PublishFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Fetching,
    Paginating,
    Extracted,
    Publishing,
    Done,
    Abandoned,
    PublishFailed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Abandoned | JobState::PublishFailed)
    }

    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Pending, Fetching)
                | (Fetching, Paginating)
                | (Paginating, Fetching)
                | (Fetching, Extracted)
                | (Paginating, Extracted)
                | (Fetching, Abandoned)
                | (Paginating, Abandoned)
                | (Extracted, Publishing)
                | (Publishing, Done)
                | (Publishing, PublishFailed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Pending => "pending",
            JobState::Fetching => "fetching",
            JobState::Paginating => "paginating",
            JobState::Extracted => "extracted",
            JobState::Publishing => "publishing",
            JobState::Done => "done",
            JobState::Abandoned => "abandoned",
            JobState::PublishFailed => "publish failed",
        };
        f.write_str(name)
    }
}

/// Progress of one job through its lifecycle
#[derive(Debug, Clone)]
pub struct JobProgress {
    state: JobState,
    pages: u32,
}

impl Default for JobProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl JobProgress {
    pub fn new() -> Self {
        Self {
            state: JobState::Pending,
            pages: 0,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Pages whose rows have been read
    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn page_done(&mut self) {
        self.pages += 1;
    }

    pub fn transition(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid job transition {} -> {}",
            self.state,
            next
        );
        debug!("job state {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Final outcome of one job
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job: ScrapeJob,
    pub state: JobState,
    pub pages: u32,
    pub records: usize,
    pub error: Option<String>,
}

/// Outcome of a whole run, in job order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|j| j.state == JobState::Done).count()
    }

    pub fn failed(&self) -> usize {
        self.jobs.len() - self.succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut progress = JobProgress::new();
        for next in [
            JobState::Fetching,
            JobState::Paginating,
            JobState::Fetching,
            JobState::Paginating,
            JobState::Extracted,
            JobState::Publishing,
            JobState::Done,
        ] {
            progress.transition(next);
        }
        assert_eq!(progress.state(), JobState::Done);
        assert!(progress.state().is_terminal());
    }

    #[test]
    fn test_failure_terminals() {
        assert!(JobState::Fetching.can_transition_to(JobState::Abandoned));
        assert!(JobState::Paginating.can_transition_to(JobState::Abandoned));
        assert!(JobState::Publishing.can_transition_to(JobState::PublishFailed));
        assert!(!JobState::Extracted.can_transition_to(JobState::Abandoned));
        assert!(!JobState::Done.can_transition_to(JobState::Fetching));
        assert!(!JobState::Pending.can_transition_to(JobState::Publishing));
    }

    #[test]
    fn test_report_counts() {
        let job = ScrapeJob::new("https://example.com", "Tab");
        let report = RunReport {
            jobs: vec![
                JobReport {
                    job: job.clone(),
                    state: JobState::Done,
                    pages: 2,
                    records: 10,
                    error: None,
                },
                JobReport {
                    job,
                    state: JobState::Abandoned,
                    pages: 0,
                    records: 0,
                    error: Some("timeout".to_string()),
                },
            ],
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
    }
}
