//! Page loading and next-page discovery.

use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

use super::session::{PageElement, PageSession};
use crate::config::ScrapeSettings;
use crate::error::{FetchError, SessionError};
use crate::retry::retry;

/// Position of the traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    /// 1-based page number
    pub current_page: u32,
    pub url: Url,
}

/// Result of asking for the next page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The next page is loaded and its marker is present
    Next(PageCursor),
    /// No enabled next control; traversal is complete
    Done,
}

/// Navigate to `url` and wait for the marker, retrying the pair as a whole.
pub async fn load_page<S: PageSession>(
    session: &S,
    url: &Url,
    page: u32,
    settings: &ScrapeSettings,
) -> Result<(), FetchError> {
    let marker = settings.selectors.marker.as_str();
    let wait = settings.marker_timeout();
    let target = url.as_str();

    retry(&settings.retry(), &format!("Loading page {}", page), || async move {
        session.navigate(target).await?;
        if session.wait_for(marker, wait).await {
            Ok(())
        } else {
            Err(SessionError::MarkerMissing {
                selector: marker.to_string(),
                timeout: wait,
            })
        }
    })
    .await
    .map_err(|e| FetchError::Unavailable {
        url: target.to_string(),
        page,
        attempts: e.attempts,
        source: e.last_error,
    })
}

/// Walks the pagination widget of one leaderboard.
///
/// Every URL is visited at most once and traversal stops with an error once
/// `max_pages` would be exceeded.
pub struct Paginator<'a, S> {
    session: &'a S,
    settings: &'a ScrapeSettings,
    visited: HashSet<Url>,
}

impl<'a, S: PageSession> Paginator<'a, S> {
    pub fn new(session: &'a S, settings: &'a ScrapeSettings) -> Self {
        Self {
            session,
            settings,
            visited: HashSet::new(),
        }
    }

    /// Load the first page
    pub async fn open(&mut self, url: &str) -> Result<PageCursor, FetchError> {
        let url = Url::parse(url).map_err(|source| FetchError::BadUrl {
            url: url.to_string(),
            source,
        })?;

        load_page(self.session, &url, 1, self.settings).await?;
        self.visited.insert(url.clone());

        Ok(PageCursor { current_page: 1, url })
    }

    /// Follow the next-page link of the current page, if any
    pub async fn advance(&mut self, cursor: PageCursor) -> Result<Advance, FetchError> {
        let Some(next) = self.next_link(&cursor).await? else {
            return Ok(Advance::Done);
        };

        let page = cursor.current_page + 1;
        if page > self.settings.max_pages {
            return Err(FetchError::PageLimit {
                limit: self.settings.max_pages,
            });
        }
        if !self.visited.insert(next.clone()) {
            return Err(FetchError::PaginationLoop { url: next.to_string() });
        }

        debug!("Following next page link {}", next);
        load_page(self.session, &next, page, self.settings).await?;

        Ok(Advance::Next(PageCursor {
            current_page: page,
            url: next,
        }))
    }

    /// Target of the first enabled next control, resolved against the page URL
    pub async fn next_link(&self, cursor: &PageCursor) -> Result<Option<Url>, FetchError> {
        let page = cursor.current_page;
        let controls = self
            .session
            .find_all(&self.settings.selectors.next_link)
            .await
            .map_err(|source| FetchError::Read { page, source })?;

        let Some(control) = controls.first() else {
            return Ok(None);
        };

        let href = control
            .attribute("href")
            .await
            .map_err(|source| FetchError::Read { page, source })?;

        match href.as_deref().map(str::trim) {
            Some(href) if !href.is_empty() => cursor
                .url
                .join(href)
                .map(Some)
                .map_err(|source| FetchError::BadLink {
                    href: href.to_string(),
                    page,
                    source,
                }),
            _ => {
                warn!("Next page control on page {} has no link, stopping", page);
                Ok(None)
            }
        }
    }
}
