//! In-memory page session over static HTML, for tests.

use async_trait::async_trait;
use ::scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::session::{PageElement, PageSession};
use crate::error::SessionError;

const BLANK: &str = "<html><body><p>Loading...</p></body></html>";

/// Navigation history shared with the test after the session is moved away
#[derive(Debug, Default)]
pub struct SessionLog {
    visits: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl SessionLog {
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Serves canned pages by URL.
///
/// A flaky URL renders a blank document (no marker) for its first `n` loads.
#[derive(Default)]
pub struct SnapshotSession {
    pages: HashMap<String, String>,
    failures: Mutex<HashMap<String, u32>>,
    current: Mutex<String>,
    log: Arc<SessionLog>,
}

impl SnapshotSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn flaky(self, url: &str, failures: u32) -> Self {
        self.failures.lock().unwrap().insert(url.to_string(), failures);
        self
    }

    pub fn log(&self) -> Arc<SessionLog> {
        self.log.clone()
    }
}

#[async_trait]
impl PageSession for SnapshotSession {
    type Element = SnapshotElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.log.visits.lock().unwrap().push(url.to_string());

        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(url).filter(|n| **n > 0) {
            *remaining -= 1;
            *self.current.lock().unwrap() = BLANK.to_string();
            return Ok(());
        }

        let html = self.pages.get(url).ok_or_else(|| SessionError::Navigation {
            url: url.to_string(),
            message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        })?;
        *self.current.lock().unwrap() = html.clone();
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> bool {
        let current = self.current.lock().unwrap().clone();
        select(&Html::parse_document(&current), selector).is_ok_and(|found| !found.is_empty())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<SnapshotElement>, SessionError> {
        let current = self.current.lock().unwrap().clone();
        select(&Html::parse_document(&current), selector)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.log.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Detached copy of a matched element
#[derive(Debug, Clone)]
pub struct SnapshotElement {
    html: String,
    text: String,
    attributes: HashMap<String, String>,
}

#[async_trait]
impl PageElement for SnapshotElement {
    async fn text(&self) -> Result<String, SessionError> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, SessionError> {
        Ok(self.attributes.get(name).cloned())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, SessionError> {
        select(&Html::parse_fragment(&self.html), selector)
    }
}

fn select(document: &Html, selector: &str) -> Result<Vec<SnapshotElement>, SessionError> {
    let parsed = Selector::parse(selector).map_err(|e| SessionError::Query {
        selector: selector.to_string(),
        message: e.to_string(),
    })?;

    Ok(document
        .select(&parsed)
        .map(|el| SnapshotElement {
            html: el.html(),
            text: el.text().collect(),
            attributes: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
        .collect())
}

/// Render a rating page the way the site lays it out.
///
/// `next` is the href of the enabled next control; `None` renders it disabled.
pub fn rating_page(rows: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let mut html = String::from(
        "<html><body><div class=\"rating-table\">\
         <div class=\"rating-table-head rating-table-row flex-row\">\
         <div class=\"rating-table-row-td1\">Команда</div>\
         <div class=\"rating-table-row-td2\">Игры</div>\
         <div class=\"rating-table-row-td3\">Баллы</div></div>",
    );

    for (rank_team, games, points) in rows {
        html.push_str(&format!(
            "<div class=\"rating-table-row flex-row\">\
             <div class=\"rating-table-row-td1\">{}</div>\
             <div class=\"rating-table-row-td2\">{}</div>\
             <div class=\"rating-table-row-td3\">{}</div></div>",
            rank_team, games, points
        ));
    }

    html.push_str("</div><ul class=\"pagination\"><li class=\"prev disabled\"><span>&laquo;</span></li>");
    match next {
        Some(href) => html.push_str(&format!(
            "<li class=\"next\"><a href=\"{}\">&raquo;</a></li>",
            href
        )),
        None => html.push_str("<li class=\"next disabled\"><span>&raquo;</span></li>"),
    }
    html.push_str("</ul></body></html>");
    html
}
