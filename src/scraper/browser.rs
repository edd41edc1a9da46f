//! Browser automation using chromiumoxide.

use async_trait::async_trait;
use chromiumoxide::{Browser as ChromeBrowser, BrowserConfig, Element, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::session::{PageElement, PageSession};
use crate::config::BrowserSettings;
use crate::error::SessionError;

/// Headless Chromium holding a single tab
pub struct Browser {
    browser: ChromeBrowser,
    handle: tokio::task::JoinHandle<()>,
    page: Page,
    poll_interval: Duration,
    closed: bool,
}

impl Browser {
    /// Launch a new headless browser instance
    pub async fn launch(settings: &BrowserSettings, poll_interval: Duration) -> Result<Self, SessionError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--mute-audio")
            .window_size(settings.window_width, settings.window_height);

        if let Some(path) = &settings.executable {
            builder = builder.chrome_executable(path);
        }
        if !settings.headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| SessionError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = ChromeBrowser::launch(config)
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to launch browser: {}", e)))?;

        // Spawn handler task - must keep running for browser to work
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to create new page: {}", e)))?;

        Ok(Self {
            browser,
            handle,
            page,
            poll_interval,
            closed: false,
        })
    }
}

#[async_trait]
impl PageSession for Browser {
    type Element = BrowserElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<BrowserElement>, SessionError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| query_error(selector, e))?;
        Ok(elements.into_iter().map(BrowserElement).collect())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handle.abort();
        result
            .map(|_| ())
            .map_err(|e| SessionError::Browser(format!("Failed to close browser: {}", e)))
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Browser dropped without close, stopping its CDP handler");
            self.handle.abort();
        }
    }
}

/// Element handle inside the browser tab
pub struct BrowserElement(Element);

#[async_trait]
impl PageElement for BrowserElement {
    async fn text(&self) -> Result<String, SessionError> {
        let text = self
            .0
            .inner_text()
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to read element text: {}", e)))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, SessionError> {
        self.0
            .attribute(name)
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to read attribute {}: {}", name, e)))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, SessionError> {
        let elements = self
            .0
            .find_elements(selector)
            .await
            .map_err(|e| query_error(selector, e))?;
        Ok(elements.into_iter().map(BrowserElement).collect())
    }
}

fn query_error(selector: &str, e: chromiumoxide::error::CdpError) -> SessionError {
    SessionError::Query {
        selector: selector.to_string(),
        message: e.to_string(),
    }
}
