//! Page session capability.
//!
//! A session is one navigable, scripted document view. The extractor only
//! talks to these traits, so it runs the same against a real browser and
//! against static HTML in tests.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SessionError;

#[async_trait]
pub trait PageSession: Send + Sync {
    type Element: PageElement;

    /// Load `url` in the session's document view
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// Wait until an element matching `selector` exists, up to `timeout`.
    ///
    /// Returns `false` if the element never appeared.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> bool;

    /// All elements matching `selector`, in document order
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, SessionError>;

    /// Release the session. Safe to call more than once.
    async fn close(&mut self) -> Result<(), SessionError>;
}

#[async_trait]
pub trait PageElement: Send + Sync + Sized {
    /// Rendered text content
    async fn text(&self) -> Result<String, SessionError>;

    async fn attribute(&self, name: &str) -> Result<Option<String>, SessionError>;

    /// Descendants matching `selector`, in document order
    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, SessionError>;
}
