//! Rating page scraping: browser session, pagination and row parsing.

pub mod browser;
pub mod extractor;
pub mod paginator;
pub mod parser;
pub mod session;
#[cfg(test)]
pub mod snapshot;

pub use browser::Browser;
