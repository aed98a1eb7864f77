//! Heavy strategy: render a page in a JavaScript-capable browser.
//!
//! Defines the `PageRenderer` trait that abstracts over the browser engine
//! (currently Chromium via chromiumoxide). A renderer owns the engine for
//! exactly one `render` call and tears it down before returning.

pub mod chromium;

use crate::dom::DomSnapshot;
use crate::error::{ExtractError, ExtractResult};
use async_trait::async_trait;
use std::time::Duration;

/// A browser engine that loads a URL and snapshots its live DOM.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Navigate to `url`, wait for the initial DOM, and snapshot it.
    ///
    /// `timeout` bounds navigation plus DOM load. Errors are
    /// `LoadFailed`, `Timeout`, or `EngineFailure`.
    async fn render(&self, url: &str, timeout: Duration) -> ExtractResult<DomSnapshot>;
}

/// A renderer used when no browser is available; every render fails so
/// the dispatcher falls back to the light path.
pub struct NoopRenderer;

#[async_trait]
impl PageRenderer for NoopRenderer {
    async fn render(&self, _url: &str, _timeout: Duration) -> ExtractResult<DomSnapshot> {
        Err(ExtractError::EngineFailure(
            "browser not available, HTTP-only mode".into(),
        ))
    }
}
