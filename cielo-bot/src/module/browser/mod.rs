//! Remote render session abstraction.
//!
//! A session is a short-lived handle to a network-provisioned headless
//! browser. Sessions are never shared between concurrently-running tasks:
//! each render capture and the satellite pipeline obtains its own session
//! and releases it via `close()` on every exit path. `close()` is
//! idempotent so a late cleanup after an observed timeout is harmless.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod cdp;
#[cfg(test)]
pub mod mock;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to connect to render endpoint: {0}")]
    Connect(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element '{selector}' did not become visible: {reason}")]
    ElementWait { selector: String, reason: String },

    #[error("script evaluation failed: {0}")]
    Evaluate(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("render protocol error: {0}")]
    Protocol(String),
}

/// Navigation wait condition, from weakest to strictest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    DomContentLoaded,
    Load,
    /// Page loaded and in-flight network activity given time to settle.
    NetworkSettled,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Provision a fresh session. Connect is timeout-bounded by the
    /// implementation.
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, BrowserError>;
}

#[async_trait]
pub trait RenderSession: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn RenderPage>, BrowserError>;

    /// Release the remote browser handle. Idempotent.
    async fn close(&self) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait RenderPage: Send + Sync {
    /// Fix the page dimensions before capture work begins.
    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), BrowserError>;

    async fn navigate(
        &self,
        url: &str,
        wait: WaitUntil,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    async fn wait_for_visible(&self, selector: &str, timeout: Duration)
    -> Result<(), BrowserError>;

    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    async fn evaluate(&self, expression: &str) -> Result<(), BrowserError>;

    /// Read an attribute off the first element matching `selector`.
    /// Returns `None` when the element or the attribute is absent.
    async fn attribute(&self, selector: &str, name: &str)
    -> Result<Option<String>, BrowserError>;

    async fn screenshot_element(&self, selector: &str) -> Result<Vec<u8>, BrowserError>;

    async fn screenshot_full_page(&self) -> Result<Vec<u8>, BrowserError>;
}
