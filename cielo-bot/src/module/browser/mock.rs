//! Scripted in-memory render session for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BrowserError, RenderPage, RenderSession, SessionProvider, WaitUntil};

/// Shared scripting state. Build one per test with struct-update syntax
/// over `MockState::default()` and inspect `ops` / `close_count` after.
#[derive(Default)]
pub struct MockState {
    /// Chronological log of page operations.
    pub ops: Mutex<Vec<String>>,
    pub close_count: AtomicUsize,
    pub navigations: AtomicUsize,
    /// `wait_for_visible` on this selector fails.
    pub fail_wait_selector: Option<String>,
    /// Restrict the failure above to the n-th navigation (1-based).
    pub fail_wait_on_visit: Option<usize>,
    /// `wait_for_visible` on this selector never completes.
    pub hang_wait_selector: Option<String>,
    /// Successive `attribute` results; when exhausted, `default_attribute`.
    pub attribute_script: Mutex<VecDeque<Option<String>>>,
    pub default_attribute: Option<String>,
}

impl MockState {
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    fn log(&self, op: String) {
        self.ops.lock().unwrap().push(op);
    }
}

pub struct MockProvider {
    pub state: Arc<MockState>,
}

impl MockProvider {
    pub fn new(state: Arc<MockState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl SessionProvider for MockProvider {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, BrowserError> {
        self.state.log("open_session".to_string());
        Ok(Box::new(MockSession {
            state: self.state.clone(),
        }))
    }
}

pub struct MockSession {
    state: Arc<MockState>,
}

#[async_trait]
impl RenderSession for MockSession {
    async fn open_page(&self) -> Result<Box<dyn RenderPage>, BrowserError> {
        self.state.log("open_page".to_string());
        Ok(Box::new(MockPage {
            state: self.state.clone(),
        }))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.state.log("close".to_string());
        self.state.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockPage {
    state: Arc<MockState>,
}

#[async_trait]
impl RenderPage for MockPage {
    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), BrowserError> {
        self.state.log(format!("viewport:{width}x{height}"));
        Ok(())
    }

    async fn navigate(
        &self,
        url: &str,
        _wait: WaitUntil,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.state.navigations.fetch_add(1, Ordering::SeqCst);
        self.state.log(format!("navigate:{url}"));
        Ok(())
    }

    async fn wait_for_visible(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.state.log(format!("wait:{selector}"));

        if self.state.hang_wait_selector.as_deref() == Some(selector) {
            // Far beyond any configured bound; the caller's timeout fires first.
            tokio::time::sleep(Duration::from_secs(100_000)).await;
        }

        if self.state.fail_wait_selector.as_deref() == Some(selector) {
            let visit = self.state.navigations.load(Ordering::SeqCst);
            let applies = self
                .state
                .fail_wait_on_visit
                .map(|wanted| wanted == visit)
                .unwrap_or(true);
            if applies {
                return Err(BrowserError::ElementWait {
                    selector: selector.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.state.log(format!("click:{selector}"));
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<(), BrowserError> {
        self.state.log(format!("evaluate:{expression}"));
        Ok(())
    }

    async fn attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.state.log(format!("attribute:{selector}@{name}"));
        let scripted = self.state.attribute_script.lock().unwrap().pop_front();
        Ok(match scripted {
            Some(value) => value,
            None => self.state.default_attribute.clone(),
        })
    }

    async fn screenshot_element(&self, selector: &str) -> Result<Vec<u8>, BrowserError> {
        self.state.log(format!("screenshot_element:{selector}"));
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn screenshot_full_page(&self) -> Result<Vec<u8>, BrowserError> {
        self.state.log("screenshot_full_page".to_string());
        Ok(vec![0x89, b'P', b'N', b'G', b'!'])
    }
}
