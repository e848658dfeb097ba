//! Remote session implementation over the Chrome DevTools protocol.
//!
//! Connects to a browserless-style provider through its debug WebSocket
//! URL. The CDP client is blocking, so every call is shipped to the
//! blocking worker pool and never runs on the cooperative lane.

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, Tab};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BrowserError, RenderPage, RenderSession, SessionProvider, WaitUntil};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(120);
/// Grace period standing in for a network-idle signal; the CDP client
/// only exposes the load event.
const NETWORK_SETTLE_GRACE: Duration = Duration::from_secs(2);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

pub struct BrowserlessProvider {
    ws_url: String,
}

impl BrowserlessProvider {
    pub fn new(endpoint: &str, token: &str) -> Self {
        Self {
            ws_url: format!("{endpoint}?token={token}"),
        }
    }
}

#[async_trait]
impl SessionProvider for BrowserlessProvider {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, BrowserError> {
        let ws_url = self.ws_url.clone();
        let connect = tokio::task::spawn_blocking(move || Browser::connect(ws_url));

        let browser = match tokio::time::timeout(CONNECT_TIMEOUT, connect).await {
            Ok(Ok(Ok(browser))) => browser,
            Ok(Ok(Err(e))) => return Err(BrowserError::Connect(e.to_string())),
            Ok(Err(e)) => return Err(BrowserError::Connect(format!("worker aborted: {e}"))),
            Err(_) => {
                return Err(BrowserError::Connect(format!(
                    "timed out after {CONNECT_TIMEOUT:?}"
                )));
            }
        };

        Ok(Box::new(CdpSession {
            browser: Mutex::new(Some(browser)),
        }))
    }
}

pub struct CdpSession {
    browser: Mutex<Option<Browser>>,
}

#[async_trait]
impl RenderSession for CdpSession {
    async fn open_page(&self) -> Result<Box<dyn RenderPage>, BrowserError> {
        let browser = {
            let guard = self
                .browser
                .lock()
                .map_err(|_| BrowserError::Protocol("session state poisoned".to_string()))?;
            guard
                .clone()
                .ok_or_else(|| BrowserError::Protocol("session already closed".to_string()))?
        };

        let tab = run_blocking(move || {
            let tab = browser.new_tab()?;
            tab.set_user_agent(USER_AGENT, None, None)?;
            Ok(tab)
        })
        .await
        .map_err(BrowserError::Protocol)?;

        Ok(Box::new(CdpPage { tab }))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let browser = {
            let mut guard = self
                .browser
                .lock()
                .map_err(|_| BrowserError::Protocol("session state poisoned".to_string()))?;
            guard.take()
        };
        // Second close finds nothing to do.
        let Some(browser) = browser else {
            return Ok(());
        };
        // Dropping the handle tears down the WebSocket transport.
        tokio::task::spawn_blocking(move || drop(browser))
            .await
            .map_err(|e| BrowserError::Protocol(format!("close worker aborted: {e}")))?;
        Ok(())
    }
}

pub struct CdpPage {
    tab: Arc<Tab>,
}

#[async_trait]
impl RenderPage for CdpPage {
    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), BrowserError> {
        let tab = self.tab.clone();
        run_blocking(move || {
            tab.set_bounds(Bounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(width as f64),
                height: Some(height as f64),
            })?;
            Ok(())
        })
        .await
        .map_err(BrowserError::Protocol)
    }

    async fn navigate(
        &self,
        url: &str,
        wait: WaitUntil,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let tab = self.tab.clone();
        let url = url.to_string();
        run_blocking(move || {
            tab.set_default_timeout(timeout);
            tab.navigate_to(&url)?;
            tab.wait_until_navigated()?;
            if wait == WaitUntil::NetworkSettled {
                std::thread::sleep(NETWORK_SETTLE_GRACE);
            }
            Ok(())
        })
        .await
        .map_err(BrowserError::Navigation)
    }

    async fn wait_for_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let tab = self.tab.clone();
        let selector_owned = selector.to_string();
        run_blocking(move || {
            tab.wait_for_element_with_custom_timeout(&selector_owned, timeout)?;
            Ok(())
        })
        .await
        .map_err(|reason| BrowserError::ElementWait {
            selector: selector.to_string(),
            reason,
        })
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let tab = self.tab.clone();
        let selector_owned = selector.to_string();
        run_blocking(move || {
            let element = tab.find_element(&selector_owned)?;
            element.click()?;
            Ok(())
        })
        .await
        .map_err(|reason| BrowserError::ElementWait {
            selector: selector.to_string(),
            reason,
        })
    }

    async fn evaluate(&self, expression: &str) -> Result<(), BrowserError> {
        let tab = self.tab.clone();
        let expression = expression.to_string();
        run_blocking(move || {
            tab.evaluate(&expression, false)?;
            Ok(())
        })
        .await
        .map_err(BrowserError::Evaluate)
    }

    async fn attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let tab = self.tab.clone();
        let expression = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? el.getAttribute({name}) : null; }})()",
            sel = js_string(selector),
            name = js_string(name),
        );
        run_blocking(move || {
            let result = tab.evaluate(&expression, false)?;
            Ok(result
                .value
                .and_then(|v| v.as_str().map(str::to_string)))
        })
        .await
        .map_err(BrowserError::Evaluate)
    }

    async fn screenshot_element(&self, selector: &str) -> Result<Vec<u8>, BrowserError> {
        let tab = self.tab.clone();
        let selector = selector.to_string();
        run_blocking(move || {
            let element = tab.wait_for_element(&selector)?;
            let bytes = element.capture_screenshot(CaptureScreenshotFormatOption::Png)?;
            Ok(bytes)
        })
        .await
        .map_err(BrowserError::Screenshot)
    }

    async fn screenshot_full_page(&self) -> Result<Vec<u8>, BrowserError> {
        let tab = self.tab.clone();
        run_blocking(move || {
            let bytes =
                tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)?;
            Ok(bytes)
        })
        .await
        .map_err(BrowserError::Screenshot)
    }
}

/// Run one blocking CDP call on the worker pool, flattening both the join
/// and protocol failure into a message for the caller to classify.
async fn run_blocking<T: Send + 'static>(
    f: impl FnOnce() -> anyhow::Result<T> + Send + 'static,
) -> Result<T, String> {
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("render worker aborted: {e}")),
    }
}

/// Quote a string as a JavaScript literal.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
