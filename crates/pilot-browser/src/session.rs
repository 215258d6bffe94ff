//! Browser session
//!
//! Holds the one page the agent drives and exposes the action primitives.
//! Every primitive checks that the window is still open before touching the
//! page, so nothing happens on a dead window.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::chrome::{BrowserConfig, ChromePage};
use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};

/// Default wait for an element to appear, in milliseconds
pub const DEFAULT_CLICK_TIMEOUT_MS: u64 = 8000;

/// The single browser session of the process
pub struct BrowserSession {
    page: Arc<dyn PageDriver>,
    click_timeout: Duration,
}

impl BrowserSession {
    /// Wrap an already open page
    pub fn new(page: Arc<dyn PageDriver>) -> Self {
        Self {
            page,
            click_timeout: Duration::from_millis(DEFAULT_CLICK_TIMEOUT_MS),
        }
    }

    /// Launch Chrome and wrap its first tab
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let page = ChromePage::launch(config)?;
        Ok(Self::new(Arc::new(page)))
    }

    /// Override the wait used when a caller does not pass one
    pub fn with_click_timeout(mut self, timeout: Duration) -> Self {
        self.click_timeout = timeout;
        self
    }

    pub fn click_timeout(&self) -> Duration {
        self.click_timeout
    }

    pub fn is_alive(&self) -> bool {
        !self.page.is_closed()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.page.is_closed() {
            warn!("Browser window is closed");
            return Err(BrowserError::SessionClosed);
        }
        Ok(())
    }

    /// Load an absolute URL
    pub fn navigate(&self, url: &str) -> Result<String> {
        self.ensure_open()?;

        if !is_absolute_url(url) {
            return Err(BrowserError::InvalidInput(format!(
                "'{}' is not an absolute URL",
                url
            )));
        }

        info!("Navigating to: {}", url);
        self.page.goto(url)?;

        Ok(format!("Navigated to {}", url))
    }

    /// Click the first element matching `selector`, waiting up to `timeout_ms`
    pub fn click(&self, selector: &str, timeout_ms: u64) -> Result<String> {
        self.ensure_open()?;

        if selector.trim().is_empty() {
            return Err(BrowserError::InvalidInput(
                "selector must not be empty".to_string(),
            ));
        }
        if timeout_ms == 0 {
            return Err(BrowserError::InvalidInput(
                "timeout must be a positive number of milliseconds".to_string(),
            ));
        }

        info!("Clicking element: {}", selector);
        self.page
            .click(selector, Duration::from_millis(timeout_ms))?;

        Ok(format!("Clicked '{}'", selector))
    }

    /// Replace the value of the matching input with `text`
    ///
    /// The field is cleared first, then `text` is sent key by key so the
    /// page sees input events.
    pub fn type_text(&self, selector: &str, text: &str, press_enter: bool) -> Result<String> {
        self.ensure_open()?;

        info!("Typing into element: {} ({} chars)", selector, text.chars().count());

        self.page.fill(selector, "", self.click_timeout)?;
        self.page.type_text(selector, text, self.click_timeout)?;
        if press_enter {
            debug!("Pressing Enter in {}", selector);
            self.page.press(selector, "Enter", self.click_timeout)?;
        }

        Ok(format!("Typed '{}' into '{}'", text, selector))
    }

    /// Serialized markup of the current document
    pub fn snapshot(&self) -> Result<String> {
        self.ensure_open()?;

        let html = self.page.content()?;
        debug!("Snapshot of {} bytes", html.len());

        Ok(html)
    }
}

fn is_absolute_url(url: &str) -> bool {
    match url.split_once(':') {
        Some((scheme, rest)) => {
            let scheme_ok = scheme
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            scheme_ok && !rest.is_empty()
        }
        None => false,
    }
}
