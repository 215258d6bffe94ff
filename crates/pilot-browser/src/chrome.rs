//! Chrome page driver
//!
//! Drives one tab of a Chrome/Chromium instance through `headless_chrome`.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, Element, LaunchOptionsBuilder, Tab};
use tracing::{debug, info, warn};

use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};
use crate::selector::Selector;

/// Serializes a clone of the document with live input values written into
/// the markup, leaving the page itself untouched.
const SNAPSHOT_SCRIPT: &str = r#"(() => {
  const live = document.documentElement;
  const clone = live.cloneNode(true);
  const src = live.querySelectorAll('input, textarea, select');
  const dst = clone.querySelectorAll('input, textarea, select');
  src.forEach((el, i) => {
    const copy = dst[i];
    if (!copy) return;
    if (el.tagName === 'TEXTAREA') {
      copy.textContent = el.value;
    } else if (el.tagName === 'SELECT') {
      Array.from(copy.options).forEach((opt, j) => {
        if (el.options[j] && el.options[j].selected) opt.setAttribute('selected', '');
        else opt.removeAttribute('selected');
      });
    } else if (el.type === 'checkbox' || el.type === 'radio') {
      if (el.checked) copy.setAttribute('checked', ''); else copy.removeAttribute('checked');
    } else if (el.type !== 'password') {
      copy.setAttribute('value', el.value);
    }
  });
  const doctype = document.doctype ? '<!DOCTYPE ' + document.doctype.name + '>' : '';
  return doctype + clone.outerHTML;
})()"#;

const CLEAR_SCRIPT: &str = r#"function (value) {
  this.focus();
  if ('value' in this) {
    this.value = value;
  } else if (this.isContentEditable) {
    this.textContent = value;
  }
  this.dispatchEvent(new Event('input', { bubbles: true }));
  this.dispatchEvent(new Event('change', { bubbles: true }));
}"#;

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Whether to run in headless mode
    pub headless: bool,
    /// Fixed window size; `None` keeps the browser default and lets the
    /// viewport follow the window
    pub window_size: Option<(u32, u32)>,
    /// How long the devtools connection may stay idle before it is dropped
    pub idle_timeout: Duration,
    /// Enable GPU acceleration
    pub enable_gpu: bool,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window_size: None,
            idle_timeout: Duration::from_secs(24 * 60 * 60),
            enable_gpu: true,
            user_agent: None,
        }
    }
}

impl BrowserConfig {
    /// Create a new configuration builder
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }

    /// Create a headless configuration
    pub fn headless() -> Self {
        Self {
            headless: true,
            ..Default::default()
        }
    }

    /// Create a visible browser configuration
    pub fn visible() -> Self {
        Self {
            headless: false,
            ..Default::default()
        }
    }
}

/// Builder for BrowserConfig
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn window_size(mut self, size: Option<(u32, u32)>) -> Self {
        self.config.window_size = size;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn enable_gpu(mut self, enable: bool) -> Self {
        self.config.enable_gpu = enable;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

fn launch_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        "--disable-dev-shm-usage".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];

    if let Some((width, height)) = config.window_size {
        args.push(format!("--window-size={},{}", width, height));
    }

    if !config.enable_gpu {
        args.push("--disable-gpu".to_string());
        args.push("--disable-software-rasterizer".to_string());
    }

    if let Some(ref ua) = config.user_agent {
        args.push(format!("--user-agent={}", ua));
    }

    args
}

/// One tab of a launched Chrome instance
pub struct ChromePage {
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    /// Launch Chrome and take over its first tab
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        info!("Launching browser (headless: {})", config.headless);

        let args = launch_args(config);
        let os_args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();

        let launch_options = LaunchOptionsBuilder::default()
            .headless(config.headless)
            .window_size(config.window_size)
            .idle_browser_timeout(config.idle_timeout)
            .args(os_args)
            .build()
            .map_err(|e| {
                BrowserError::Initialization(format!("Failed to build launch options: {}", e))
            })?;

        let browser = Browser::new(launch_options).map_err(|e| {
            BrowserError::Initialization(format!("Failed to launch browser: {}", e))
        })?;

        let existing = browser
            .get_tabs()
            .lock()
            .map_err(|e| BrowserError::Initialization(format!("Failed to lock tabs: {}", e)))?
            .first()
            .cloned();

        let tab = match existing {
            Some(tab) => tab,
            None => browser.new_tab().map_err(|e| {
                BrowserError::Initialization(format!("Failed to open a tab: {}", e))
            })?,
        };

        info!("Browser ready (tab {})", tab.get_target_id());

        Ok(Self { browser, tab })
    }

    fn find(&self, selector: &str, timeout: Duration) -> Result<Element<'_>> {
        let found = match Selector::parse(selector) {
            Selector::Css(css) => self.tab.wait_for_element_with_custom_timeout(&css, timeout),
            Selector::XPath(xpath) => self.tab.wait_for_xpath_with_custom_timeout(&xpath, timeout),
        };

        found.map_err(|e| {
            debug!("Lookup of '{}' failed: {}", selector, e);
            BrowserError::ElementNotFound(format!(
                "no element matches '{}' within {}ms",
                selector,
                timeout.as_millis()
            ))
        })
    }
}

impl PageDriver for ChromePage {
    fn is_closed(&self) -> bool {
        let target_id = self.tab.get_target_id();
        let tab_listed = match self.browser.get_tabs().lock() {
            Ok(tabs) => tabs.iter().any(|t| t.get_target_id() == target_id),
            Err(_) => false,
        };

        if !tab_listed {
            return true;
        }

        // The tab list is not updated when the whole browser goes away.
        match self.browser.get_version() {
            Ok(_) => false,
            Err(e) => {
                warn!("Browser no longer responds: {}", e);
                true
            }
        }
    }

    fn goto(&self, url: &str) -> Result<()> {
        self.tab.navigate_to(url).map_err(|e| {
            BrowserError::Navigation(format!("Failed to navigate to {}: {}", url, e))
        })?;

        self.tab.wait_until_navigated().map_err(|e| {
            BrowserError::Timeout(format!("Navigation to {} did not settle: {}", url, e))
        })?;

        Ok(())
    }

    fn click(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.find(selector, timeout)?.click().map_err(|e| {
            BrowserError::Interaction(format!("Failed to click '{}': {}", selector, e))
        })?;
        Ok(())
    }

    fn fill(&self, selector: &str, value: &str, timeout: Duration) -> Result<()> {
        self.find(selector, timeout)?
            .call_js_fn(CLEAR_SCRIPT, vec![serde_json::Value::from(value)], false)
            .map_err(|e| {
                BrowserError::Interaction(format!("Failed to fill '{}': {}", selector, e))
            })?;
        Ok(())
    }

    fn type_text(&self, selector: &str, text: &str, timeout: Duration) -> Result<()> {
        self.find(selector, timeout)?.focus().map_err(|e| {
            BrowserError::Interaction(format!("Failed to focus '{}': {}", selector, e))
        })?;

        self.tab
            .type_str(text)
            .map_err(|e| BrowserError::Interaction(format!("Failed to type text: {}", e)))?;
        Ok(())
    }

    fn press(&self, selector: &str, key: &str, timeout: Duration) -> Result<()> {
        self.find(selector, timeout)?.focus().map_err(|e| {
            BrowserError::Interaction(format!("Failed to focus '{}': {}", selector, e))
        })?;

        self.tab
            .press_key(key)
            .map_err(|e| BrowserError::Interaction(format!("Failed to press {}: {}", key, e)))?;
        Ok(())
    }

    fn content(&self) -> Result<String> {
        let result = self
            .tab
            .evaluate(SNAPSHOT_SCRIPT, false)
            .map_err(|e| BrowserError::Extraction(format!("Failed to serialize page: {}", e)))?;

        match result.value {
            Some(serde_json::Value::String(html)) => Ok(html),
            _ => self
                .tab
                .get_content()
                .map_err(|e| BrowserError::Extraction(format!("Failed to get page source: {}", e))),
        }
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        info!("Closing browser");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_config_default() {
        let config = BrowserConfig::default();
        assert!(!config.headless);
        assert_eq!(config.window_size, None);
        assert_eq!(config.idle_timeout, Duration::from_secs(86400));
    }

    #[test]
    fn test_browser_config_builder() {
        let config = BrowserConfig::builder()
            .headless(true)
            .window_size(Some((1280, 720)))
            .idle_timeout(Duration::from_secs(60))
            .user_agent("Custom Agent")
            .build();

        assert!(config.headless);
        assert_eq!(config.window_size, Some((1280, 720)));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, Some("Custom Agent".to_string()));
    }

    #[test]
    fn test_browser_config_presets() {
        assert!(BrowserConfig::headless().headless);
        assert!(!BrowserConfig::visible().headless);
    }

    #[test]
    fn test_launch_args_follow_config() {
        let args = launch_args(&BrowserConfig::default());
        assert!(!args.iter().any(|a| a.starts_with("--window-size")));

        let args = launch_args(
            &BrowserConfig::builder()
                .window_size(Some((800, 600)))
                .enable_gpu(false)
                .build(),
        );
        assert!(args.contains(&"--window-size=800,600".to_string()));
        assert!(args.contains(&"--disable-gpu".to_string()));
    }
}
