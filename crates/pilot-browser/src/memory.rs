//! In-memory page
//!
//! A [`PageDriver`] with no browser behind it. Fields and buttons are keyed
//! by the exact selector string used to address them, which is enough to
//! exercise the session and tools without launching Chrome.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};

#[derive(Debug, Default)]
struct PageState {
    closed: bool,
    url: Option<String>,
    history: Vec<String>,
    fields: BTreeMap<String, String>,
    buttons: BTreeSet<String>,
    clicks: Vec<String>,
    keys: Vec<(String, String)>,
    actions: usize,
}

/// Scriptable page kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryPage {
    state: Mutex<PageState>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an editable field addressable by `selector`
    pub fn with_field(self, selector: impl Into<String>) -> Self {
        self.lock().fields.insert(selector.into(), String::new());
        self
    }

    /// Add a clickable element addressable by `selector`
    pub fn with_button(self, selector: impl Into<String>) -> Self {
        self.lock().buttons.insert(selector.into());
        self
    }

    /// Simulate the user closing the window
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// URLs loaded so far, oldest first
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Current URL, if anything was loaded
    pub fn url(&self) -> Option<String> {
        self.lock().url.clone()
    }

    /// Selectors clicked so far
    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    pub fn field_value(&self, selector: &str) -> Option<String> {
        self.lock().fields.get(selector).cloned()
    }

    /// `(selector, key)` pairs pressed so far
    pub fn keys_pressed(&self) -> Vec<(String, String)> {
        self.lock().keys.clone()
    }

    /// Number of calls that reached the page, successful or not
    pub fn action_count(&self) -> usize {
        self.lock().actions
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        // A poisoned lock only means a test panicked mid-call.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn field<'a>(state: &'a mut PageState, selector: &str) -> Result<&'a mut String> {
        state.fields.get_mut(selector).ok_or_else(|| {
            BrowserError::ElementNotFound(format!("no element matches '{}'", selector))
        })
    }
}

impl PageDriver for MemoryPage {
    fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        state.actions += 1;
        state.url = Some(url.to_string());
        state.history.push(url.to_string());
        Ok(())
    }

    fn click(&self, selector: &str, timeout: Duration) -> Result<()> {
        let mut state = self.lock();
        state.actions += 1;
        if !state.buttons.contains(selector) && !state.fields.contains_key(selector) {
            return Err(BrowserError::ElementNotFound(format!(
                "no element matches '{}' within {}ms",
                selector,
                timeout.as_millis()
            )));
        }
        state.clicks.push(selector.to_string());
        Ok(())
    }

    fn fill(&self, selector: &str, value: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.lock();
        state.actions += 1;
        *Self::field(&mut state, selector)? = value.to_string();
        Ok(())
    }

    fn type_text(&self, selector: &str, text: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.lock();
        state.actions += 1;
        Self::field(&mut state, selector)?.push_str(text);
        Ok(())
    }

    fn press(&self, selector: &str, key: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.lock();
        state.actions += 1;
        Self::field(&mut state, selector)?;
        state.keys.push((selector.to_string(), key.to_string()));
        Ok(())
    }

    fn content(&self) -> Result<String> {
        let mut state = self.lock();
        state.actions += 1;

        let mut html = String::from("<!DOCTYPE html><html><body>");
        for (selector, value) in &state.fields {
            html.push_str(&format!(
                "<input data-selector=\"{}\" value=\"{}\">",
                escape(selector),
                escape(value)
            ));
        }
        for selector in &state.buttons {
            html.push_str(&format!("<button data-selector=\"{}\"></button>", escape(selector)));
        }
        html.push_str("</body></html>");
        Ok(html)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(10);

    #[test]
    fn test_fill_replaces_and_type_appends() {
        let page = MemoryPage::new().with_field("#q");
        page.type_text("#q", "old", WAIT).unwrap();
        page.fill("#q", "", WAIT).unwrap();
        page.type_text("#q", "new", WAIT).unwrap();
        assert_eq!(page.field_value("#q").as_deref(), Some("new"));
    }

    #[test]
    fn test_unknown_selector() {
        let page = MemoryPage::new();
        assert!(matches!(
            page.click("#missing", WAIT),
            Err(BrowserError::ElementNotFound(_))
        ));
        assert!(matches!(
            page.fill("#missing", "x", WAIT),
            Err(BrowserError::ElementNotFound(_))
        ));
        assert_eq!(page.action_count(), 2);
    }

    #[test]
    fn test_content_escapes_values() {
        let page = MemoryPage::new().with_field("#q");
        page.fill("#q", "a \"b\" <c>", WAIT).unwrap();
        let html = page.content().unwrap();
        assert!(html.contains("value=\"a &quot;b&quot; &lt;c&gt;\""));
    }
}
