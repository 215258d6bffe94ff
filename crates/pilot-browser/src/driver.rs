//! Page driver abstraction
//!
//! The capability set the browser session needs from a browser engine. The
//! Chrome implementation lives in [`crate::chrome`]; [`crate::memory`]
//! provides an in-memory page for tests.

use std::time::Duration;

use crate::error::Result;

/// A single controllable page
///
/// All calls block until the engine acknowledges them.
pub trait PageDriver: Send + Sync {
    /// Whether the page (or its window) has been closed
    fn is_closed(&self) -> bool;

    /// Load `url`
    fn goto(&self, url: &str) -> Result<()>;

    /// Click the first element matching `selector`
    fn click(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Replace the value of the element matching `selector`
    fn fill(&self, selector: &str, value: &str, timeout: Duration) -> Result<()>;

    /// Focus the matching element and send `text` one key at a time
    fn type_text(&self, selector: &str, text: &str, timeout: Duration) -> Result<()>;

    /// Focus the matching element and press a named key such as `Enter`
    fn press(&self, selector: &str, key: &str, timeout: Duration) -> Result<()>;

    /// Serialized document markup
    fn content(&self) -> Result<String>;
}
