//! Configuration management
//!
//! Settings are resolved in this order (later wins):
//! 1. Built-in defaults
//! 2. `pilot.toml` in the working directory, if present
//! 3. Environment variables
//!
//! Inside the TOML file `${VAR_NAME}` is replaced by the value of the
//! environment variable, so secrets do not have to live in the file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Error;

/// Default config file name looked up by [`Config::load`]
pub const CONFIG_FILE: &str = "pilot.toml";

/// Instructions used when the configured instructions file is missing
pub const DEFAULT_INSTRUCTIONS: &str = "\
You operate a single, visible browser tab on behalf of the user. \
The user has already logged in. Use browser_goto to open pages, browser_click and browser_type \
to interact, and browser_snapshot_dom to read the current page whenever you are unsure of its \
state or a selector fails. Prefer stable CSS selectors, or text=<visible text> for buttons and \
links. Report what you did and what you found in plain language.";

/// Agent service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key
    #[serde(default)]
    pub api_key: String,

    /// Model used by the assistant
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the Assistants API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Display name of the assistant created at startup
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// File holding the assistant instructions
    #[serde(default = "default_instructions_path")]
    pub instructions_path: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            assistant_name: default_assistant_name(),
            instructions_path: default_instructions_path(),
        }
    }
}

/// Browser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run without a visible window
    #[serde(default)]
    pub headless: bool,

    /// Page opened for the manual login step
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Default click timeout advertised to the agent, in milliseconds
    #[serde(default = "default_click_timeout_ms")]
    pub click_timeout_ms: u64,

    /// How long the browser connection may stay idle, in seconds
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Fixed window size; `None` lets the page follow the window
    #[serde(default)]
    pub window_size: Option<(u32, u32)>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            login_url: default_login_url(),
            click_timeout_ms: default_click_timeout_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
            window_size: None,
        }
    }
}

/// Run polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Wait between two status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on the time one turn may spend polling, in seconds
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

impl RunSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

fn default_model() -> String {
    "gpt-4.1-nano".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_assistant_name() -> String {
    "Pipeline Pilot".to_string()
}

fn default_instructions_path() -> String {
    "prompt.txt".to_string()
}

fn default_login_url() -> String {
    "https://app.hubspot.com/login".to_string()
}

fn default_click_timeout_ms() -> u64 {
    8000
}

fn default_idle_timeout_secs() -> u64 {
    24 * 60 * 60
}

fn default_poll_interval_ms() -> u64 {
    400
}

fn default_max_wait_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub browser: BrowserSettings,

    #[serde(default)]
    pub run: RunSettings,

    /// Default tracing filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Defaults with the given API key
    pub fn for_api_key(api_key: impl Into<String>) -> Self {
        Self {
            llm: LlmConfig {
                api_key: api_key.into(),
                ..Default::default()
            },
            browser: BrowserSettings::default(),
            run: RunSettings::default(),
            log_level: default_log_level(),
        }
    }

    /// Replace `${VAR_NAME}` with the variable's value (empty if unset)
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Parse TOML text without consulting the environment
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    ///
    /// `${VAR_NAME}` references are expanded first, then environment
    /// overrides are applied on top of the file's values.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut cfg = Self::from_toml_str(&Self::expand_env_vars(&content))?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `./pilot.toml` if it exists, otherwise from the environment
    pub fn load() -> crate::Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::for_api_key("");
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        fn non_empty(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        }

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(model) = non_empty("PILOT_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(path) = non_empty("PILOT_INSTRUCTIONS") {
            self.llm.instructions_path = path;
        }

        if let Some(url) = non_empty("PILOT_LOGIN_URL") {
            self.browser.login_url = url;
        }
        if let Some(headless) = non_empty("PILOT_HEADLESS") {
            self.browser.headless = headless.to_lowercase() == "true" || headless == "1";
        }
        if let Some(ms) = non_empty("PILOT_CLICK_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.browser.click_timeout_ms = ms;
        }

        if let Some(ms) = non_empty("PILOT_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.run.poll_interval_ms = ms;
        }
        if let Some(secs) = non_empty("PILOT_MAX_WAIT_SECS").and_then(|v| v.parse().ok()) {
            self.run.max_wait_secs = secs;
        }

        if let Some(level) = non_empty("PILOT_LOG") {
            self.log_level = level;
        }
    }

    /// Reject settings the process cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.llm.api_key.is_empty() {
            return Err(Error::Config("OPENAI_API_KEY not set".to_string()));
        }
        if self.run.poll_interval_ms == 0 {
            return Err(Error::Config("run.poll_interval_ms must be positive".to_string()));
        }
        if self.run.max_wait_secs == 0 {
            return Err(Error::Config("run.max_wait_secs must be positive".to_string()));
        }
        if self.browser.click_timeout_ms == 0 {
            return Err(Error::Config("browser.click_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Assistant instructions, falling back to [`DEFAULT_INSTRUCTIONS`]
    pub fn load_instructions(&self) -> String {
        match std::fs::read_to_string(&self.llm.instructions_path) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Instructions file {} is empty, using defaults", self.llm.instructions_path);
                DEFAULT_INSTRUCTIONS.to_string()
            }
            Err(e) => {
                warn!(
                    "Could not read instructions from {} ({}), using defaults",
                    self.llm.instructions_path, e
                );
                DEFAULT_INSTRUCTIONS.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::for_api_key("sk-test");
        assert_eq!(config.llm.model, "gpt-4.1-nano");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert!(!config.browser.headless);
        assert_eq!(config.browser.click_timeout_ms, 8000);
        assert_eq!(config.run.poll_interval(), Duration::from_millis(400));
        assert_eq!(config.run.max_wait(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_expand_env_vars() {
        assert_eq!(Config::expand_env_vars("plain text"), "plain text");
        assert_eq!(
            Config::expand_env_vars("key=${PILOT_SURELY_UNSET_VARIABLE_42}!"),
            "key=!"
        );
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(Config::expand_env_vars("${PATH}"), path);
        }
    }

    #[test]
    fn test_from_toml_str_partial() {
        let config = Config::from_toml_str(
            r#"
            log_level = "debug"

            [llm]
            api_key = "sk-file"
            model = "gpt-4.1-mini"

            [browser]
            login_url = "https://crm.example.com/login"
            window_size = [1280, 800]

            [run]
            poll_interval_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.api_key, "sk-file");
        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert_eq!(config.llm.assistant_name, "Pipeline Pilot");
        assert_eq!(config.browser.login_url, "https://crm.example.com/login");
        assert_eq!(config.browser.window_size, Some((1280, 800)));
        assert_eq!(config.run.poll_interval_ms, 250);
        assert_eq!(config.run.max_wait_secs, 300);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let err = Config::from_toml_str("[llm\napi_key = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let mut config = Config::for_api_key("sk-test");
        config.run.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::for_api_key("sk-test");
        config.run.max_wait_secs = 0;
        assert!(config.validate().is_err());

        assert!(Config::for_api_key("").validate().is_err());
    }

    #[test]
    fn test_from_toml_file_expands_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [llm]
            api_key = "sk-file"
            assistant_name = "Pilot ${{PATH}}${{PILOT_SURELY_UNSET_VARIABLE_42}}"
            "#
        )
        .unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(config.llm.assistant_name, format!("Pilot {}", path));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [llm]
            api_key = "sk-file"

            [run]
            poll_interval_ms = 0
            "#
        )
        .unwrap();

        let err = Config::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("poll_interval_ms")));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = Config::from_toml_file("/nonexistent/pilot.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_instructions_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Only touch the Deals page.").unwrap();

        let mut config = Config::for_api_key("sk-test");
        config.llm.instructions_path = file.path().to_string_lossy().to_string();
        assert_eq!(config.load_instructions().trim(), "Only touch the Deals page.");
    }

    #[test]
    fn test_load_instructions_fallback() {
        let mut config = Config::for_api_key("sk-test");
        config.llm.instructions_path = "/nonexistent/prompt.txt".to_string();
        assert_eq!(config.load_instructions(), DEFAULT_INSTRUCTIONS);
    }
}
