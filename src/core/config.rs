use crate::dom::Locator;
use crate::errors::{CheckError, Result};
use crate::types::BrowserConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_START_URL: &str = "https://www.mts.by/";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub start_url: String,
    pub browser: BrowserConfig,
    pub waits: WaitConfig,
    /// Element name to replacement query, applied on top of the page's table.
    pub locator_overrides: HashMap<String, Locator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Bound for every required element wait
    pub page_timeout_ms: u64,
    /// Bound for optional elements whose absence is acceptable
    pub overlay_timeout_ms: u64,
    /// Bound for URL changes after a link activation
    pub navigation_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            browser: BrowserConfig::default(),
            waits: WaitConfig::default(),
            locator_overrides: HashMap::new(),
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            page_timeout_ms: 15_000,
            overlay_timeout_ms: 5_000,
            navigation_timeout_ms: 10_000,
            poll_interval_ms: 100,
        }
    }
}

impl WaitConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn overlay_timeout(&self) -> Duration {
        Duration::from_millis(self.overlay_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(CheckError::ConfigurationError(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("page_timeout_ms", self.page_timeout_ms),
            ("overlay_timeout_ms", self.overlay_timeout_ms),
            ("navigation_timeout_ms", self.navigation_timeout_ms),
        ] {
            if value < self.poll_interval_ms {
                return Err(CheckError::ConfigurationError(format!(
                    "{} ({}) is shorter than poll_interval_ms ({})",
                    name, value, self.poll_interval_ms
                )));
            }
        }
        Ok(())
    }
}

impl SuiteConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: SuiteConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.start_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CheckError::ConfigurationError(format!(
                "start_url must be http(s), got '{}'",
                url.scheme()
            )));
        }
        self.waits.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_page_wait_budget() {
        let config = SuiteConfig::default();
        assert_eq!(config.waits.page_timeout(), Duration::from_secs(15));
        assert!(config.waits.overlay_timeout() < config.waits.page_timeout());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SuiteConfig::from_json_str(
            r#"{
                "waits": {"overlay_timeout_ms": 1500},
                "locator_overrides": {"cookie_reject": {"strategy": "css", "value": "button.reject"}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.start_url, DEFAULT_START_URL);
        assert_eq!(config.waits.overlay_timeout_ms, 1500);
        assert_eq!(config.waits.page_timeout_ms, 15_000);
        assert_eq!(
            config.locator_overrides.get("cookie_reject"),
            Some(&Locator::css("button.reject"))
        );
    }

    #[test]
    fn rejects_bad_start_url() {
        assert!(matches!(
            SuiteConfig::from_json_str(r#"{"start_url": "not a url"}"#),
            Err(CheckError::InvalidUrl(_))
        ));
        assert!(matches!(
            SuiteConfig::from_json_str(r#"{"start_url": "ftp://example.com/"}"#),
            Err(CheckError::ConfigurationError(_))
        ));
    }

    #[test]
    fn rejects_timeout_below_poll_interval() {
        let waits = WaitConfig {
            overlay_timeout_ms: 10,
            poll_interval_ms: 100,
            ..Default::default()
        };
        assert!(waits.validate().is_err());
    }
}
