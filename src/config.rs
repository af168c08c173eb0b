use crate::notifier::NotifierSettings;
use crate::search::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub max_notifications: Option<usize>,
}

fn default_api_base_url() -> String { "http://localhost:5000/api".into() }
fn default_poll_interval() -> u64 { 10 }
fn default_request_timeout() -> u64 { 30 }
fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: None,
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            page_size: default_page_size(),
            max_notifications: None,
        }
    }
}

impl AppConfig {
    /// Load from `LISTING_WATCH__*` environment variables,
    /// e.g. `LISTING_WATCH__API_BASE_URL`.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("LISTING_WATCH").separator("__"))
            .build()?;
        Ok(Self::from_config(config))
    }

    /// A single value that fails to parse discards the whole source:
    /// every field, `api_token` included, falls back to its default.
    /// The logged error names the offending key.
    pub fn from_config(config: config::Config) -> Self {
        config.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid configuration, every setting reset to defaults");
            Self::default()
        })
    }

    pub fn notifier_settings(&self) -> NotifierSettings {
        NotifierSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            max_notifications: self.max_notifications,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard() {
        let config = AppConfig::default();
        assert_eq!(config.page_size, 9);
        assert_eq!(config.notifier_settings().poll_interval, Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.api_token.is_none());
    }

    #[test]
    fn zero_interval_is_raised_to_one_second() {
        let config = AppConfig {
            poll_interval_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.notifier_settings().poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn deserializes_partial_source() {
        let config: AppConfig = config::Config::builder()
            .set_override("api_base_url", "https://homes.example/api")
            .unwrap()
            .set_override("poll_interval_secs", 30)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.api_base_url, "https://homes.example/api");
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.max_notifications, None);
    }

    #[test]
    fn one_bad_value_resets_everything() {
        let source = config::Config::builder()
            .set_override("api_token", "secret")
            .unwrap()
            .set_override("poll_interval_secs", "soon")
            .unwrap()
            .build()
            .unwrap();

        let config = AppConfig::from_config(source);
        assert!(config.api_token.is_none());
        assert_eq!(config.poll_interval_secs, 10);
    }

    #[test]
    fn optional_cap_is_read_when_present() {
        let source = config::Config::builder()
            .set_override("max_notifications", 50)
            .unwrap()
            .build()
            .unwrap();

        let config = AppConfig::from_config(source);
        assert_eq!(config.notifier_settings().max_notifications, Some(50));
    }
}
