use crate::submission::{SubmissionConfig, draft::MAX_UPLOAD_BYTES};
use memefeed_common::util::PositiveDuration;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variables are read with this prefix, e.g.
/// `MEMEFEED_SHARE_BASE_URL`.
pub const ENV_PREFIX: &str = "MEMEFEED_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("MEMEFEED_REFRESH_INTERVAL_SECS must be greater than zero")]
    ZeroRefreshInterval,
    #[error("MEMEFEED_SHARE_BASE_URL is not a valid URL: {0}")]
    ShareBaseUrl(#[from] url::ParseError),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct AppConfig {
    /// How often "time ago" labels are recomputed.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_progress_step_delay_ms")]
    pub progress_step_delay_ms: u64,
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_max_upload_bytes() -> u64 {
    MAX_UPLOAD_BYTES
}

fn default_progress_step_delay_ms() -> u64 {
    100
}

fn default_share_base_url() -> String {
    "http://localhost:3000".to_owned()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }

    pub fn refresh_interval(&self) -> Result<PositiveDuration, ConfigError> {
        PositiveDuration::from_secs(self.refresh_interval_secs)
            .ok_or(ConfigError::ZeroRefreshInterval)
    }

    pub fn share_base_url(&self) -> Result<Url, ConfigError> {
        Ok(Url::parse(&self.share_base_url)?)
    }

    #[must_use]
    pub fn submission(&self) -> SubmissionConfig {
        SubmissionConfig {
            max_upload_bytes: self.max_upload_bytes,
            progress_step_delay: Duration::from_millis(self.progress_step_delay_ms),
        }
    }
}
