use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, sourced from the process environment. The two API
/// keys are required; everything else has a default. A missing key fails
/// `load()` and aborts startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Secret for the completion API (`GROQ_API_KEY`).
    pub groq_api_key: String,
    /// Secret for the video-generation API (`LUMAAI_API_KEY`).
    pub lumaai_api_key: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Where per-run working directories and the combined output live.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// 0 disables the bound and reproduces the original unbounded wait.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_poll_interval_secs() -> u64 {
    crate::consts::DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_poll_timeout_secs() -> u64 {
    crate::consts::DEFAULT_POLL_TIMEOUT.as_secs()
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .add_source(Environment::default().try_parsing(true))
            .build()?;
        conf.try_deserialize()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        (self.poll_timeout_secs > 0).then(|| Duration::from_secs(self.poll_timeout_secs))
    }
}
