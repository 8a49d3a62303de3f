use std::sync::Arc;

use crate::assets::{AssetStore, HttpAssetStore};
use crate::config::AppConfig;
use crate::consts::{GROQ_API_URL, LUMA_API_URL};
use crate::joiner::{ClipJoiner, FfmpegJoiner};
use crate::narrative::{GroqNarrativeClient, NarrativeProvider};
use crate::videogen::{LumaClient, PollerConfig, VideoGenerator};

/// Shared application state. The external services sit behind narrow trait
/// objects so tests can substitute fakes for the whole pipeline.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub narrative: Arc<dyn NarrativeProvider>,
    pub video_generator: Arc<dyn VideoGenerator>,
    pub assets: Arc<dyn AssetStore>,
    pub joiner: Arc<dyn ClipJoiner>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let http_client = reqwest::Client::new();
        Self {
            narrative: Arc::new(GroqNarrativeClient::new(
                http_client.clone(),
                GROQ_API_URL.clone(),
                config.groq_api_key.clone(),
            )),
            video_generator: Arc::new(LumaClient::new(
                http_client.clone(),
                LUMA_API_URL.clone(),
                config.lumaai_api_key.clone(),
            )),
            assets: Arc::new(HttpAssetStore::new(http_client)),
            joiner: Arc::new(FfmpegJoiner),
            config,
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: self.config.poll_interval(),
            timeout: self.config.poll_timeout(),
        }
    }
}
