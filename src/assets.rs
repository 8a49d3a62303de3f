use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::TaleError;

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Fetches `url` and writes it to `dest`. On any failure the
    /// destination is not left behind partially written.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), TaleError>;
}

/// Streams remote video assets to local storage chunk by chunk instead of
/// buffering them in memory.
#[derive(Clone)]
pub struct HttpAssetStore {
    http_client: reqwest::Client,
}

impl HttpAssetStore {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    async fn stream_to_file(
        response: reqwest::Response,
        dest: &Path,
    ) -> Result<(), TaleError> {
        let mut file = fs::File::create(dest)
            .await
            .map_err(|e| TaleError::Download(format!("cannot create {}: {e}", dest.display())))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes =
                chunk.map_err(|e| TaleError::Download(format!("stream interrupted: {e}")))?;
            file.write_all(&bytes)
                .await
                .map_err(|e| TaleError::Download(format!("write failed: {e}")))?;
        }
        file.flush()
            .await
            .map_err(|e| TaleError::Download(format!("flush failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), TaleError> {
        debug!("Downloading asset from {url}");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| TaleError::Download(format!("failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(TaleError::Download(format!(
                "HTTP {} fetching {url}",
                response.status()
            )));
        }

        if let Err(e) = Self::stream_to_file(response, dest).await {
            // Drop the partial file so a failed run cannot be mistaken for
            // a finished one.
            if fs::remove_file(dest).await.is_err() {
                warn!("Could not remove partial download {}", dest.display());
            }
            return Err(e);
        }

        info!("Downloaded asset to {}", dest.display());
        Ok(())
    }
}
