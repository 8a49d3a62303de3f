use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{GenerationJob, GenerationRequest, JobState, VideoGenerator};
use crate::error::TaleError;

#[derive(Debug, Serialize)]
struct CreateGenerationBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyframes: Option<Keyframes<'a>>,
}

#[derive(Debug, Serialize)]
struct Keyframes<'a> {
    frame0: Frame<'a>,
}

#[derive(Debug, Serialize)]
struct Frame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResource {
    id: String,
    state: String,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    assets: Option<Assets>,
    #[serde(default)]
    failure_reason: Option<String>,
}

/// One page of the listing endpoint.
#[derive(Debug, Deserialize)]
struct GenerationPage {
    #[serde(default)]
    generations: Vec<GenerationResource>,
}

#[derive(Debug, Deserialize)]
struct Assets {
    #[serde(default)]
    video: Option<String>,
}

impl From<GenerationResource> for GenerationJob {
    fn from(resource: GenerationResource) -> Self {
        let state = match resource.state.as_str() {
            "completed" => JobState::Completed,
            "failed" => JobState::Failed,
            _ => JobState::Pending,
        };
        GenerationJob {
            id: resource.id,
            state,
            prompt: resource.prompt,
            video: resource.assets.and_then(|a| a.video),
            failure_reason: resource.failure_reason,
        }
    }
}

/// Video-generation client for the Luma Dream Machine API.
#[derive(Clone)]
pub struct LumaClient {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl LumaClient {
    pub fn new(http_client: reqwest::Client, base_url: Url, api_key: String) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
        }
    }

    fn generations_url(&self) -> String {
        format!(
            "{}/generations",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    fn wire_body<'a>(request: &'a GenerationRequest) -> CreateGenerationBody<'a> {
        CreateGenerationBody {
            prompt: &request.prompt,
            aspect_ratio: request.aspect_ratio,
            keyframes: request.extend_job_id.as_deref().map(|id| Keyframes {
                frame0: Frame {
                    kind: "generation",
                    id,
                },
            }),
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TaleError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TaleError::Network(format!(
                "generation API error ({status}): {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| TaleError::Network(format!("unreadable generation resource: {e}")))
    }

    async fn decode(response: reqwest::Response) -> Result<GenerationJob, TaleError> {
        let resource: GenerationResource = Self::read_json(response).await?;
        Ok(resource.into())
    }
}

#[async_trait]
impl VideoGenerator for LumaClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<GenerationJob, TaleError> {
        let body = Self::wire_body(request);
        debug!(extends = ?request.extend_job_id, "Submitting generation");

        let response = self
            .http_client
            .post(self.generations_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| TaleError::Network(format!("generation submit failed: {e}")))?;

        let job = Self::decode(response).await?;
        info!(job_id = %job.id, "Generation submitted");
        Ok(job)
    }

    async fn fetch(&self, id: &str) -> Result<GenerationJob, TaleError> {
        let url = format!("{}/{id}", self.generations_url());
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| TaleError::Network(format!("generation fetch failed: {e}")))?;

        Self::decode(response).await
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<GenerationJob>, TaleError> {
        let url = format!("{}?limit={limit}&offset={offset}", self.generations_url());
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| TaleError::Network(format!("generation list failed: {e}")))?;

        let page: GenerationPage = Self::read_json(response).await?;
        Ok(page.generations.into_iter().map(Into::into).collect())
    }
}
