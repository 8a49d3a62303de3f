pub mod luma;
pub mod poller;

pub use luma::LumaClient;
pub use poller::{Poller, PollerConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::TaleError;

/// How the three narrative parts map onto generation jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Three unrelated fresh jobs, joined into one file afterwards.
    #[default]
    Independent,
    /// Part 1 fresh, parts 2-3 each extending the previous job's output,
    /// yielding one continuous clip that needs no joining.
    Chained,
}

/// Lifecycle of a remote generation job. Remote states we do not recognize
/// (`queued`, `dreaming`, ...) count as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// A remote video-rendering task, refreshed by re-fetching from the
/// service. Terminal once completed or failed. The prompt comes back on
/// listings so past generations can be labeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub id: String,
    pub state: JobState,
    pub prompt: Option<String>,
    pub video: Option<String>,
    pub failure_reason: Option<String>,
}

/// What gets submitted to the generation service. A fresh request carries
/// the fixed aspect ratio; an extension instead references the prior job's
/// id as its starting keyframe and carries no aspect ratio, matching the
/// remote API's wire shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: Option<&'static str>,
    pub extend_job_id: Option<String>,
}

impl GenerationRequest {
    pub fn fresh(prompt: String) -> Self {
        Self {
            prompt,
            aspect_ratio: Some("16:9"),
            extend_job_id: None,
        }
    }

    pub fn extension(prompt: String, prior_job_id: &str) -> Self {
        Self {
            prompt,
            aspect_ratio: None,
            extend_job_id: Some(prior_job_id.to_string()),
        }
    }
}

#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Submits a creation request; the returned job is typically pending.
    async fn submit(&self, request: &GenerationRequest) -> Result<GenerationJob, TaleError>;

    /// Re-fetches a job's current state by id.
    async fn fetch(&self, id: &str) -> Result<GenerationJob, TaleError>;

    /// One page of past jobs, newest first, as the service orders them.
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<GenerationJob>, TaleError>;
}
