use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::{GenerationJob, GenerationRequest, JobState, VideoGenerator};
use crate::consts::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
use crate::error::TaleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Fixed sleep between status fetches. No backoff, no jitter.
    pub interval: Duration,
    /// `None` reproduces the original unbounded wait.
    pub timeout: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_POLL_TIMEOUT),
        }
    }
}

/// Lifecycle of one submit-and-wait cycle.
#[derive(Debug)]
enum PollState {
    Submitted(String),
    Polling(String),
    Completed(GenerationJob),
    Failed(String),
    TimedOut,
}

/// The orchestration core: submits a generation job and drives it to a
/// terminal state by fetching its status on a fixed interval.
pub struct Poller<'a, G: VideoGenerator + ?Sized> {
    generator: &'a G,
    config: PollerConfig,
}

impl<'a, G: VideoGenerator + ?Sized> Poller<'a, G> {
    pub fn new(generator: &'a G, config: PollerConfig) -> Self {
        Self { generator, config }
    }

    /// Submits `request` and polls until the job completes, fails, or the
    /// deadline passes. On success the returned job is completed and
    /// carries its video asset URL.
    pub async fn submit_and_await(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationJob, TaleError> {
        let submitted = self.generator.submit(request).await?;
        info!(job_id = %submitted.id, "Generation job submitted");

        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        let mut state = PollState::Submitted(submitted.id);

        loop {
            state = match state {
                PollState::Submitted(job_id) => PollState::Polling(job_id),
                PollState::Polling(job_id) => {
                    let job = self.generator.fetch(&job_id).await?;
                    self.advance(job, deadline).await
                }
                PollState::Completed(job) => {
                    if job.video.is_none() {
                        return Err(TaleError::GenerationFailed(
                            "completed generation carried no video asset".into(),
                        ));
                    }
                    info!(job_id = %job.id, "Generation completed");
                    return Ok(job);
                }
                PollState::Failed(reason) => return Err(TaleError::GenerationFailed(reason)),
                PollState::TimedOut => {
                    let secs = self.config.timeout.unwrap_or_default().as_secs();
                    return Err(TaleError::GenerationTimeout(secs));
                }
            };
        }
    }

    /// One transition out of `Polling`: either terminal, or sleep the fixed
    /// interval and poll again.
    async fn advance(&self, job: GenerationJob, deadline: Option<Instant>) -> PollState {
        match job.state {
            JobState::Completed => PollState::Completed(job),
            JobState::Failed => PollState::Failed(
                job.failure_reason
                    .unwrap_or_else(|| "unspecified failure".into()),
            ),
            JobState::Pending => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return PollState::TimedOut;
                }
                debug!(job_id = %job.id, "Generation still pending");
                sleep(self.config.interval).await;
                PollState::Polling(job.id)
            }
        }
    }
}
