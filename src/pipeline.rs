use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::consts::COMBINED_VIDEO_FILENAME;
use crate::error::TaleError;
use crate::narrative::{InputKind, Narrative, NarrativePart};
use crate::videogen::{GenerationMode, GenerationRequest, Poller};

/// One user-triggered run, as collected by the UI form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub input_type: InputKind,
    pub description: String,
    #[serde(default)]
    pub mode: GenerationMode,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub narrative: Narrative,
    pub video_file: PathBuf,
}

/// Per-part video prompt: the part's narrative text, an optional camera
/// motion cue, and a literal instruction to render the title on screen.
fn video_prompt(part: &NarrativePart, motion: Option<&str>) -> String {
    match motion {
        Some(motion) => format!(
            "{} {motion} On the top right it says \"{}\".",
            part.narrative, part.title
        ),
        None => format!(
            "{}On the top right it says \"{}\".",
            part.narrative, part.title
        ),
    }
}

/// Drives one full run: narrative, then per-part generation (independent or
/// chained), then download and join. Any failure aborts the run; partial
/// files under the run directory may be left behind on failure.
pub async fn run_pipeline(
    state: &AppState,
    request: &GenerateRequest,
) -> Result<PipelineOutput, TaleError> {
    info!(
        input_type = %request.input_type,
        mode = ?request.mode,
        "Starting TaleWeaver run"
    );

    let narrative = state
        .narrative
        .request_narrative(&request.input_type.to_string(), &request.description)
        .await?;

    tokio::fs::create_dir_all(&state.config.output_dir)
        .await
        .map_err(|e| TaleError::Internal(format!("cannot create output directory: {e}")))?;
    let output_path = state.config.output_dir.join(COMBINED_VIDEO_FILENAME);

    match request.mode {
        GenerationMode::Independent => run_independent(state, &narrative, &output_path).await?,
        GenerationMode::Chained => run_chained(state, &narrative, &output_path).await?,
    }

    info!("Run finished, combined video at {}", output_path.display());
    Ok(PipelineOutput {
        narrative,
        video_file: output_path,
    })
}

/// Independent mode: three fresh jobs, each downloaded, then joined.
/// Strictly sequential, matching the reference behavior.
async fn run_independent(
    state: &AppState,
    narrative: &Narrative,
    output_path: &Path,
) -> Result<(), TaleError> {
    let poller = Poller::new(state.video_generator.as_ref(), state.poller_config());

    let workdir = state
        .config
        .output_dir
        .join(format!("run-{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&workdir)
        .await
        .map_err(|e| TaleError::Internal(format!("cannot create run directory: {e}")))?;

    let mut clips = Vec::with_capacity(3);
    for (index, part) in narrative.parts().into_iter().enumerate() {
        info!(part = index + 1, title = %part.title, "Generating clip");
        let job = poller
            .submit_and_await(&GenerationRequest::fresh(video_prompt(part, None)))
            .await?;
        let video_url = job.video.ok_or_else(|| {
            TaleError::GenerationFailed("completed generation carried no video asset".into())
        })?;

        let clip_path = workdir.join(format!("video_part{}.mp4", index + 1));
        state.assets.download(&video_url, &clip_path).await?;
        clips.push(clip_path);
    }

    state.joiner.join(&clips, output_path).await?;

    // The joined file supersedes the per-part sources.
    for clip in &clips {
        if let Err(e) = tokio::fs::remove_file(clip).await {
            warn!("Could not remove {}: {e}", clip.display());
        }
    }
    if let Err(e) = tokio::fs::remove_dir(&workdir).await {
        warn!("Could not remove run directory {}: {e}", workdir.display());
    }
    Ok(())
}

/// Chained mode: part 1 fresh with a zoom-in cue, parts 2-3 extending the
/// previous job with a zoom-out cue. The final job's asset is already the
/// whole clip, so it is downloaded straight to the output path. A failed
/// extension aborts the run like any other failure.
async fn run_chained(
    state: &AppState,
    narrative: &Narrative,
    output_path: &Path,
) -> Result<(), TaleError> {
    let poller = Poller::new(state.video_generator.as_ref(), state.poller_config());
    let parts = narrative.parts();

    info!(title = %parts[0].title, "Generating opening clip");
    let mut job = poller
        .submit_and_await(&GenerationRequest::fresh(video_prompt(
            parts[0],
            Some("Zoom In"),
        )))
        .await?;

    for part in &parts[1..] {
        info!(title = %part.title, extends = %job.id, "Extending clip");
        job = poller
            .submit_and_await(&GenerationRequest::extension(
                video_prompt(part, Some("Zoom Out")),
                &job.id,
            ))
            .await?;
    }

    let video_url = job.video.ok_or_else(|| {
        TaleError::GenerationFailed("completed generation carried no video asset".into())
    })?;
    state.assets.download(&video_url, output_path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetStore;
    use crate::config::AppConfig;
    use crate::error::TaleError;
    use crate::joiner::ClipJoiner;
    use crate::narrative::NarrativeProvider;
    use crate::videogen::{GenerationJob, JobState, VideoGenerator};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn narrative() -> Narrative {
        Narrative {
            part1: NarrativePart {
                title: "Takeoff".into(),
                narrative: "Wings spread over a sleeping valley.".into(),
            },
            part2: NarrativePart {
                title: "Soar".into(),
                narrative: "Peaks drift past below.".into(),
            },
            part3: NarrativePart {
                title: "Landing".into(),
                narrative: "A slow glide into dawn light.".into(),
            },
        }
    }

    struct FakeNarrativeProvider {
        requests: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl NarrativeProvider for FakeNarrativeProvider {
        async fn request_narrative(
            &self,
            input_type: &str,
            user_input: &str,
        ) -> Result<Narrative, TaleError> {
            self.requests
                .lock()
                .unwrap()
                .push((input_type.to_string(), user_input.to_string()));
            Ok(narrative())
        }
    }

    /// Completes every job on its first status fetch; optionally fails the
    /// nth submission (1-based).
    struct FakeVideoGenerator {
        submissions: Mutex<Vec<GenerationRequest>>,
        counter: AtomicUsize,
        fail_on_submission: Option<usize>,
    }

    impl FakeVideoGenerator {
        fn new() -> Self {
            Self {
                submissions: Mutex::new(Vec::new()),
                counter: AtomicUsize::new(0),
                fail_on_submission: None,
            }
        }

        fn failing_on(n: usize) -> Self {
            Self {
                fail_on_submission: Some(n),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl VideoGenerator for FakeVideoGenerator {
        async fn submit(&self, request: &GenerationRequest) -> Result<GenerationJob, TaleError> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            self.submissions.lock().unwrap().push(request.clone());
            Ok(GenerationJob {
                id: format!("job-{n}"),
                state: JobState::Pending,
                prompt: None,
                video: None,
                failure_reason: None,
            })
        }

        async fn fetch(&self, id: &str) -> Result<GenerationJob, TaleError> {
            let n: usize = id.trim_start_matches("job-").parse().unwrap();
            if self.fail_on_submission == Some(n) {
                return Ok(GenerationJob {
                    id: id.to_string(),
                    state: JobState::Failed,
                    prompt: None,
                    video: None,
                    failure_reason: Some("render node died".into()),
                });
            }
            Ok(GenerationJob {
                id: id.to_string(),
                state: JobState::Completed,
                prompt: None,
                video: Some(format!("https://cdn.test/{id}.mp4")),
                failure_reason: None,
            })
        }

        async fn list(&self, _limit: u32, _offset: u32) -> Result<Vec<GenerationJob>, TaleError> {
            Ok(Vec::new())
        }
    }

    /// Writes the URL itself as file contents, so tests can trace which
    /// asset landed where.
    struct FakeAssetStore {
        downloads: Mutex<Vec<(String, PathBuf)>>,
    }

    #[async_trait]
    impl AssetStore for FakeAssetStore {
        async fn download(&self, url: &str, dest: &Path) -> Result<(), TaleError> {
            self.downloads
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf()));
            tokio::fs::write(dest, url.as_bytes())
                .await
                .map_err(|e| TaleError::Download(e.to_string()))?;
            Ok(())
        }
    }

    /// Concatenates input bytes, preserving order.
    struct FakeJoiner {
        joins: Mutex<Vec<Vec<PathBuf>>>,
    }

    #[async_trait]
    impl ClipJoiner for FakeJoiner {
        async fn join(&self, clips: &[PathBuf], dest: &Path) -> Result<PathBuf, TaleError> {
            self.joins.lock().unwrap().push(clips.to_vec());
            let mut combined = Vec::new();
            for clip in clips {
                combined.extend(
                    tokio::fs::read(clip)
                        .await
                        .map_err(|e| TaleError::Encoding(e.to_string()))?,
                );
            }
            tokio::fs::write(dest, combined)
                .await
                .map_err(|e| TaleError::Encoding(e.to_string()))?;
            Ok(dest.to_path_buf())
        }
    }

    struct TestHarness {
        state: AppState,
        narrative_provider: Arc<FakeNarrativeProvider>,
        generator: Arc<FakeVideoGenerator>,
        assets: Arc<FakeAssetStore>,
        joiner: Arc<FakeJoiner>,
        _output_dir: tempfile::TempDir,
    }

    fn harness(generator: FakeVideoGenerator) -> TestHarness {
        let output_dir = tempfile::tempdir().unwrap();
        let narrative_provider = Arc::new(FakeNarrativeProvider {
            requests: Mutex::new(Vec::new()),
        });
        let generator = Arc::new(generator);
        let assets = Arc::new(FakeAssetStore {
            downloads: Mutex::new(Vec::new()),
        });
        let joiner = Arc::new(FakeJoiner {
            joins: Mutex::new(Vec::new()),
        });
        let state = AppState {
            config: AppConfig {
                groq_api_key: "gk".into(),
                lumaai_api_key: "lk".into(),
                bind_address: "127.0.0.1:0".into(),
                output_dir: output_dir.path().to_path_buf(),
                poll_interval_secs: 0,
                poll_timeout_secs: 60,
            },
            narrative: narrative_provider.clone(),
            video_generator: generator.clone(),
            assets: assets.clone(),
            joiner: joiner.clone(),
        };
        TestHarness {
            state,
            narrative_provider,
            generator,
            assets,
            joiner,
            _output_dir: output_dir,
        }
    }

    fn dream_request(mode: GenerationMode) -> GenerateRequest {
        GenerateRequest {
            input_type: InputKind::Dream,
            description: "flying over mountains".into(),
            mode,
        }
    }

    #[tokio::test]
    async fn independent_run_generates_downloads_and_joins_three_parts() {
        let h = harness(FakeVideoGenerator::new());

        let output = run_pipeline(&h.state, &dream_request(GenerationMode::Independent))
            .await
            .unwrap();

        let requests = h.narrative_provider.requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![("dream".to_string(), "flying over mountains".to_string())]
        );

        let submissions = h.generator.submissions.lock().unwrap().clone();
        assert_eq!(submissions.len(), 3);
        for submission in &submissions {
            assert_eq!(submission.aspect_ratio, Some("16:9"));
            assert_eq!(submission.extend_job_id, None);
        }
        assert_eq!(
            submissions[0].prompt,
            "Wings spread over a sleeping valley.On the top right it says \"Takeoff\"."
        );

        let downloads = h.assets.downloads.lock().unwrap().clone();
        assert_eq!(downloads.len(), 3);
        assert!(downloads[0].1.ends_with("video_part1.mp4"));
        assert!(downloads[2].1.ends_with("video_part3.mp4"));

        let joins = h.joiner.joins.lock().unwrap().clone();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].len(), 3);

        // Combined file exists and holds the parts in order.
        assert!(output.video_file.exists());
        assert!(output.video_file.ends_with(COMBINED_VIDEO_FILENAME));
        let combined = std::fs::read_to_string(&output.video_file).unwrap();
        assert_eq!(
            combined,
            "https://cdn.test/job-1.mp4https://cdn.test/job-2.mp4https://cdn.test/job-3.mp4"
        );

        // Per-part sources and the run directory are cleaned up; only the
        // combined output remains.
        let entries: Vec<_> = std::fs::read_dir(&h.state.config.output_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(COMBINED_VIDEO_FILENAME)]);
    }

    #[tokio::test]
    async fn chained_run_extends_prior_jobs_and_downloads_once() {
        let h = harness(FakeVideoGenerator::new());

        let output = run_pipeline(&h.state, &dream_request(GenerationMode::Chained))
            .await
            .unwrap();

        let submissions = h.generator.submissions.lock().unwrap().clone();
        assert_eq!(submissions.len(), 3);
        assert_eq!(submissions[0].extend_job_id, None);
        assert_eq!(submissions[0].aspect_ratio, Some("16:9"));
        assert_eq!(
            submissions[0].prompt,
            "Wings spread over a sleeping valley. Zoom In On the top right it says \"Takeoff\"."
        );
        assert_eq!(submissions[1].extend_job_id.as_deref(), Some("job-1"));
        assert_eq!(submissions[1].aspect_ratio, None);
        assert_eq!(
            submissions[1].prompt,
            "Peaks drift past below. Zoom Out On the top right it says \"Soar\"."
        );
        assert_eq!(submissions[2].extend_job_id.as_deref(), Some("job-2"));

        // One download, straight to the combined output; nothing joined.
        let downloads = h.assets.downloads.lock().unwrap().clone();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].0, "https://cdn.test/job-3.mp4");
        assert!(h.joiner.joins.lock().unwrap().is_empty());
        assert!(output.video_file.exists());
    }

    #[tokio::test]
    async fn failed_extension_aborts_the_chained_run() {
        let h = harness(FakeVideoGenerator::failing_on(2));

        let err = run_pipeline(&h.state, &dream_request(GenerationMode::Chained))
            .await
            .unwrap_err();

        assert_eq!(err, TaleError::GenerationFailed("render node died".into()));
        // Aborted before the third part and before any download.
        assert_eq!(h.generator.submissions.lock().unwrap().len(), 2);
        assert!(h.assets.downloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_generation_aborts_the_independent_run() {
        let h = harness(FakeVideoGenerator::failing_on(1));

        let err = run_pipeline(&h.state, &dream_request(GenerationMode::Independent))
            .await
            .unwrap_err();

        assert!(matches!(err, TaleError::GenerationFailed(_)));
        assert!(h.joiner.joins.lock().unwrap().is_empty());
    }

    #[test]
    fn prompts_follow_the_reference_wording() {
        let part = NarrativePart {
            title: "Soar".into(),
            narrative: "Peaks drift past below.".into(),
        };
        assert_eq!(
            video_prompt(&part, None),
            "Peaks drift past below.On the top right it says \"Soar\"."
        );
        assert_eq!(
            video_prompt(&part, Some("Zoom In")),
            "Peaks drift past below. Zoom In On the top right it says \"Soar\"."
        );
    }

    #[test]
    fn mode_defaults_to_independent() {
        let request: GenerateRequest = serde_json::from_value(serde_json::json!({
            "input_type": "Dream",
            "description": "flying over mountains"
        }))
        .unwrap();
        assert_eq!(request.mode, GenerationMode::Independent);
    }
}
