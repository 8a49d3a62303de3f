use once_cell::sync::Lazy;
use reqwest::Url;
use std::time::Duration;

/// Base URL of the OpenAI-compatible completion API (Groq). Overridable so
/// tests and self-hosted gateways can point elsewhere.
pub static GROQ_API_URL: Lazy<Url> = Lazy::new(|| {
    let url = std::env::var("GROQ_API_URL")
        .unwrap_or_else(|_| "https://api.groq.com/openai/v1/".into());
    Url::parse(&url).expect("GROQ_API_URL to be a valid URL")
});

/// Base URL of the Luma Dream Machine generation API.
pub static LUMA_API_URL: Lazy<Url> = Lazy::new(|| {
    let url = std::env::var("LUMA_API_URL")
        .unwrap_or_else(|_| "https://api.lumalabs.ai/dream-machine/v1/".into());
    Url::parse(&url).expect("LUMA_API_URL to be a valid URL")
});

pub const NARRATIVE_MODEL: &str = "llama-3.1-70b-versatile";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound on waiting for a single generation job. The reference
/// behavior waits forever; a bound keeps a dead remote job from pinning a
/// run indefinitely.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// The one artifact surfaced to the user, overwritten on each run.
pub const COMBINED_VIDEO_FILENAME: &str = "combined_video.mp4";
