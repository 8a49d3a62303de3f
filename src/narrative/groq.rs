use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{Narrative, NarrativeProvider};
use crate::consts::NARRATIVE_MODEL;
use crate::error::TaleError;

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

/// OpenAI-style chat completion request.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

/// Narrative Requester backed by Groq's OpenAI-compatible completion API.
#[derive(Clone)]
pub struct GroqNarrativeClient {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl GroqNarrativeClient {
    pub fn new(http_client: reqwest::Client, base_url: Url, api_key: String) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
        }
    }

    fn build_prompt(input_type: &str, user_input: &str) -> String {
        format!(
            "Create a vivid narrative with three parts based on the following {input_type}: {user_input}. \n\
             Return the three parts as JSON, with keys part1, part2, part3. The narrative should be around 3 lines.\n\
             Use below format:\n\
             {{\"part1\": {{\"title\": \"title1\", \"narrative\": \"narrative part1\"}},\n\
             \"part2\": {{\"title\": \"title2\", \"narrative\": \"narrative part2\"}},\n\
             \"part3\": {{\"title\": \"title3\", \"narrative\": \"narrative part3\"}}}}"
        )
    }
}

#[async_trait]
impl NarrativeProvider for GroqNarrativeClient {
    async fn request_narrative(
        &self,
        input_type: &str,
        user_input: &str,
    ) -> Result<Narrative, TaleError> {
        let prompt = Self::build_prompt(input_type, user_input);
        let request = ChatCompletionRequest {
            model: NARRATIVE_MODEL,
            messages: vec![Message {
                role: "user",
                content: &prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let url = format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        );
        debug!("Requesting narrative from {url}");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(Duration::from_secs(120))
            .send()
            .await
            .map_err(|e| TaleError::Network(format!("completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TaleError::Network(format!(
                "completion API error ({status}): {body}"
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| TaleError::MalformedNarrative(format!("unreadable completion: {e}")))?;

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| TaleError::MalformedNarrative("completion had no choices".into()))?;

        let narrative = Narrative::from_model_output(content)?;
        info!("Received three-part narrative from completion API");
        Ok(narrative)
    }
}
