pub mod groq;

pub use groq::GroqNarrativeClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::TaleError;

/// The fixed input categories the UI offers. The `Display` form is the
/// lowercased phrase embedded into the narrative prompt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum_macros::Display,
)]
pub enum InputKind {
    #[serde(rename = "Product Description")]
    #[strum(serialize = "product description")]
    ProductDescription,
    #[serde(rename = "Tutorial")]
    #[strum(serialize = "tutorial")]
    Tutorial,
    #[serde(rename = "Mood")]
    #[strum(serialize = "mood")]
    Mood,
    #[serde(rename = "Interactive Storytelling Generator")]
    #[strum(serialize = "interactive storytelling generator")]
    InteractiveStorytellingGenerator,
    #[serde(rename = "Historical Event")]
    #[strum(serialize = "historical event")]
    HistoricalEvent,
    #[serde(rename = "Dream")]
    #[strum(serialize = "dream")]
    Dream,
}

/// One (title, narrative-text) segment of the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NarrativePart {
    pub title: String,
    pub narrative: String,
}

/// A three-part narrative as returned by the completion API. Exactly three
/// parts, both fields present in each; anything else fails parsing.
/// Immutable once created, scoped to a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Narrative {
    pub part1: NarrativePart,
    pub part2: NarrativePart,
    pub part3: NarrativePart,
}

impl Narrative {
    /// Parses raw model output. Non-JSON text, missing keys, or extra keys
    /// are a hard stop, never silently defaulted.
    pub fn from_model_output(raw: &str) -> Result<Self, TaleError> {
        serde_json::from_str(raw)
            .map_err(|e| TaleError::MalformedNarrative(format!("{e} in model output: {raw}")))
    }

    pub fn parts(&self) -> [&NarrativePart; 3] {
        [&self.part1, &self.part2, &self.part3]
    }
}

#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// Produces a three-part narrative for the given category and free-text
    /// description, or `MalformedNarrative` if the model output does not
    /// match the contract.
    async fn request_narrative(
        &self,
        input_type: &str,
        user_input: &str,
    ) -> Result<Narrative, TaleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> String {
        serde_json::json!({
            "part1": {"title": "Ascent", "narrative": "A figure rises above the peaks."},
            "part2": {"title": "Drift", "narrative": "Clouds part around outstretched arms."},
            "part3": {"title": "Descent", "narrative": "The valley floor rushes up to meet them."}
        })
        .to_string()
    }

    #[test]
    fn parses_three_parts_in_order() {
        let narrative = Narrative::from_model_output(&valid_json()).unwrap();
        let titles: Vec<&str> = narrative
            .parts()
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, ["Ascent", "Drift", "Descent"]);
    }

    #[test]
    fn missing_part_is_malformed() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value.as_object_mut().unwrap().remove("part2");
        let err = Narrative::from_model_output(&value.to_string()).unwrap_err();
        assert!(matches!(err, TaleError::MalformedNarrative(_)));
    }

    #[test]
    fn missing_field_is_malformed() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value["part3"].as_object_mut().unwrap().remove("narrative");
        let err = Narrative::from_model_output(&value.to_string()).unwrap_err();
        assert!(matches!(err, TaleError::MalformedNarrative(_)));
    }

    #[test]
    fn extra_field_inside_a_part_is_malformed() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value["part1"]["mood"] = "wistful".into();
        let err = Narrative::from_model_output(&value.to_string()).unwrap_err();
        assert!(matches!(err, TaleError::MalformedNarrative(_)));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = Narrative::from_model_output("Once upon a time...").unwrap_err();
        assert!(matches!(err, TaleError::MalformedNarrative(_)));
    }

    #[test]
    fn input_kind_prompt_phrase_is_lowercase() {
        assert_eq!(InputKind::Dream.to_string(), "dream");
        assert_eq!(
            InputKind::InteractiveStorytellingGenerator.to_string(),
            "interactive storytelling generator"
        );
    }

    #[test]
    fn input_kind_accepts_ui_labels() {
        let kind: InputKind = serde_json::from_str("\"Historical Event\"").unwrap();
        assert_eq!(kind, InputKind::HistoricalEvent);
    }
}
