//! User-supplied references and workflow inputs.

use serde::{Deserialize, Serialize};

/// Musical references the blueprint is derived from.
///
/// Every field is optional on its own, but at least one must be non-blank
/// before the template stage will run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceInput {
    /// Comma-separated artist names
    #[serde(default)]
    pub artists: String,
    /// Comma-separated song titles
    #[serde(default)]
    pub songs: String,
    /// Free-text stylistic guidance
    #[serde(default)]
    pub guidance: String,
    /// Pasted reference lyrics, treated as authoritative source material
    #[serde(default, rename = "lyrics", alias = "reference_lyrics")]
    pub reference_lyrics: String,
}

impl ReferenceInput {
    pub fn new(
        artists: impl Into<String>,
        songs: impl Into<String>,
        guidance: impl Into<String>,
        reference_lyrics: impl Into<String>,
    ) -> Self {
        Self {
            artists: artists.into(),
            songs: songs.into(),
            guidance: guidance.into(),
            reference_lyrics: reference_lyrics.into(),
        }
    }

    /// True when every reference field is blank.
    pub fn is_empty(&self) -> bool {
        [&self.artists, &self.songs, &self.guidance, &self.reference_lyrics]
            .iter()
            .all(|field| field.trim().is_empty())
    }

    pub fn has_reference_lyrics(&self) -> bool {
        !self.reference_lyrics.trim().is_empty()
    }

    /// Only artist and/or song names were given, with no free-text guidance.
    pub fn is_names_only(&self) -> bool {
        let has_names = !self.songs.trim().is_empty() || !self.artists.trim().is_empty();
        has_names && self.guidance.trim().is_empty()
    }
}

/// Everything a caller supplies for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInputs {
    #[serde(flatten)]
    pub reference: ReferenceInput,
    /// Song idea or title seeding the writer
    #[serde(default)]
    pub idea: String,
    /// Optional production style guidance for the producer stage
    #[serde(default)]
    pub producer_guidance: String,
}

impl WorkflowInputs {
    pub fn new(reference: ReferenceInput) -> Self {
        Self {
            reference,
            ..Default::default()
        }
    }

    pub fn with_idea(mut self, idea: impl Into<String>) -> Self {
        self.idea = idea.into();
        self
    }

    pub fn with_producer_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.producer_guidance = guidance.into();
        self
    }

    pub fn has_idea(&self) -> bool {
        !self.idea.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_only_reference_is_empty() {
        let input = ReferenceInput::new("  ", "\n", "\t", "");
        assert!(input.is_empty());
        assert!(!ReferenceInput::new("", "", "upbeat", "").is_empty());
    }

    #[test]
    fn test_names_only() {
        assert!(ReferenceInput::new("", "Some Song", "", "").is_names_only());
        assert!(!ReferenceInput::new("", "Some Song", "slow tempo", "").is_names_only());
        assert!(!ReferenceInput::new("", "", "", "la la la").is_names_only());
    }

    #[test]
    fn test_inputs_flatten_on_the_wire() {
        let inputs = WorkflowInputs::new(ReferenceInput::new("A", "B", "", "words"))
            .with_idea("Moving On");
        let json = serde_json::to_value(&inputs).unwrap();
        assert_eq!(json["artists"], "A");
        assert_eq!(json["lyrics"], "words");
        assert_eq!(json["idea"], "Moving On");
        assert_eq!(json["producer_guidance"], "");

        let parsed: WorkflowInputs =
            serde_json::from_str(r#"{"songs": "X", "idea": "Y"}"#).unwrap();
        assert_eq!(parsed.reference.songs, "X");
        assert_eq!(parsed.reference.artists, "");
        assert_eq!(parsed.idea, "Y");
    }
}
