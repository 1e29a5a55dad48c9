//! Producer stage output.

use serde::{Deserialize, Serialize};

use super::lenient;

/// Marker placed in `style_prompt` when the producer output could not be parsed.
pub const STYLE_PROMPT_PARSE_ERROR: &str = "Error: Could not parse style prompt";

/// Style description plus meta-tag annotated lyric sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerOutput {
    #[serde(default, alias = "stylePrompt", deserialize_with = "lenient::text_like")]
    pub style_prompt: String,

    #[serde(
        default,
        alias = "styleExtended",
        deserialize_with = "lenient::optional_text_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub style_extended: Option<String>,

    #[serde(default, alias = "lyricSheet", deserialize_with = "lenient::text_like")]
    pub lyric_sheet: String,
}

impl ProducerOutput {
    /// Output used when the producer's answer is not recoverable JSON.
    ///
    /// The raw answer becomes the lyric sheet rather than being dropped.
    pub fn fallback(raw: impl Into<String>) -> Self {
        Self {
            style_prompt: STYLE_PROMPT_PARSE_ERROR.to_string(),
            style_extended: None,
            lyric_sheet: raw.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.style_prompt == STYLE_PROMPT_PARSE_ERROR
    }
}
