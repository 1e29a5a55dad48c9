//! Reviewer verdicts and the per-iteration feedback history.

use serde::{Deserialize, Serialize};

use super::lenient;

/// Revision hint used when the reviewer's answer could not be parsed.
pub const FALLBACK_REVISION_SUGGESTION: &str = "Please try again.";

/// Structured critique of one draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    #[serde(default, deserialize_with = "lenient::bool_like")]
    pub satisfied: bool,

    #[serde(default, alias = "styleFeedback", deserialize_with = "lenient::text_like")]
    pub style_feedback: String,

    #[serde(
        default,
        alias = "languageQuality",
        deserialize_with = "lenient::optional_text_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub language_quality: Option<String>,

    #[serde(default, alias = "plagiarismConcerns", deserialize_with = "lenient::text_like")]
    pub plagiarism_concerns: String,

    #[serde(default, alias = "revisionSuggestions", deserialize_with = "lenient::text_like")]
    pub revision_suggestions: String,
}

impl ReviewVerdict {
    /// Verdict synthesized when the reviewer output is not recoverable JSON.
    ///
    /// The raw text is kept in `style_feedback` so nothing the reviewer said is lost.
    pub fn fallback(raw: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            style_feedback: raw.into(),
            language_quality: None,
            plagiarism_concerns: String::new(),
            revision_suggestions: FALLBACK_REVISION_SUGGESTION.to_string(),
        }
    }
}

/// One writer/reviewer iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// 1-based iteration number
    pub iteration: u32,
    /// The draft produced in this iteration
    pub lyrics: String,
    pub feedback: ReviewVerdict,
}
