//! Best-effort recovery of a JSON object from free-form model output.
//!
//! Models asked to "respond in JSON" wrap the object in prose or code fences
//! often enough that a strict parse is not sufficient. Recovery is two-phase:
//! a strict parse of the whole text, then a bounded balanced-brace scan for
//! embedded top-level objects. Nothing here panics or returns an error the
//! caller has to handle; the typed wrappers fall back to sentinel values.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::models::{ProducerOutput, ReviewVerdict};

/// Maximum number of `{` start positions tried by the scanner.
const MAX_SCAN_ATTEMPTS: usize = 32;

/// Parse `raw` as a JSON object of type `T`, or give the raw text back.
pub fn parse_json_like<T: DeserializeOwned>(raw: &str) -> Result<T, &str> {
    if let Some(parsed) = parse_object(raw.trim()) {
        return Ok(parsed);
    }

    let mut attempts = 0;
    let mut offset = 0;
    while attempts < MAX_SCAN_ATTEMPTS {
        let Some(start) = raw[offset..].find('{').map(|i| offset + i) else {
            break;
        };
        attempts += 1;
        if let Some(end) = balanced_end(&raw[start..]) {
            if let Some(parsed) = parse_object(&raw[start..start + end]) {
                return Ok(parsed);
            }
        }
        offset = start + 1;
    }

    Err(raw)
}

/// Reviewer verdict, or the fallback verdict carrying the raw text.
pub fn parse_review_verdict(raw: &str) -> ReviewVerdict {
    parse_json_like(raw).unwrap_or_else(|raw| {
        tracing::warn!(chars = raw.len(), "reviewer output was not valid JSON; using fallback verdict");
        ReviewVerdict::fallback(raw)
    })
}

/// Producer output, or the fallback with the raw text as lyric sheet.
pub fn parse_producer_output(raw: &str) -> ProducerOutput {
    parse_json_like(raw).unwrap_or_else(|raw| {
        tracing::warn!(
            preview = %raw.chars().take(200).collect::<String>(),
            "failed to parse producer output as JSON"
        );
        ProducerOutput::fallback(raw)
    })
}

fn parse_object<T: DeserializeOwned>(candidate: &str) -> Option<T> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

/// Byte length of the balanced `{...}` block at the start of `text`.
///
/// Braces inside JSON strings (including escaped quotes) are ignored.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}
