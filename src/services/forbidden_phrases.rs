//! Forbidden-phrase extraction.
//!
//! Titles, artist names and hooks that repeat inside pasted reference lyrics
//! are the strings most likely to be echoed back by the writer. They are
//! collected once per loop run and injected into both the writer and the
//! reviewer prompts.

use std::collections::{HashMap, HashSet};

use crate::domain::models::ReferenceInput;

/// Placeholder phrase added whenever reference lyrics were pasted.
pub const PASTED_LYRICS_SENTINEL: &str = "Any direct lines or titles from the provided lyrics";

/// Default cap on mined n-grams.
pub const DEFAULT_MAX_NGRAMS: usize = 15;

const MIN_NGRAM: usize = 3;
const MAX_NGRAM: usize = 6;

/// Ordered, case-insensitively unique list of phrases generation must avoid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForbiddenPhrases(Vec<String>);

impl ForbiddenPhrases {
    /// Derive the phrase list from a reference.
    ///
    /// Song titles come first, then artists, then (if lyrics were pasted) the
    /// sentinel and up to `max_ngrams` repeated 3-6 word phrases.
    pub fn from_reference(reference: &ReferenceInput, max_ngrams: usize) -> Self {
        let mut phrases: Vec<String> = split_names(&reference.songs)
            .chain(split_names(&reference.artists))
            .collect();

        if reference.has_reference_lyrics() {
            phrases.push(PASTED_LYRICS_SENTINEL.to_string());
            phrases.extend(repeated_ngrams(&reference.reference_lyrics, max_ngrams));
        }

        Self::from_phrases(phrases)
    }

    /// Build from arbitrary phrases, dropping case-insensitive duplicates.
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let deduped = phrases
            .into_iter()
            .map(Into::into)
            .filter(|phrase| seen.insert(phrase.to_lowercase()))
            .collect();
        Self(deduped)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Comma-joined list for prompts, or `fallback` when there is nothing to forbid.
    pub fn prompt_list(&self, fallback: &str) -> String {
        if self.0.is_empty() {
            fallback.to_string()
        } else {
            self.0.join(", ")
        }
    }
}

fn split_names(field: &str) -> impl Iterator<Item = String> + '_ {
    field
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Lowercase runs of ASCII letters and apostrophes.
fn tokenize(lyrics: &str) -> Vec<String> {
    let lowered = lyrics.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in lowered.chars() {
        if ch.is_ascii_alphabetic() || ch == '\'' {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Phrases of 3-6 words occurring at least twice, most frequent first.
///
/// Ties are broken by word count (longer first), then by first occurrence
/// with shorter n-grams enumerated before longer ones.
pub fn repeated_ngrams(lyrics: &str, max_phrases: usize) -> Vec<String> {
    let tokens = tokenize(lyrics);
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut index: HashMap<&[String], usize> = HashMap::new();
    let mut counted: Vec<(&[String], usize)> = Vec::new();
    for n in MIN_NGRAM..=MAX_NGRAM {
        for window in tokens.windows(n) {
            match index.get(window) {
                Some(&slot) => counted[slot].1 += 1,
                None => {
                    index.insert(window, counted.len());
                    counted.push((window, 1));
                }
            }
        }
    }

    counted.retain(|(_, count)| *count >= 2);
    counted.sort_by(|(a, count_a), (b, count_b)| {
        count_b.cmp(count_a).then_with(|| b.len().cmp(&a.len()))
    });

    counted
        .into_iter()
        .take(max_phrases)
        .map(|(words, _)| words.join(" "))
        .collect()
}
