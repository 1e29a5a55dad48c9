//! Starter idea sources.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::domain::ports::IdeaSource;

const STARTER_IDEAS: &str = include_str!("../../data/starter_ideas.txt");

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fixed list of ideas, by default the bundled starter list.
#[derive(Debug, Clone)]
pub struct StaticIdeaSource {
    ideas: Vec<String>,
}

impl StaticIdeaSource {
    pub fn new(ideas: Vec<String>) -> Self {
        Self { ideas }
    }

    /// The starter list shipped with the binary.
    pub fn bundled() -> Self {
        Self::new(parse_lines(STARTER_IDEAS))
    }

    /// One idea per non-blank line of `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ideas file: {}", path.display()))?;
        let ideas = parse_lines(&content);
        if ideas.is_empty() {
            bail!("Starter ideas file is empty: {}", path.display());
        }
        info!(count = ideas.len(), path = %path.display(), "loaded starter ideas");
        Ok(Self::new(ideas))
    }
}

impl Default for StaticIdeaSource {
    fn default() -> Self {
        Self::bundled()
    }
}

impl IdeaSource for StaticIdeaSource {
    fn ideas(&self) -> &[String] {
        &self.ideas
    }
}
