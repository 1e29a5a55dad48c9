//! Random starter idea command.

use anyhow::Result;
use serde::Serialize;

use crate::cli::commands::context::idea_source;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::IdeaSource;

#[derive(Debug, Serialize)]
pub struct IdeaOutput {
    pub idea: String,
}

impl CommandOutput for IdeaOutput {
    fn to_human(&self) -> String {
        self.idea.clone()
    }
}

pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let idea = idea_source(config)?.pick_random()?;
    output(&IdeaOutput { idea }, json_mode);
    Ok(())
}
