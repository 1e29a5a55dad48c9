//! Pipeline stage commands: template, lyrics, produce and run.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::commands::context::{build_workflow, idea_source};
use crate::cli::display::{colorize_status, feedback_table, label, section_header};
use crate::cli::output::{create_spinner, output, CommandOutput};
use crate::cli::types::{read_text, ReferenceArgs};
use crate::domain::models::{
    Config, WorkflowInputs, WorkflowOutputs, WorkflowState, WorkflowStatus, NEEDS_LYRICS_HINT,
};
use crate::domain::ports::IdeaSource;

/// A workflow state rendered for the terminal; JSON mode prints it as serialized.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct StateOutput(pub WorkflowState);

impl CommandOutput for StateOutput {
    fn to_human(&self) -> String {
        let state = &self.0;
        let outputs = &state.outputs;
        let mut lines = vec![format!(
            "{} {}",
            label("Status"),
            colorize_status(state.status().as_str())
        )];

        if let Some(error) = state.error() {
            lines.push(format!("{} {}", label("Error"), error));
        }
        if state.status() == &WorkflowStatus::NeedsLyrics {
            lines.push(NEEDS_LYRICS_HINT.to_string());
        }
        if let Some(idea) = outputs.idea.as_deref().filter(|idea| !idea.is_empty()) {
            lines.push(format!("{} {}", label("Idea"), idea));
        }
        if let Some(template) = &outputs.template {
            lines.push(section_header("Template"));
            lines.push(template.clone());
        }
        if !outputs.feedback_history.is_empty() {
            lines.push(section_header("Review history"));
            lines.push(feedback_table(&outputs.feedback_history).to_string());
        }
        if let Some(lyrics) = &outputs.lyrics {
            lines.push(section_header("Lyrics"));
            lines.push(lyrics.clone());
        }
        if let Some(production) = &outputs.production {
            lines.push(section_header("Style prompt"));
            lines.push(production.style_prompt.clone());
            if let Some(extended) = &production.style_extended {
                lines.push(format!("{} {}", label("Extended"), extended));
            }
            lines.push(section_header("Lyric sheet"));
            lines.push(production.lyric_sheet.clone());
        }

        lines.join("\n")
    }
}

/// Print the state, then fail the command when the pipeline ended in error.
fn finish(state: WorkflowState, json_mode: bool) -> Result<()> {
    let error = state.error().map(str::to_string);
    output(&StateOutput(state), json_mode);
    match error {
        Some(error) => bail!("Pipeline stopped: {error}"),
        None => Ok(()),
    }
}

pub async fn template(reference: ReferenceArgs, config: &Config, json_mode: bool) -> Result<()> {
    let workflow = build_workflow(config)?;
    let inputs = WorkflowInputs::new(reference.into_reference()?);

    let spinner = create_spinner("Analyzing references...", json_mode);
    let state = workflow.generate_template(inputs).await;
    spinner.finish_and_clear();

    finish(state, json_mode)
}

pub async fn lyrics(
    reference: ReferenceArgs,
    idea: String,
    template_file: PathBuf,
    config: &Config,
    json_mode: bool,
) -> Result<()> {
    let workflow = build_workflow(config)?;
    let template = read_text(&template_file)?;
    let inputs = WorkflowInputs::new(reference.into_reference()?).with_idea(idea);

    let spinner = create_spinner("Writing and reviewing lyrics...", json_mode);
    let state = workflow.generate_lyrics(inputs, &template).await;
    spinner.finish_and_clear();

    finish(state, json_mode)
}

pub async fn produce(
    lyrics_file: PathBuf,
    template_file: Option<PathBuf>,
    idea: String,
    producer_guidance: String,
    config: &Config,
    json_mode: bool,
) -> Result<()> {
    let workflow = build_workflow(config)?;
    let lyrics = read_text(&lyrics_file)?;
    let template = template_file.as_deref().map(read_text).transpose()?;
    if lyrics.trim().is_empty() {
        bail!("Lyrics file is empty: {}", lyrics_file.display());
    }

    let inputs = WorkflowInputs::default()
        .with_idea(idea.clone())
        .with_producer_guidance(producer_guidance);
    let outputs = WorkflowOutputs {
        template,
        idea: Some(idea),
        lyrics: Some(lyrics),
        ..WorkflowOutputs::default()
    };

    let spinner = create_spinner("Producing style prompt...", json_mode);
    let state = workflow
        .run_producer(WorkflowState::completed(inputs, outputs))
        .await;
    spinner.finish_and_clear();

    finish(state, json_mode)
}

pub async fn run(
    reference: ReferenceArgs,
    idea: Option<String>,
    produce: bool,
    producer_guidance: String,
    config: &Config,
    json_mode: bool,
) -> Result<()> {
    let workflow = build_workflow(config)?;
    let idea = match idea.filter(|idea| !idea.trim().is_empty()) {
        Some(idea) => idea,
        None => {
            let idea = idea_source(config)?.pick_random()?;
            info!(%idea, "no idea given; using a random starter idea");
            idea
        }
    };
    let inputs = WorkflowInputs::new(reference.into_reference()?)
        .with_idea(idea)
        .with_producer_guidance(producer_guidance);

    let spinner = create_spinner("Running lyric pipeline...", json_mode);
    let mut state = workflow.run(inputs).await;
    if produce && state.is_complete() {
        spinner.set_message("Producing style prompt...");
        state = workflow.run_producer(state).await;
    }
    spinner.finish_and_clear();

    finish(state, json_mode)
}
