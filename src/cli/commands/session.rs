//! Human-in-the-loop session commands backed by the file checkpoint store.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::adapters::checkpoint::FileCheckpointStore;
use crate::cli::commands::context::build_workflow;
use crate::cli::display::{colorize_status, feedback_table, label, section_header};
use crate::cli::output::{create_spinner, output, CommandOutput};
use crate::cli::types::SessionCommands;
use crate::domain::errors::DomainError;
use crate::domain::models::{Config, PauseMarker, PendingRequest, WorkflowInputs};
use crate::domain::ports::CheckpointStore;
use crate::services::{HitlPipeline, SessionView};

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct SessionOutput(pub SessionView);

impl CommandOutput for SessionOutput {
    fn to_human(&self) -> String {
        let view = &self.0;
        let mut lines = vec![format!("{} {}", label("Session"), view.checkpoint_id)];

        match &view.marker {
            PauseMarker::Awaiting { request } => {
                lines.push(format!("{} {}", label("Stage"), colorize_status("awaiting")));
                lines.push(format!("{} {}", label("Request"), request.request_id()));
                match request {
                    PendingRequest::SongIdea {
                        template,
                        suggested_idea,
                        prompt,
                        ..
                    } => {
                        lines.push(section_header("Template"));
                        lines.push(template.clone());
                        lines.push(String::new());
                        lines.push(prompt.clone());
                        if let Some(idea) = suggested_idea {
                            lines.push(format!("{} {}", label("Suggested"), idea));
                        }
                        lines.push(format!(
                            "Answer with: songsmith session respond {} --idea \"...\"",
                            view.checkpoint_id
                        ));
                    }
                    PendingRequest::LyricApproval {
                        lyrics,
                        iterations_used,
                        prompt,
                        ..
                    } => {
                        lines.push(format!("{} {}", label("Iterations"), iterations_used));
                        if !view.feedback_history.is_empty() {
                            lines.push(section_header("Review history"));
                            lines.push(feedback_table(&view.feedback_history).to_string());
                        }
                        lines.push(section_header("Lyrics"));
                        lines.push(lyrics.clone());
                        lines.push(String::new());
                        lines.push(prompt.clone());
                        lines.push(format!(
                            "Answer with: songsmith session respond {} --approve | --regenerate",
                            view.checkpoint_id
                        ));
                    }
                }
            }
            PauseMarker::Completed { output } => {
                lines.push(format!("{} {}", label("Stage"), colorize_status("complete")));
                lines.push(format!("{} {}", label("Approved"), output.user_approved));
                lines.push(section_header("Style prompt"));
                lines.push(output.style_prompt.clone());
                if let Some(extended) = &output.style_extended {
                    lines.push(format!("{} {}", label("Extended"), extended));
                }
                lines.push(section_header("Lyric sheet"));
                lines.push(output.lyric_sheet.clone());
            }
            PauseMarker::Halted {
                needs_lyrics,
                message,
            } => {
                let stage = if *needs_lyrics { "needs_lyrics" } else { "halted" };
                lines.push(format!("{} {}", label("Stage"), colorize_status(stage)));
                lines.push(message.clone());
            }
        }

        lines.join("\n")
    }
}

fn store(config: &Config) -> FileCheckpointStore {
    FileCheckpointStore::new(config.checkpoints.dir.clone())
        .with_lock_ttl(config.checkpoints.lock_ttl())
}

fn pipeline(config: &Config) -> Result<HitlPipeline> {
    let workflow = Arc::new(build_workflow(config)?);
    Ok(HitlPipeline::new(workflow, Arc::new(store(config))))
}

pub async fn execute(command: SessionCommands, config: &Config, json_mode: bool) -> Result<()> {
    let view = match command {
        SessionCommands::Start {
            reference,
            idea,
            producer_guidance,
        } => {
            let pipeline = pipeline(config)?;
            let inputs = WorkflowInputs::new(reference.into_reference()?)
                .with_idea(idea.unwrap_or_default())
                .with_producer_guidance(producer_guidance);

            let spinner = create_spinner("Analyzing references...", json_mode);
            let view = pipeline.start(inputs).await;
            spinner.finish_and_clear();
            view.context("Failed to start session")?
        }
        SessionCommands::Respond {
            checkpoint_id,
            request_id,
            answer,
        } => {
            let pipeline = pipeline(config)?;
            let request_id = match request_id {
                Some(id) => id,
                None => pipeline
                    .show(checkpoint_id)
                    .await?
                    .pending()
                    .map(PendingRequest::request_id)
                    .context("Session has no pending request")?,
            };

            let spinner = create_spinner("Resuming session...", json_mode);
            let view = pipeline
                .respond(checkpoint_id, request_id, answer.into_response())
                .await;
            spinner.finish_and_clear();
            view.context("Failed to resume session")?
        }
        SessionCommands::Show { checkpoint_id } => {
            let checkpoint = store(config)
                .load(checkpoint_id)
                .await?
                .ok_or(DomainError::CheckpointNotFound(checkpoint_id))?;
            SessionView::from(&checkpoint)
        }
    };

    output(&SessionOutput(view), json_mode);
    Ok(())
}
