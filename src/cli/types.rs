//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::domain::models::{HitlResponse, ReferenceInput};

#[derive(Parser, Debug)]
#[command(name = "songsmith")]
#[command(about = "Songsmith - reference-driven lyric writing pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file to use instead of songsmith.yaml and .songsmith/local.yaml
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a lyric blueprint from musical references
    Template {
        #[command(flatten)]
        reference: ReferenceArgs,
    },

    /// Write and review lyrics against an existing blueprint
    Lyrics {
        #[command(flatten)]
        reference: ReferenceArgs,

        /// Song idea or title
        #[arg(short, long)]
        idea: String,

        /// File holding the blueprint from `songsmith template`
        #[arg(short, long, value_name = "PATH")]
        template_file: PathBuf,
    },

    /// Turn finalized lyrics into a style prompt and tagged lyric sheet
    Produce {
        /// File holding the finalized lyrics ("-" for stdin)
        #[arg(short, long, value_name = "PATH")]
        lyrics_file: PathBuf,

        /// File holding the blueprint the lyrics were written against
        #[arg(short, long, value_name = "PATH")]
        template_file: Option<PathBuf>,

        /// Song idea or title
        #[arg(short, long, default_value = "")]
        idea: String,

        /// Production style guidance
        #[arg(short, long, default_value = "")]
        producer_guidance: String,
    },

    /// Blueprint then writer/reviewer loop, optionally followed by the producer
    Run {
        #[command(flatten)]
        reference: ReferenceArgs,

        /// Song idea or title (a random starter idea when omitted)
        #[arg(short, long)]
        idea: Option<String>,

        /// Also run the producer stage when the lyrics complete
        #[arg(long)]
        produce: bool,

        /// Production style guidance
        #[arg(short, long, default_value = "")]
        producer_guidance: String,
    },

    /// Print a random starter idea
    Idea,

    /// Start the HTTP API
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Checkpointed human-in-the-loop sessions
    #[command(subcommand)]
    Session(SessionCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Report credential problems for every agent role
    Check,
    /// Print the merged configuration (secrets redacted)
    Show,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Build the blueprint and pause for a song idea
    Start {
        #[command(flatten)]
        reference: ReferenceArgs,

        /// Idea offered as the default answer to the idea request
        #[arg(short, long)]
        idea: Option<String>,

        /// Production style guidance
        #[arg(short, long, default_value = "")]
        producer_guidance: String,
    },

    /// Answer the pending request of a paused session
    Respond {
        /// Checkpoint ID
        checkpoint_id: Uuid,

        /// Request being answered (defaults to the session's pending request)
        #[arg(short, long)]
        request_id: Option<Uuid>,

        #[command(flatten)]
        answer: AnswerArgs,
    },

    /// Show a session
    Show {
        /// Checkpoint ID
        checkpoint_id: Uuid,
    },
}

/// Musical references shared by the generation commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ReferenceArgs {
    /// Comma-separated artist names
    #[arg(short, long, default_value = "")]
    pub artists: String,

    /// Comma-separated song titles
    #[arg(short, long, default_value = "")]
    pub songs: String,

    /// Free-text stylistic guidance
    #[arg(short, long, default_value = "")]
    pub guidance: String,

    /// Reference lyrics
    #[arg(long, conflicts_with = "reference_file")]
    pub reference_lyrics: Option<String>,

    /// File holding reference lyrics ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub reference_file: Option<PathBuf>,
}

impl ReferenceArgs {
    pub fn into_reference(self) -> Result<ReferenceInput> {
        let lyrics = match (self.reference_lyrics, self.reference_file) {
            (Some(lyrics), _) => lyrics,
            (None, Some(path)) => read_text(&path)?,
            (None, None) => String::new(),
        };
        Ok(ReferenceInput::new(
            self.artists,
            self.songs,
            self.guidance,
            lyrics,
        ))
    }
}

/// Exactly one answer to a pending request.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct AnswerArgs {
    /// Song idea answering an idea request ("" accepts the suggested idea)
    #[arg(long)]
    pub idea: Option<String>,

    /// Accept the reviewed lyrics
    #[arg(long)]
    pub approve: bool,

    /// Send the reviewed lyrics back for another draft
    #[arg(long)]
    pub regenerate: bool,
}

impl AnswerArgs {
    pub fn into_response(self) -> HitlResponse {
        match self.idea {
            Some(idea) => HitlResponse::Idea(idea),
            None => HitlResponse::Approval(self.approve && !self.regenerate),
        }
    }
}

/// Read a text file, or stdin when `path` is "-".
pub fn read_text(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        return std::io::read_to_string(std::io::stdin()).context("Failed to read stdin");
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
