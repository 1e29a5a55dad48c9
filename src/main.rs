//! Songsmith CLI entry point.

use std::path::PathBuf;

use clap::Parser;

use songsmith::cli::commands::{config as config_cmd, context, generate, idea, serve, session};
use songsmith::cli::{handle_error, Cli, Commands};
use songsmith::infrastructure::logging::LoggerImpl;

/// Load `.env` from the working directory, then `~/.songsmith/.env`.
///
/// Variables already in the environment are never overwritten.
fn load_environment() {
    let mut candidates = vec![PathBuf::from(".env")];
    if let Some(home) = std::env::var_os("HOME") {
        candidates.push(PathBuf::from(home).join(".songsmith").join(".env"));
    }
    for path in candidates.into_iter().filter(|path| path.is_file()) {
        // Logging is not up yet; a bad file only costs its variables.
        let _ = dotenv::from_path(&path);
    }
}

#[tokio::main]
async fn main() {
    load_environment();

    let cli = Cli::parse();
    let json = cli.json;

    let config = match context::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, json),
    };
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, json),
    };

    let result = match cli.command {
        Commands::Template { reference } => generate::template(reference, &config, json).await,
        Commands::Lyrics {
            reference,
            idea,
            template_file,
        } => generate::lyrics(reference, idea, template_file, &config, json).await,
        Commands::Produce {
            lyrics_file,
            template_file,
            idea,
            producer_guidance,
        } => {
            generate::produce(
                lyrics_file,
                template_file,
                idea,
                producer_guidance,
                &config,
                json,
            )
            .await
        }
        Commands::Run {
            reference,
            idea,
            produce,
            producer_guidance,
        } => generate::run(reference, idea, produce, producer_guidance, &config, json).await,
        Commands::Idea => idea::execute(&config, json),
        Commands::Serve { host, port } => serve::execute(host, port, &config).await,
        Commands::Config(command) => config_cmd::execute(command, &config, json),
        Commands::Session(command) => session::execute(command, &config, json).await,
    };

    if let Err(err) = result {
        handle_error(err, json);
    }
}
