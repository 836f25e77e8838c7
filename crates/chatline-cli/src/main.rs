//! `chatline` command-line driver for the chat generation service.

mod cli;
mod commands;

use std::time::Duration;

use chatline_client::observability::{LogSettings, init_observability};
use chatline_client::{ChatClient, ClientConfig};
use clap::Parser as _;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut log = LogSettings::from_env();
    if let Some(level) = cli.log_level {
        log.level = Some(level);
    }
    if let Some(path) = cli.json_log {
        log.json_path = Some(path);
    }
    init_observability(&log)?;

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config = config.base_url(base_url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.timeout(Duration::from_secs(secs));
    }
    let client = ChatClient::new(config)?;

    match cli.command {
        Command::Send {
            message,
            image,
            previous_response_id,
            no_stream,
        } => {
            commands::send(
                &client,
                message,
                image.as_deref(),
                previous_response_id,
                no_stream,
            )
            .await
        }
        Command::Chat {
            previous_response_id,
        } => commands::chat(client, previous_response_id).await,
        Command::Image { prompt, out } => commands::image(&client, &prompt, &out).await,
        Command::Transcribe { audio } => commands::transcribe(&client, &audio).await,
        Command::Speech {
            audio,
            previous_response_id,
        } => commands::speech(&client, &audio, previous_response_id.as_deref()).await,
    }
}
