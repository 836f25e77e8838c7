use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// chatline: talk to a chat generation service from the terminal.
#[derive(Debug, Parser)]
#[command(name = "chatline", version, about)]
pub struct Cli {
    /// Base URL of the generation service (overrides CHATLINE_BASE_URL).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Whole-request timeout in seconds (overrides CHATLINE_TIMEOUT_SECS).
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
    /// Log level for chatline (`debug`) or a full filter (overrides CHATLINE_LOG_LEVEL).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Write JSON logs to this file (overrides CHATLINE_JSON_LOG_PATH).
    #[arg(long, global = true)]
    pub json_log: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one message and print the reply.
    Send {
        /// The message to send.
        message: String,
        /// Image file to attach.
        #[arg(long)]
        image: Option<PathBuf>,
        /// Continue the thread started by this response id.
        #[arg(long)]
        previous_response_id: Option<String>,
        /// Wait for the whole reply instead of streaming it.
        #[arg(long)]
        no_stream: bool,
    },
    /// Interactive multi-turn chat on stdin.
    Chat {
        /// Resume the thread started by this response id.
        #[arg(long)]
        previous_response_id: Option<String>,
    },
    /// Generate an image from a prompt and write it as PNG.
    Image {
        prompt: String,
        #[arg(long, default_value = "image.png")]
        out: PathBuf,
    },
    /// Transcribe an audio file.
    Transcribe { audio: PathBuf },
    /// Transcribe an audio file and reply to it.
    Speech {
        audio: PathBuf,
        #[arg(long)]
        previous_response_id: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    #[test]
    fn send_parses_flags_and_global_overrides() {
        let cli = Cli::try_parse_from([
            "chatline",
            "send",
            "hello",
            "--no-stream",
            "--previous-response-id",
            "r1",
            "--base-url",
            "http://host:1",
        ])
        .expect("parse");
        assert_eq!(cli.base_url.as_deref(), Some("http://host:1"));
        match cli.command {
            Command::Send {
                message,
                no_stream,
                previous_response_id,
                image,
            } => {
                assert_eq!(message, "hello");
                assert!(no_stream);
                assert_eq!(previous_response_id.as_deref(), Some("r1"));
                assert!(image.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn logging_flags_are_global() {
        let cli = Cli::try_parse_from([
            "chatline",
            "transcribe",
            "clip.webm",
            "--log-level",
            "debug",
            "--json-log",
            "logs/chatline.jsonl",
        ])
        .expect("parse");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.json_log, Some(PathBuf::from("logs/chatline.jsonl")));
    }

    #[test]
    fn image_defaults_output_path() {
        let cli = Cli::try_parse_from(["chatline", "image", "a cat"]).expect("parse");
        let Command::Image { out, .. } = cli.command else {
            panic!("expected image command");
        };
        assert_eq!(out, PathBuf::from("image.png"));
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["chatline"]).is_err());
    }
}
