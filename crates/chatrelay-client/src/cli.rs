use clap::{Parser, ValueEnum};

/// Output format for the final message
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(version, about = "Send one chat turn through a chat relay")]
pub struct Cli {
    /// Question to ask
    pub query: String,

    /// Relay base URL
    #[arg(long, env = "CHATRELAY_RELAY_URL", default_value = "http://127.0.0.1:8080")]
    pub relay_url: String,

    /// End-user identifier forwarded upstream
    #[arg(long, env = "CHATRELAY_USER", default_value = "cli-user")]
    pub user: String,

    /// Only print the final message
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

impl Cli {
    /// Live progress only makes sense for plain text output.
    pub fn shows_progress(&self) -> bool {
        !self.quiet && matches!(self.format, OutputFormat::Text)
    }
}
