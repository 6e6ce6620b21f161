mod cli;

use std::io::Write;

use anyhow::Result;
use chatrelay_client::{ClientError, RelayClient, TurnCancelHandle};
use chatrelay_contracts::ChatRequest;
use clap::Parser;
use cli::{Cli, OutputFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries the answer
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let client = RelayClient::new(&cli.relay_url);
    let request = ChatRequest::query(&cli.user, &cli.query);

    let (cancel, receiver) = TurnCancelHandle::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut progress = Progress::new(cli.shows_progress());
    let result = client
        .send_turn(&request, receiver, |text| progress.update(text))
        .await;
    let shown = progress.into_shown();

    match result {
        Ok(Some(message)) => match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&message)?),
            OutputFormat::Text if shown.as_deref() == Some(message.content.as_str()) => println!(),
            OutputFormat::Text => {
                if shown.is_some() {
                    println!();
                }
                println!("{}", message.content);
            }
        },
        Ok(None) => {
            if shown.is_some() {
                println!();
            }
            eprintln!("(no response)");
        }
        Err(ClientError::Cancelled) => {
            eprintln!("\nCancelled");
        }
        Err(err) => {
            if shown.is_some() {
                println!();
            }
            print_hint(&err);
            return Err(err.into());
        }
    }

    Ok(())
}

fn print_hint(err: &ClientError) {
    if err.is_configuration() {
        eprintln!("Hint: check the relay's upstream URL and API key");
    } else if err.is_transient() {
        eprintln!("Hint: the failure looks temporary, try again shortly");
    }
}

/// Prints reconciled text as it grows. When an update rewrites text that
/// was already printed, the rewrite is printed on a fresh line.
struct Progress {
    enabled: bool,
    shown: Option<String>,
}

impl Progress {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            shown: None,
        }
    }

    fn update(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        let printed = match &self.shown {
            Some(shown) if text.starts_with(shown.as_str()) => {
                write!(stdout, "{}", &text[shown.len()..])
            }
            Some(_) => write!(stdout, "\n{}", text),
            None => write!(stdout, "{}", text),
        };
        if printed.and_then(|_| stdout.flush()).is_ok() {
            self.shown = Some(text.to_string());
        }
    }

    fn into_shown(self) -> Option<String> {
        self.shown
    }
}
