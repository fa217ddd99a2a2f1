//! # nyay CLI entry point
//!
//! Parses command-line arguments and dispatches to [`commands::run`].

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use nyay_cli::client::{ClientConfig, ClientError, NyayClient};
use nyay_cli::commands::{self, Command};

/// NyayNow case CLI
///
/// Lists cases, moves them through New Lead, Discovery, Filing, Hearing,
/// Judgment and Closed, and renders the board and progress strips.
#[derive(Parser, Debug)]
#[command(name = "nyay", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the case API.
    #[arg(long, env = "NYAY_SERVER", default_value = "http://localhost:8080", global = true)]
    server: Url,

    /// Bearer token: `{role}:{user_id}:{secret}` or `{secret}`.
    #[arg(long, env = "NYAY_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let json = std::env::var("NYAY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = ClientConfig {
        server: cli.server,
        token: cli.token,
        timeout_secs: cli.timeout_secs,
    };
    tracing::debug!(config = ?config, "nyay CLI starting");

    let client = match NyayClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("request failed: {e}");
            return ExitCode::from(1);
        }
    };

    match commands::run(&client, cli.command).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<ClientError>() {
                Some(err) if err.is_stale_version() => {
                    eprintln!("case was changed by someone else; fetch it again and retry ({err})");
                    ExitCode::from(2)
                }
                Some(err) => {
                    eprintln!("request failed: {err}");
                    ExitCode::from(1)
                }
                None => {
                    eprintln!("error: {e:#}");
                    ExitCode::from(1)
                }
            }
        }
    }
}
