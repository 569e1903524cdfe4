//! zs: command-line access to files in Zenodo records and depositions

mod commands;
mod exit_code;
mod output;

use anyhow::Context;
use clap::{ArgAction, Args, Parser};
use tracing_subscriber::EnvFilter;
use zs_core::{ConfigManager, RetryBuilder, Settings};

use crate::commands::Commands;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Parser, Debug)]
#[command(name = "zs", version, about = "Inspect, fetch and upload files on Zenodo")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Print JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Personal access token (overrides ZENODO_ACCESS_TOKEN)
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Token for restricted records (overrides ZENODO_RESTRICTED_ACCESS_TOKEN)
    #[arg(long, global = true)]
    restricted_access_token: Option<String>,

    /// Use sandbox.zenodo.org
    #[arg(long, global = true)]
    sandbox: bool,

    /// Custom base URL of a Zenodo-compatible instance
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Attempts per remote operation
    #[arg(long, global = true)]
    retries: Option<u32>,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file, then environment, then flags
fn load_settings(args: &GlobalArgs) -> anyhow::Result<Settings> {
    let manager = ConfigManager::new()?;
    let mut settings = manager
        .load()
        .with_context(|| format!("Failed to load {}", manager.path().display()))?
        .with_env();

    if let Some(token) = &args.access_token {
        settings.access_token = Some(token.clone());
    }
    if let Some(token) = &args.restricted_access_token {
        settings.restricted_access_token = Some(token.clone());
    }
    if args.sandbox {
        settings.sandbox = true;
    }
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = Some(endpoint.clone());
    }
    if let Some(retries) = args.retries {
        settings.retry = RetryBuilder::from(settings.retry)
            .max_attempts(retries)
            .build();
    }

    tracing::debug!(?settings, "Loaded settings");
    Ok(settings)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let output = OutputConfig {
        json: cli.global.json,
        no_color: cli.global.no_color,
        quiet: cli.global.quiet,
    };

    let settings = match load_settings(&cli.global) {
        Ok(settings) => settings,
        Err(e) => {
            Formatter::new(output).error(&format!("{e:#}"));
            return ExitCode::UsageError.into();
        }
    };

    commands::execute(cli.command, settings, output).await.into()
}
