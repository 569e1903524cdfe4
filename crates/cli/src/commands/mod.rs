//! Subcommands of `zs`
//!
//! Each command builds its own provider from the shared settings and wraps
//! every remote call in the configured retry policy.

mod get;
mod info;
mod ls;
mod put;
mod rm;
mod stat;
mod validate;

use clap::Subcommand;
use zs_core::Settings;
use zs_zenodo::ZenodoProvider;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check query syntax without contacting Zenodo
    Validate(validate::ValidateArgs),

    /// Show endpoint, rate limits and example queries
    Info,

    /// Show existence and size of a file
    Stat(stat::StatArgs),

    /// List the files of a record or deposition
    Ls(ls::LsArgs),

    /// Download a file
    Get(get::GetArgs),

    /// Upload a file to a deposition
    Put(put::PutArgs),

    /// Remove a file (not supported by Zenodo)
    Rm(rm::RmArgs),
}

pub async fn execute(command: Commands, settings: Settings, output: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output);

    match command {
        Commands::Validate(args) => validate::execute(args, &formatter),
        Commands::Info => info::execute(&settings, &formatter),
        Commands::Stat(args) => stat::execute(args, &settings, &formatter).await,
        Commands::Ls(args) => ls::execute(args, &settings, &formatter).await,
        Commands::Get(args) => get::execute(args, &settings, &formatter).await,
        Commands::Put(args) => put::execute(args, &settings, &formatter).await,
        Commands::Rm(args) => rm::execute(args, &settings, &formatter).await,
    }
}

/// Build the provider, reporting failures on the formatter
fn provider(settings: &Settings, formatter: &Formatter) -> Result<ZenodoProvider, ExitCode> {
    ZenodoProvider::new(settings).map_err(|e| {
        formatter.error(&e.to_string());
        ExitCode::from_error(&e)
    })
}

/// Report an adapter error and map it to an exit code
fn fail(formatter: &Formatter, context: &str, error: zs_core::Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from_error(&error)
}
