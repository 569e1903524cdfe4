//! put command - Upload a local file into a deposition

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use zs_core::{Settings, StorageObject, StorageProvider, is_retryable_error, retry_with_backoff};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub source: PathBuf,

    /// Target query (zenodo://deposition/<id>/<path>)
    pub query: String,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    query: String,
    source: String,
}

pub async fn execute(args: PutArgs, settings: &Settings, formatter: &Formatter) -> ExitCode {
    if !args.source.is_file() {
        formatter.error(&format!("Not a file: {}", args.source.display()));
        return ExitCode::UsageError;
    }

    let provider = match super::provider(settings, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let object = match provider.object(&args.query) {
        Ok(o) => o,
        Err(e) => return super::fail(formatter, "Invalid query", e),
    };
    if object.address().is_published() {
        formatter.warning("Published records are read-only; upload to a deposition instead");
    }

    let result = retry_with_backoff(
        &settings.retry,
        || object.store(&args.source),
        is_retryable_error,
    )
    .await;

    match result {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&PutOutput {
                    query: args.query,
                    source: args.source.display().to_string(),
                });
            } else {
                formatter.success(&format!(
                    "{} -> {}",
                    formatter.style_name(&args.source.display().to_string()),
                    formatter.style_url(&args.query)
                ));
            }
            ExitCode::Success
        }
        Err(e) => super::fail(formatter, &format!("Failed to upload to {}", args.query), e),
    }
}
