//! get command - Download a file with checksum verification

use std::path::{Path, PathBuf};

use clap::Args;
use humansize::{BINARY, format_size};
use serde::Serialize;
use zs_core::{
    Result, Settings, StorageObject, StorageProvider, is_retryable_error, retry_with_backoff,
};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Query of the file to download
    pub query: String,

    /// Destination path (default: ./<kind>/<id>/<path>)
    pub dest: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct GetOutput {
    query: String,
    path: String,
    size_bytes: u64,
}

pub async fn execute(args: GetArgs, settings: &Settings, formatter: &Formatter) -> ExitCode {
    let provider = match super::provider(settings, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let object = match provider.object(&args.query) {
        Ok(o) => o,
        Err(e) => return super::fail(formatter, "Invalid query", e),
    };
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| PathBuf::from(object.local_suffix()));

    match download(&object, &dest, settings).await {
        Ok(size_bytes) => {
            if formatter.is_json() {
                formatter.json(&GetOutput {
                    query: args.query,
                    path: dest.display().to_string(),
                    size_bytes,
                });
            } else {
                formatter.success(&format!(
                    "{} -> {} ({})",
                    formatter.style_url(&args.query),
                    formatter.style_name(&dest.display().to_string()),
                    formatter.style_size(&format_size(size_bytes, BINARY))
                ));
            }
            ExitCode::Success
        }
        Err(e) => super::fail(formatter, &format!("Failed to download {}", args.query), e),
    }
}

async fn download(object: &impl StorageObject, dest: &Path, settings: &Settings) -> Result<u64> {
    retry_with_backoff(&settings.retry, || object.retrieve(dest), is_retryable_error).await?;
    Ok(tokio::fs::metadata(dest).await?.len())
}
