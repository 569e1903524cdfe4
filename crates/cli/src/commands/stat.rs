//! stat command - Existence and size of one file
//!
//! By default the whole record is inventoried with a single listing and the
//! answer is read from the inventory cache, the way a workflow host would.

use clap::Args;
use humansize::{BINARY, format_size};
use serde::Serialize;
use zs_core::{
    InventoryCache, MemoryInventory, Result, Settings, StorageObject, StorageProvider,
    is_retryable_error, retry_with_backoff,
};
use zs_zenodo::{ZenodoObject, ZenodoProvider};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct StatArgs {
    /// Query of the file (zenodo://record/<id>/<path>)
    pub query: String,

    /// Ask the file listing directly instead of going through the inventory
    #[arg(long)]
    pub fresh: bool,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    query: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
    mtime: f64,
}

pub async fn execute(args: StatArgs, settings: &Settings, formatter: &Formatter) -> ExitCode {
    let provider = match super::provider(settings, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let stat = match run(&provider, &args, settings).await {
        Ok(stat) => stat,
        Err(e) => return super::fail(formatter, &format!("Failed to stat {}", args.query), e),
    };

    if formatter.is_json() {
        formatter.json(&stat);
    } else {
        let key = |k: &str| formatter.style_key(&format!("{k:<8}"));
        formatter.println(&format!("{} {}", key("Query:"), formatter.style_url(&stat.query)));
        formatter.println(&format!(
            "{} {}",
            key("Exists:"),
            if stat.exists { "yes" } else { "no" }
        ));
        if let (Some(bytes), Some(human)) = (stat.size_bytes, &stat.size_human) {
            formatter.println(&format!(
                "{} {} ({bytes} bytes)",
                key("Size:"),
                formatter.style_size(human)
            ));
        }
    }

    if stat.exists {
        ExitCode::Success
    } else {
        ExitCode::Absent
    }
}

async fn run(provider: &ZenodoProvider, args: &StatArgs, settings: &Settings) -> Result<StatOutput> {
    let object = provider.object(&args.query)?;
    let retry = &settings.retry;

    let (exists, size) = if args.fresh {
        fresh_stat(&object, settings).await?
    } else {
        let cache = MemoryInventory::new();
        retry_with_backoff(retry, || object.inventory(&cache), is_retryable_error).await?;
        match cache.entry(&object.address().cache_key()) {
            Some(entry) => (entry.exists, Some(entry.size)),
            None => {
                let parent = cache.exists_in_storage(&object.address().parent_cache_key());
                tracing::debug!(?parent, "File not in inventory");
                (false, None)
            }
        }
    };

    Ok(StatOutput {
        query: args.query.clone(),
        exists,
        size_bytes: size,
        size_human: size.map(|s| format_size(s, BINARY)),
        mtime: object.mtime().await?,
    })
}

async fn fresh_stat(object: &ZenodoObject, settings: &Settings) -> Result<(bool, Option<u64>)> {
    let retry = &settings.retry;
    let exists = retry_with_backoff(retry, || object.exists(), is_retryable_error).await?;
    if !exists {
        return Ok((false, None));
    }
    let size = retry_with_backoff(retry, || object.size(), is_retryable_error).await?;
    Ok((true, Some(size)))
}
