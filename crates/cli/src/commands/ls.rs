//! ls command - List files of a record or deposition

use clap::Args;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use humansize::{BINARY, format_size};
use serde::Serialize;
use zs_core::{ItemKind, Settings, is_retryable_error, retry_with_backoff};
use zs_zenodo::list_files;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct LsArgs {
    /// Item kind: record or deposition
    #[arg(value_parser = parse_kind)]
    pub kind: ItemKind,

    /// Numeric record or deposition id
    pub id: u64,
}

fn parse_kind(s: &str) -> Result<ItemKind, String> {
    s.parse()
}

#[derive(Debug, Serialize)]
struct FileEntry {
    name: String,
    size_bytes: u64,
    checksum: String,
    query: String,
}

#[derive(Debug, Serialize)]
struct LsOutput {
    kind: ItemKind,
    id: String,
    files: Vec<FileEntry>,
    total_bytes: u64,
}

pub async fn execute(args: LsArgs, settings: &Settings, formatter: &Formatter) -> ExitCode {
    let provider = match super::provider(settings, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let id = args.id.to_string();
    let registry = match retry_with_backoff(
        &settings.retry,
        || list_files(provider.client(), args.kind, &id),
        is_retryable_error,
    )
    .await
    {
        Ok(registry) => registry,
        Err(e) => return super::fail(formatter, &format!("Failed to list {} {id}", args.kind), e),
    };

    let files: Vec<FileEntry> = registry
        .iter()
        .map(|f| FileEntry {
            name: f.name.clone(),
            size_bytes: f.size,
            checksum: f.checksum.clone(),
            query: format!("zenodo://{}/{id}/{}", args.kind, f.name),
        })
        .collect();
    let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();

    if formatter.is_json() {
        formatter.json(&LsOutput {
            kind: args.kind,
            id,
            files,
            total_bytes,
        });
        return ExitCode::Success;
    }

    if files.is_empty() {
        formatter.println("No files.");
        return ExitCode::Success;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Size", "MD5"]);
    for file in &files {
        table.add_row(vec![
            formatter.style_name(&file.name),
            formatter.style_size(&format_size(file.size_bytes, BINARY)),
            file.checksum.clone(),
        ]);
    }
    formatter.println(&table.to_string());
    formatter.println(&format!(
        "{} files, {}",
        files.len(),
        format_size(total_bytes, BINARY)
    ));

    ExitCode::Success
}
