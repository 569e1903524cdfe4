//! rm command - Zenodo cannot delete files, so this always fails

use clap::Args;
use zs_core::{Settings, StorageObject, StorageProvider};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Query of the file to remove
    pub query: String,
}

pub async fn execute(args: RmArgs, settings: &Settings, formatter: &Formatter) -> ExitCode {
    let provider = match super::provider(settings, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let object = match provider.object(&args.query) {
        Ok(o) => o,
        Err(e) => return super::fail(formatter, "Invalid query", e),
    };

    match object.remove().await {
        Ok(()) => {
            formatter.success(&format!("Removed {}", args.query));
            ExitCode::Success
        }
        Err(e) => super::fail(formatter, &format!("Cannot remove {}", args.query), e),
    }
}
