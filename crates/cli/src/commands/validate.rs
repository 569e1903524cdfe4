//! validate command - Check query syntax offline

use clap::Args;
use serde::Serialize;
use zs_core::{QueryValidation, validate_query};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Queries such as zenodo://record/123456/data.csv
    #[arg(required = true)]
    pub queries: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ValidateOutput {
    results: Vec<QueryValidation>,
    all_valid: bool,
}

pub fn execute(args: ValidateArgs, formatter: &Formatter) -> ExitCode {
    let results: Vec<QueryValidation> = args.queries.iter().map(|q| validate_query(q)).collect();
    let all_valid = results.iter().all(|r| r.valid);

    if formatter.is_json() {
        formatter.json(&ValidateOutput { results, all_valid });
    } else {
        for result in &results {
            match &result.reason {
                None => formatter.success(&formatter.style_url(&result.query)),
                Some(reason) => {
                    formatter.error(&format!("{}: {reason}", result.query));
                }
            }
        }
    }

    if all_valid {
        ExitCode::Success
    } else {
        ExitCode::UsageError
    }
}
