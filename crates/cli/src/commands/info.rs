//! info command - Describe the configured provider

use serde::Serialize;
use zs_core::{ExampleQuery, Settings, StorageProvider};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Debug, Serialize)]
struct InfoOutput {
    endpoint: String,
    rate_limiter_key: String,
    use_rate_limiter: bool,
    max_requests_per_second: f64,
    restricted_access: bool,
    max_attempts: u32,
    examples: Vec<ExampleQuery>,
}

pub fn execute(settings: &Settings, formatter: &Formatter) -> ExitCode {
    let provider = match super::provider(settings, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let info = InfoOutput {
        endpoint: provider.client().base_url().to_string(),
        rate_limiter_key: provider.rate_limiter_key(),
        use_rate_limiter: provider.use_rate_limiter(),
        max_requests_per_second: provider.default_max_requests_per_second(),
        restricted_access: provider.client().session().is_restricted(),
        max_attempts: settings.retry.max_attempts,
        examples: provider.example_queries(),
    };

    if formatter.is_json() {
        formatter.json(&info);
        return ExitCode::Success;
    }

    let key = |k: &str| formatter.style_key(&format!("{k:<18}"));
    formatter.println(&format!("{} {}", key("Endpoint:"), formatter.style_url(&info.endpoint)));
    formatter.println(&format!(
        "{} {} req/s",
        key("Rate limit:"),
        info.max_requests_per_second
    ));
    formatter.println(&format!(
        "{} {}",
        key("Restricted access:"),
        if info.restricted_access { "yes" } else { "no" }
    ));
    formatter.println(&format!("{} {}", key("Attempts:"), info.max_attempts));
    formatter.println("");
    formatter.println("Examples:");
    for example in &info.examples {
        formatter.println(&format!("  {}", formatter.style_url(&example.query)));
        formatter.println(&format!("    {}", example.description));
    }

    ExitCode::Success
}
