//! End-to-end tests of the `zs` binary
//!
//! Each test runs with an empty config directory and without ZENODO_*
//! variables so the host environment cannot leak in.

use std::process::{Command, Output};

use httptest::{Expectation, Server, matchers::*, responders::*};
use serde_json::{Value, json};
use tempfile::TempDir;

fn zs(config_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_zs"))
        .args(args)
        .env("ZS_CONFIG_DIR", config_dir.path())
        .env_remove("ZENODO_ACCESS_TOKEN")
        .env_remove("ZENODO_RESTRICTED_ACCESS_TOKEN")
        .env_remove("ZENODO_SANDBOX")
        .env_remove("ZENODO_ENDPOINT")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute zs")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("Output should be valid JSON")
}

#[test]
fn validate_accepts_well_formed_queries() {
    let dir = TempDir::new().unwrap();
    let output = zs(
        &dir,
        &[
            "validate",
            "--json",
            "zenodo://record/3269/data.csv",
            "zenodo://deposition/5157/{sample}.txt",
        ],
    );

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["all_valid"], true);
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
}

#[test]
fn validate_reports_reason() {
    let dir = TempDir::new().unwrap();
    let output = zs(&dir, &["validate", "--json", "s3://record/1/a.txt"]);

    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json["all_valid"], false);
    let reason = json["results"][0]["reason"].as_str().unwrap();
    assert!(reason.contains("scheme"));
}

#[test]
fn missing_access_token_is_reported() {
    let dir = TempDir::new().unwrap();
    let output = zs(&dir, &["stat", "zenodo://record/3269/data.csv"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("access token"));
}

#[test]
fn rm_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let output = zs(
        &dir,
        &["--access-token", "t", "rm", "zenodo://deposition/5157/a.txt"],
    );

    assert_eq!(output.status.code(), Some(7));
}

#[test]
fn info_reflects_sandbox_flag() {
    let dir = TempDir::new().unwrap();
    let output = zs(&dir, &["--access-token", "t", "--sandbox", "--json", "info"]);

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["endpoint"], "https://sandbox.zenodo.org");
    assert_eq!(json["max_requests_per_second"], 5.0);
    assert_eq!(json["examples"].as_array().unwrap().len(), 2);
}

#[test]
fn stat_uses_single_listing() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/records/3269"))
            .times(1)
            .respond_with(json_encoded(json!({
                "files": [{
                    "key": "data.csv",
                    "checksum": "md5:00000000000000000000000000000000",
                    "size": 2048,
                    "links": {"self": server.url_str("/files/data.csv")}
                }]
            }))),
    );

    let dir = TempDir::new().unwrap();
    let endpoint = server.url_str("/");
    let output = zs(
        &dir,
        &[
            "--access-token",
            "t",
            "--endpoint",
            &endpoint,
            "--json",
            "stat",
            "zenodo://record/3269/data.csv",
        ],
    );

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["exists"], true);
    assert_eq!(json["size_bytes"], 2048);
    assert_eq!(json["mtime"], 0.0);
}

#[test]
fn stat_missing_record_is_absent() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/records/0"))
            .respond_with(status_code(404)),
    );

    let dir = TempDir::new().unwrap();
    let endpoint = server.url_str("/");
    let output = zs(
        &dir,
        &[
            "--access-token",
            "t",
            "--endpoint",
            &endpoint,
            "--json",
            "stat",
            "zenodo://record/0/file.txt",
        ],
    );

    assert_eq!(output.status.code(), Some(6));
    assert_eq!(stdout_json(&output)["exists"], false);
}
