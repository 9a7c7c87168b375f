//! Integration tests for the subscan binary.
//!
//! These tests verify end-to-end functionality without relying on external
//! network services. Providers are redirected to a local mock server
//! through the `SUBSCAN_*_URL` environment variables.

use std::path::PathBuf;
use std::process::{Command, Output};
use std::str;

use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// Helper to get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_subscan"))
}

/// Command with a clean, deterministic environment.
fn subscan() -> Command {
    let mut cmd = Command::new(get_binary_path());
    for key in [
        "RUST_LOG",
        "SUBSCAN_TIMEOUT_SECS",
        "SUBSCAN_PROVIDERS",
        "SUBSCAN_PROXY",
        "SUBSCAN_HISTORY_FILE",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Command whose providers all point at `server`.
fn subscan_against(server: &MockServer) -> Command {
    let mut cmd = subscan();
    for name in ["CRTSH", "HACKERTARGET", "RAPIDDNS", "URLSCAN"] {
        cmd.env(format!("SUBSCAN_{name}_URL"), server.uri());
    }
    cmd
}

/// Run a command off the async runtime so the mock server keeps serving.
async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute binary"))
        .await
        .unwrap()
}

async fn mount_providers(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"name_value": "*.example.com\nwww.example.com"}, {"name_value": "Mail.Example.com"}]"#,
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hostsearch/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("api.example.com,93.184.216.34"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subdomain/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(server)
        .await;
}

#[test]
fn test_help_output() {
    let output = subscan()
        .arg("--help")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    for flag in ["--timeout", "--format", "--no-crtsh", "--no-urlscan", "--history", "--generate-schema"] {
        assert!(stdout.contains(flag), "help is missing {flag}: {stdout}");
    }
}

#[test]
fn test_version_output() {
    let output = subscan()
        .arg("--version")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("subscan"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_arguments() {
    let output = subscan().output().expect("Failed to execute binary");
    assert!(!output.status.success());
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("DOMAIN") || stderr.contains("required"));
}

#[test]
fn test_invalid_domain() {
    let output = subscan()
        .arg("not_a_domain")
        .output()
        .expect("Failed to execute binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("Invalid domain"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn test_invalid_domain_structured() {
    let output = subscan()
        .args(["co.uk", "--format", "json"])
        .output()
        .expect("Failed to execute binary");

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"]["category"], "input");
    assert_eq!(json["error"]["exit_code"], 1);
    assert_eq!(json["result"]["success"], false);
    assert_eq!(json["input"]["raw"], "co.uk");
}

#[test]
fn test_all_providers_disabled() {
    let output = subscan()
        .args([
            "example.com",
            "--no-crtsh",
            "--no-hackertarget",
            "--no-rapiddns",
            "--no-urlscan",
        ])
        .output()
        .expect("Failed to execute binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("No providers enabled"), "stderr: {stderr}");
}

#[test]
fn test_generate_schema() {
    let output = subscan()
        .arg("--generate-schema")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["title"], "ScanOutput");
    assert!(schema["properties"]["subdomains"].is_object());
}

#[test]
fn test_verbosity_levels() {
    let silent = subscan()
        .args(["not_a_domain", "--verbose", "0"])
        .output()
        .expect("Failed to execute binary");
    assert_eq!(silent.status.code(), Some(1));
    assert!(silent.stderr.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_plain_output_against_mock_providers() {
    let server = MockServer::start().await;
    mount_providers(&server).await;

    let mut cmd = subscan_against(&server);
    cmd.args(["example.com", "--format", "plain"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = str::from_utf8(&output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["api.example.com", "example.com", "mail.example.com", "www.example.com"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_output_format() {
    let server = MockServer::start().await;
    mount_providers(&server).await;

    let mut cmd = subscan_against(&server);
    cmd.args(["https://Example.com/", "--format", "batch"]);
    let output = run(cmd).await;

    assert!(output.status.success());
    assert_eq!(
        str::from_utf8(&output.stdout).unwrap().trim(),
        "example.com:api.example.com,example.com,mail.example.com,www.example.com"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_output_reports_partial_failure() {
    let server = MockServer::start().await;
    mount_providers(&server).await;

    let mut cmd = subscan_against(&server);
    cmd.args(["example.com", "--format", "json"]);
    let output = run(cmd).await;

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["metadata"]["tool_name"], "subscan");
    assert_eq!(json["input"]["domain"], "example.com");
    assert_eq!(json["result"]["subdomains_found"], 4);
    assert_eq!(json["result"]["partial"], true);
    assert_eq!(json["statistics"]["rate_limited"], 1);
    assert_eq!(json["providers"][3]["name"], "urlscan");
    assert_eq!(json["providers"][3]["failure"]["kind"], "rate_limited");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_text_output_lists_providers() {
    let server = MockServer::start().await;
    mount_providers(&server).await;

    let mut cmd = subscan_against(&server);
    cmd.arg("example.com");
    let output = run(cmd).await;

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("Subdomains of example.com"));
    assert!(stdout.contains("www.example.com"));
    assert!(stdout.contains("urlscan"));
    assert!(!stdout.contains('\u{1b}'), "colors must be off under NO_COLOR");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_all_providers_failing_exits_2() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut cmd = subscan_against(&server);
    cmd.arg("example.com");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2));
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("All 4 provider(s) failed"), "stderr: {stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_provider_switches_and_history() {
    let server = MockServer::start().await;
    mount_providers(&server).await;
    let dir = TempDir::new().unwrap();
    let history = dir.path().join("scans.jsonl");

    let mut cmd = subscan_against(&server);
    cmd.args(["example.com", "--format", "plain", "--no-crtsh", "--no-urlscan", "--history"])
        .arg(&history);
    let output = run(cmd).await;

    assert!(output.status.success());
    assert_eq!(str::from_utf8(&output.stdout).unwrap(), "api.example.com\n");

    let recorded = std::fs::read_to_string(&history).unwrap();
    let entry: serde_json::Value = serde_json::from_str(recorded.trim()).unwrap();
    assert_eq!(entry["domain"], "example.com");
    assert_eq!(entry["records"][0], "api.example.com");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_result_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hostsearch/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("No records found for example.com"))
        .mount(&server)
        .await;

    let mut cmd = subscan_against(&server);
    cmd.args(["example.com", "--format", "plain", "--no-crtsh", "--no-rapiddns", "--no-urlscan"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("No subdomains found"));
}
