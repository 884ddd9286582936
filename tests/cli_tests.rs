//! Integration tests for the Bindery CLI
//!
//! These tests run the actual CLI binary against temp fixture files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SITE: &str = r#"
theme: tt5
subjects:
  - id: 1
    title: Home
    meta:
      subtitle: Hello
  - id: 7
    title: Draft
    meta:
      subtitle: Preview subtitle
template_parts:
  "tt5//header": "<header><!-- wp:post-title /--></header>"
sources:
  - id: demo/greeting
    label: Greeting
    value: Hi there
"#;

/// Get the binary to test, isolated from any user config
fn bindery_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bindery").unwrap();
    cmd.env("BINDERY_CONFIG", dir.path().join("config.toml"))
        .env_remove("BINDERY_MAX_INCLUDE_DEPTH")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let site = write(&dir, "site.yaml", SITE);
    (dir, site)
}

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    bindery_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("schema"))
        .stdout(predicate::str::contains("check"));
}

// ============================================================================
// render
// ============================================================================

#[test]
fn test_render_bound_value() {
    let (dir, site) = fixture();
    let attrs = write(
        &dir,
        "block.json",
        r#"{
            "twigTemplate": "<h1>{{ title }}</h1>",
            "contextBindings": [
                {"variableName": "title", "source": "core/post-meta", "arguments": "{\"key\":\"subtitle\"}"}
            ]
        }"#,
    );

    bindery_cmd(&dir)
        .args(["render", attrs.to_str().unwrap(), "--site", site.to_str().unwrap(), "--post-id", "1"])
        .assert()
        .success()
        .stdout("<h1>Hello</h1>\n");
}

#[test]
fn test_render_site_source_and_template_part() {
    let (dir, site) = fixture();
    let attrs = write(
        &dir,
        "block.json",
        r#"{
            "twigTemplate": "{{ greeting }} {{ include_template_part('header') }}",
            "contextBindings": [{"variableName": "greeting", "source": "demo/greeting"}]
        }"#,
    );

    bindery_cmd(&dir)
        .args(["render", attrs.to_str().unwrap(), "--site", site.to_str().unwrap(), "-p", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"Hi there <header><h2 class="wp-block-post-title">Home</h2></header>"#,
        ));
}

#[test]
fn test_render_preview_subject() {
    let (dir, site) = fixture();
    let attrs = write(
        &dir,
        "block.json",
        r#"{"twigTemplate": "{{ post.title }}", "previewPostId": "7"}"#,
    );
    let args = ["render", attrs.to_str().unwrap(), "--site", site.to_str().unwrap(), "-p", "1"];

    bindery_cmd(&dir).args(args).assert().success().stdout("Home\n");
    bindery_cmd(&dir)
        .args(args)
        .arg("--preview")
        .assert()
        .success()
        .stdout("Draft\n");
}

#[test]
fn test_render_error_block_depends_on_privilege() {
    let dir = TempDir::new().unwrap();
    let attrs = write(&dir, "block.json", r#"{"twigTemplate": "{% if %}"}"#);

    bindery_cmd(&dir)
        .args(["render", attrs.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Block rendering error. Please contact administrator."));

    bindery_cmd(&dir)
        .args(["render", attrs.to_str().unwrap(), "--admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<strong>Template Error:</strong>"));
}

#[test]
fn test_render_uses_config_messages() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.toml", "[messages]\ngeneric_error = \"Oops\"\n");
    let attrs = write(&dir, "block.json", r#"{"twigTemplate": "{% if %}"}"#);

    bindery_cmd(&dir)
        .args(["render", attrs.to_str().unwrap()])
        .assert()
        .success()
        .stdout("<div class=\"error\">Oops</div>\n");
}

#[test]
fn test_render_rejects_invalid_attributes() {
    let dir = TempDir::new().unwrap();
    let attrs = write(&dir, "block.json", r#"{"previewMode": "live"}"#);

    bindery_cmd(&dir)
        .args(["render", attrs.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BND-010"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_render_missing_file() {
    let dir = TempDir::new().unwrap();
    bindery_cmd(&dir)
        .args(["render", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

// ============================================================================
// preview
// ============================================================================

#[test]
fn test_preview_default_mode_lists_labels() {
    let (dir, site) = fixture();
    let attrs = write(
        &dir,
        "block.json",
        r#"{"contextBindings": [
            {"variableName": "a", "source": "demo/greeting"},
            {"variableName": "b", "source": "core/post-meta"}
        ]}"#,
    );

    bindery_cmd(&dir)
        .args(["preview", attrs.to_str().unwrap(), "--site", site.to_str().unwrap()])
        .assert()
        .success()
        .stdout("<div>{{ Greeting, Post Meta }}</div>\n");
}

#[test]
fn test_preview_twigjs_mode() {
    let (dir, site) = fixture();
    let attrs = write(
        &dir,
        "block.json",
        r#"{
            "twigTemplate": "<p>{{ a }}</p>",
            "contextBindings": [{"variableName": "a", "source": "demo/greeting", "arguments": "{\"x\":1}"}]
        }"#,
    );

    bindery_cmd(&dir)
        .args(["preview", attrs.to_str().unwrap(), "--site", site.to_str().unwrap(), "--mode", "twigjs"])
        .assert()
        .success()
        .stdout("<p>{{ Greeting: {\"x\":1} }}</p>\n");
}

#[test]
fn test_preview_rejects_unknown_mode() {
    let dir = TempDir::new().unwrap();
    let attrs = write(&dir, "block.json", "{}");
    bindery_cmd(&dir)
        .args(["preview", attrs.to_str().unwrap(), "--mode", "live"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown preview mode"));
}

// ============================================================================
// schema / check
// ============================================================================

#[test]
fn test_schema_prints_registration() {
    let dir = TempDir::new().unwrap();
    bindery_cmd(&dir)
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name": "bindery/template""#))
        .stdout(predicate::str::contains("previewPostId"));
}

#[test]
fn test_check_clean_block() {
    let dir = TempDir::new().unwrap();
    let attrs = write(
        &dir,
        "block.json",
        r#"{
            "contextBindings": [{"variableName": "a", "source": "demo/x", "arguments": "{bad"}],
            "metadata": {"bindings": {"contextBinding0": {"source": "demo/x"}}}
        }"#,
    );

    bindery_cmd(&dir)
        .args(["check", attrs.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("(1 bindings)"))
        .stdout(predicate::str::contains("arguments are not valid JSON"));
}

#[test]
fn test_check_reports_drift() {
    let dir = TempDir::new().unwrap();
    let attrs = write(
        &dir,
        "block.json",
        r#"{
            "contextBindings": [{"variableName": "a", "source": "demo/x"}],
            "metadata": {"bindings": {"contextBinding0": {"source": "demo/y"}, "contextBinding3": {"source": "demo/x"}}}
        }"#,
    );

    bindery_cmd(&dir)
        .args(["check", attrs.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BND-012"))
        .stderr(predicate::str::contains("contextBinding3"));
}
