//! E2E CLI tests: init -> create -> assign -> show, plus error contracts.
//!
//! Each test runs the `slider` binary as a subprocess in an isolated temp
//! directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the slider binary, rooted in `dir`.
fn slider_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("slider"));
    cmd.current_dir(dir);
    cmd.env("SLIDER_LOG", "error");
    cmd.env_remove("SLIDER_DB");
    cmd.env_remove("FORMAT");
    cmd.env_remove("RUST_BACKTRACE");
    cmd.env_remove("RUST_LIB_BACKTRACE");
    cmd
}

fn init_store(dir: &Path) {
    slider_cmd(dir).args(["init"]).assert().success();
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = slider_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

/// Create a slider via CLI, return its id.
fn create_slider(dir: &Path, name: &str, extra: &[&str]) -> i64 {
    let mut args = vec!["create", "--name", name];
    args.extend_from_slice(extra);
    let json = run_json(dir, &args);
    json["outcome"]["slider_id"]
        .as_i64()
        .expect("create output should have outcome.slider_id")
}

fn banner_pairs(show: &Value) -> Vec<(i64, i64)> {
    show["banners"]
        .as_array()
        .expect("banners array")
        .iter()
        .map(|b| {
            (
                b["banner_id"].as_i64().expect("banner_id"),
                b["position"].as_i64().expect("position"),
            )
        })
        .collect()
}

/// The `{"error": ...}` object a `--json` failure writes to stderr.
fn error_json(stderr: &[u8]) -> Value {
    let stderr = String::from_utf8_lossy(stderr);
    let start = stderr.find('{').expect("json error on stderr");
    let end = stderr.rfind('}').expect("json error on stderr");
    serde_json::from_str(&stderr[start..=end]).expect("valid error JSON")
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .expect("id array")
        .iter()
        .map(|v| v.as_i64().expect("integer id"))
        .collect()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn init_creates_store_and_is_rerunnable() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    assert!(dir.path().join(".slider/slider.db").exists());

    let json = run_json(dir.path(), &["init"]);
    assert_eq!(json["schema_version"], 2);
}

#[test]
fn create_with_banners_then_show_in_position_order() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());

    let id = create_slider(
        dir.path(),
        "Homepage",
        &["--banner", "10:2", "--banner", "11:1", "--store", "3,2,3"],
    );

    let show = run_json(dir.path(), &["show", &id.to_string()]);
    assert_eq!(show["name"], "Homepage");
    assert_eq!(ids(&show["store_ids"]), vec![3, 2]);
    assert_eq!(banner_pairs(&show), vec![(11, 1), (10, 2)]);
}

#[test]
fn store_zero_collapses_to_all_stores() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    let id = create_slider(dir.path(), "Everywhere", &["--store", "4,0,5"]);

    let show = run_json(dir.path(), &["show", &id.to_string()]);
    assert_eq!(ids(&show["store_ids"]), vec![0]);
}

#[test]
fn assign_reports_minimal_changes() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    let id = create_slider(
        dir.path(),
        "Promo",
        &["--banner", "1:1", "--banner", "2:2", "--banner", "3:3"],
    )
    .to_string();

    // keep 1, move 2, drop 3, add 4
    let json = run_json(
        dir.path(),
        &["assign", &id, "--banner", "1:1", "--banner", "2:5", "--banner", "4:4"],
    );
    assert_eq!(json["changed"], true);
    assert_eq!(ids(&json["affected_ids"]), vec![2, 3, 4]);
    assert_eq!(ids(&json["notify_ids"]), vec![3, 4]);
    assert_eq!(json["diff"]["to_update"]["2"], 5);

    let show = run_json(dir.path(), &["show", &id]);
    assert_eq!(banner_pairs(&show), vec![(1, 1), (4, 4), (2, 5)]);
}

#[test]
fn assigning_same_state_is_a_noop() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    let id = create_slider(dir.path(), "Stable", &["--banner", "7:1"]).to_string();

    let json = run_json(dir.path(), &["assign", &id, "--banner", "7:1"]);
    assert_eq!(json["changed"], false);
    assert!(ids(&json["affected_ids"]).is_empty());
}

#[test]
fn clear_removes_every_banner() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    let id = create_slider(dir.path(), "Gone", &["--banner", "7:1", "--banner", "8:2"])
        .to_string();

    let json = run_json(dir.path(), &["assign", &id, "--clear"]);
    assert_eq!(ids(&json["notify_ids"]), vec![7, 8]);

    let show = run_json(dir.path(), &["show", &id]);
    assert!(banner_pairs(&show).is_empty());
}

#[test]
fn payload_is_coerced_like_form_input() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    let id = create_slider(dir.path(), "Form", &[]).to_string();

    run_json(
        dir.path(),
        &[
            "assign",
            &id,
            "--payload",
            r#"{"12": {"position": "3"}, "15": {}}"#,
        ],
    );

    let show = run_json(dir.path(), &["show", &id]);
    assert_eq!(banner_pairs(&show), vec![(15, 0), (12, 3)]);
}

#[test]
fn dry_run_does_not_write() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    let id = create_slider(dir.path(), "Preview", &["--banner", "1:1"]).to_string();

    let json = run_json(dir.path(), &["assign", &id, "--banner", "2:1", "--dry-run"]);
    assert_eq!(json["dry_run"], true);
    assert_eq!(ids(&json["affected_ids"]), vec![1, 2]);

    let show = run_json(dir.path(), &["show", &id]);
    assert_eq!(banner_pairs(&show), vec![(1, 1)]);
}

#[test]
fn where_finds_sliders_for_banner() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    let a = create_slider(dir.path(), "A", &["--banner", "9:1"]);
    let b = create_slider(dir.path(), "B", &["--banner", "9:4", "--banner", "3:1"]);
    create_slider(dir.path(), "C", &["--banner", "3:1"]);

    let json = run_json(dir.path(), &["where", "9"]);
    let found: Vec<i64> = json["sliders"]
        .as_array()
        .expect("sliders")
        .iter()
        .map(|s| s["id"].as_i64().expect("id"))
        .collect();
    assert_eq!(found, vec![a, b]);
}

#[test]
fn list_text_output_is_tab_separated() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    create_slider(dir.path(), "Homepage", &["--banner", "1:1", "--banner", "2:2"]);

    slider_cmd(dir.path())
        .args(["list", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Homepage\tall\t2"));
}

#[test]
fn db_flag_overrides_default_location() {
    let dir = TempDir::new().expect("tempdir");
    slider_cmd(dir.path())
        .args(["--db", "custom/sliders.db", "init"])
        .assert()
        .success();
    assert!(dir.path().join("custom/sliders.db").exists());
    assert!(!dir.path().join(".slider").exists());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn missing_store_reports_init_hint() {
    let dir = TempDir::new().expect("tempdir");
    let output = slider_cmd(dir.path())
        .args(["list", "--json"])
        .output()
        .expect("command should not crash");
    assert!(!output.status.success());

    assert_eq!(error_json(&output.stderr)["error"]["error_code"], "E1001");
}

#[test]
fn missing_slider_fails() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());

    slider_cmd(dir.path())
        .args(["show", "404"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("slider 404 not found"));
}

#[test]
fn non_object_payload_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());
    let id = create_slider(dir.path(), "Strict", &[]).to_string();

    slider_cmd(dir.path())
        .args(["assign", &id, "--payload", "[1,2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected an object"));
}

#[test]
fn blank_name_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());

    slider_cmd(dir.path())
        .args(["create", "--name", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn blank_name_reports_its_error_code() {
    let dir = TempDir::new().expect("tempdir");
    init_store(dir.path());

    let output = slider_cmd(dir.path())
        .args(["create", "--name", "", "--json"])
        .output()
        .expect("command should not crash");
    assert!(!output.status.success());
    assert_eq!(error_json(&output.stderr)["error"]["error_code"], "E2003");
}

#[test]
fn broken_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("slider.toml"), "[store\npath = 1\n").expect("write config");

    slider_cmd(dir.path())
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Fix syntax in slider.toml"));
}

#[test]
fn config_file_sets_store_path() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("slider.toml"),
        "[store]\npath = \"data/banners.db\"\n",
    )
    .expect("write config");

    init_store(dir.path());
    assert!(dir.path().join("data/banners.db").exists());
}
