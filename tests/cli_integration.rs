//! Binary-level tests: argument validation and the failure surface.
//!
//! Everything here fails before any network activity, so the tests never
//! need a live or mocked GitHub.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn retag() -> Command {
    let mut cmd = Command::cargo_bin("retag").unwrap();
    // Keep the ambient CI environment out of the tests.
    cmd.env_remove("GITHUB_TOKEN").env_remove("GITHUB_HEAD_REF");
    cmd
}

fn base_args(root: &TempDir) -> Vec<String> {
    vec![
        "--cluster-name".into(),
        "prod".into(),
        "--project-name".into(),
        "shop".into(),
        "--tag".into(),
        "v2".into(),
        "--owner".into(),
        "acme".into(),
        "--repo".into(),
        "deployments".into(),
        "--github-token".into(),
        "token".into(),
        "--root".into(),
        root.path().display().to_string(),
    ]
}

#[test]
fn help_describes_the_tool() {
    retag()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("image tags"));
}

#[test]
fn missing_required_arguments_fail() {
    retag()
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn non_numeric_retries_fail_before_editing_anything() {
    let root = TempDir::new().unwrap();
    let manifest = root.child("env/prod/shop/checkout.yaml");
    manifest
        .write_str("spec: {source: {helm: {valuesObject: {image: {tag: v1}}}}}\n")
        .unwrap();

    retag()
        .args(base_args(&root))
        .args(["--applications", "checkout", "--retries", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("retries must be a non-negative integer"));

    // Validation failed first: the manifest was never rewritten.
    manifest.assert(predicate::str::contains("tag: v1"));
}

#[test]
fn empty_applications_list_fails() {
    let root = TempDir::new().unwrap();

    retag()
        .args(base_args(&root))
        .args(["--applications", " ; , "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("applications list is empty"));
}

#[test]
fn zero_updated_files_is_fatal() {
    let root = TempDir::new().unwrap();

    retag()
        .args(base_args(&root))
        .args(["--applications", "checkout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no application files were updated"));
}

#[test]
fn partial_failure_without_allow_partial_is_fatal() {
    let root = TempDir::new().unwrap();
    root.child("env/prod/shop/checkout.yaml")
        .write_str("spec: {source: {helm: {valuesObject: {image: {tag: v1}}}}}\n")
        .unwrap();

    retag()
        .args(base_args(&root))
        .args(["--applications", "checkout;missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to update"));
}
