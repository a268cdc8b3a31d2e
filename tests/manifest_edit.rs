//! On-disk manifest editing tests.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

use retag::manifest;
use retag::ui::output::Verbosity;

const MANIFEST: &str = "\
apiVersion: argoproj.io/v1alpha1
kind: Application
spec:
  project: shop
  source:
    repoURL: https://github.com/acme/deployments
    helm:
      valuesObject:
        image:
          repository: acme/checkout
          tag: v1.2.3
";

fn manifest_file<'a>(root: &'a TempDir, app: &str) -> assert_fs::fixture::ChildPath {
    root.child(format!("env/prod/shop/{}.yaml", app))
}

#[test]
fn rewrites_every_application_file() {
    let root = TempDir::new().unwrap();
    manifest_file(&root, "checkout").write_str(MANIFEST).unwrap();
    manifest_file(&root, "billing").write_str(MANIFEST).unwrap();

    let report = manifest::update_application_files(
        root.path(),
        "prod",
        "shop",
        &["checkout".to_string(), "billing".to_string()],
        "v2.0.0",
        false,
        Verbosity::Quiet,
    );

    assert_eq!(report.updated.len(), 2);
    assert!(report.failed.is_empty());
    manifest_file(&root, "checkout").assert(predicate::str::contains("tag: v2.0.0"));
    manifest_file(&root, "billing").assert(predicate::str::contains("tag: v2.0.0"));
    // Unrelated fields survive the rewrite.
    manifest_file(&root, "checkout").assert(predicate::str::contains("repository: acme/checkout"));
}

#[test]
fn stamps_deployment_timestamp_when_enabled() {
    let root = TempDir::new().unwrap();
    manifest_file(&root, "checkout").write_str(MANIFEST).unwrap();

    let report = manifest::update_application_files(
        root.path(),
        "prod",
        "shop",
        &["checkout".to_string()],
        "v2.0.0",
        true,
        Verbosity::Quiet,
    );

    assert_eq!(report.updated.len(), 1);
    manifest_file(&root, "checkout").assert(predicate::str::contains("deploymentTimestamp:"));
}

#[test]
fn missing_file_is_reported_not_fatal() {
    let root = TempDir::new().unwrap();
    manifest_file(&root, "checkout").write_str(MANIFEST).unwrap();

    let report = manifest::update_application_files(
        root.path(),
        "prod",
        "shop",
        &["checkout".to_string(), "missing".to_string()],
        "v2.0.0",
        false,
        Verbosity::Quiet,
    );

    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0].1,
        manifest::ManifestError::Read { .. }
    ));
}

#[test]
fn manifest_without_tag_field_is_reported() {
    let root = TempDir::new().unwrap();
    manifest_file(&root, "checkout")
        .write_str("spec:\n  source:\n    path: charts/app\n")
        .unwrap();

    let report = manifest::update_application_files(
        root.path(),
        "prod",
        "shop",
        &["checkout".to_string()],
        "v2.0.0",
        false,
        Verbosity::Quiet,
    );

    assert!(report.updated.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0].1,
        manifest::ManifestError::FieldNotFound { .. }
    ));
    // The file is left untouched on failure.
    manifest_file(&root, "checkout").assert(predicate::str::contains("charts/app"));
}
