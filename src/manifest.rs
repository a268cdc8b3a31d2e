//! manifest
//!
//! Editing of ArgoCD application manifests: replace the image tag at a
//! fixed field path inside each application's YAML file, and optionally
//! stamp a deployment timestamp next to it.
//!
//! Application files live at `env/<cluster>/<project>/<application>.yaml`
//! relative to the working-tree root.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde_yaml::Value;
use thiserror::Error;

use crate::ui::output::{self, Verbosity};

/// Dotted path of the image tag field inside an application manifest.
pub const IMAGE_TAG_PATH: &str = "spec.source.helm.valuesObject.image.tag";

/// Field stamped next to the tag when timestamping is enabled.
pub const DEPLOYMENT_TIMESTAMP_FIELD: &str = "deploymentTimestamp";

/// A failed manifest edit.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid YAML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The fixed field path is absent from the document.
    #[error("the path {field} does not exist in {path}")]
    FieldNotFound { field: String, path: PathBuf },

    /// The field exists but is not a string scalar.
    #[error("the path {field} in {path} is not a string scalar")]
    FieldNotAString { field: String, path: PathBuf },

    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Result of editing a batch of application files.
///
/// The caller decides the partial-success policy; this type just reports
/// what happened per file.
#[derive(Debug, Default)]
pub struct EditReport {
    /// Files rewritten with the new tag.
    pub updated: Vec<PathBuf>,
    /// Files that could not be edited, with the reason.
    pub failed: Vec<(PathBuf, ManifestError)>,
}

/// The on-disk path of one application's manifest.
pub fn application_file_path(root: &Path, cluster: &str, project: &str, application: &str) -> PathBuf {
    root.join("env")
        .join(cluster)
        .join(project)
        .join(format!("{}.yaml", application))
}

/// Rewrite one manifest document with `tag` at [`IMAGE_TAG_PATH`], stamping
/// [`DEPLOYMENT_TIMESTAMP_FIELD`] beside it when `timestamp` is given.
///
/// The existing field must be a string scalar; anything else is an error so
/// a typo'd manifest never gets silently restructured.
pub fn update_tag_document(
    contents: &str,
    path: &Path,
    tag: &str,
    timestamp: Option<&str>,
) -> Result<String, ManifestError> {
    let mut document: Value = serde_yaml::from_str(contents).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let segments: Vec<&str> = IMAGE_TAG_PATH.split('.').collect();
    let (field, parents) = segments.split_last().unwrap_or((&"", &[]));

    let mut current = &mut document;
    for segment in parents {
        current = match current.get_mut(*segment) {
            Some(next) => next,
            None => {
                return Err(ManifestError::FieldNotFound {
                    field: IMAGE_TAG_PATH.to_string(),
                    path: path.to_path_buf(),
                })
            }
        };
    }

    let image = match current.as_mapping_mut() {
        Some(mapping) => mapping,
        None => {
            return Err(ManifestError::FieldNotFound {
                field: IMAGE_TAG_PATH.to_string(),
                path: path.to_path_buf(),
            })
        }
    };

    match image.get(*field) {
        None => {
            return Err(ManifestError::FieldNotFound {
                field: IMAGE_TAG_PATH.to_string(),
                path: path.to_path_buf(),
            })
        }
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(ManifestError::FieldNotAString {
                field: IMAGE_TAG_PATH.to_string(),
                path: path.to_path_buf(),
            })
        }
    }

    image.insert(
        Value::String(field.to_string()),
        Value::String(tag.to_string()),
    );
    if let Some(timestamp) = timestamp {
        image.insert(
            Value::String(DEPLOYMENT_TIMESTAMP_FIELD.to_string()),
            Value::String(timestamp.to_string()),
        );
    }

    serde_yaml::to_string(&document).map_err(|source| ManifestError::Serialize {
        path: path.to_path_buf(),
        source,
    })
}

/// Edit one application file in place.
pub fn update_application_file(
    path: &Path,
    tag: &str,
    timestamp: Option<&str>,
) -> Result<(), ManifestError> {
    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let updated = update_tag_document(&contents, path, tag, timestamp)?;
    fs::write(path, updated).map_err(|source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Edit every application's manifest under
/// `env/<cluster>/<project>/`, collecting per-file outcomes.
///
/// When `stamp_timestamp` is set, one UTC timestamp is taken for the whole
/// batch so all files in a run carry the same value.
pub fn update_application_files(
    root: &Path,
    cluster: &str,
    project: &str,
    applications: &[String],
    tag: &str,
    stamp_timestamp: bool,
    verbosity: Verbosity,
) -> EditReport {
    let timestamp =
        stamp_timestamp.then(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    let mut report = EditReport::default();
    for application in applications {
        output::print(
            format!("Updating application {} file.", application),
            verbosity,
        );
        let path = application_file_path(root, cluster, project, application);
        match update_application_file(&path, tag, timestamp.as_deref()) {
            Ok(()) => report.updated.push(path),
            Err(error) => report.failed.push((path, error)),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn fake_path() -> PathBuf {
        PathBuf::from("env/prod/shop/checkout.yaml")
    }

    #[test]
    fn replaces_the_tag_and_keeps_other_fields() {
        let updated = update_tag_document(MANIFEST, &fake_path(), "v2.0.0", None).unwrap();

        let value: Value = serde_yaml::from_str(&updated).unwrap();
        let image = &value["spec"]["source"]["helm"]["valuesObject"]["image"];
        assert_eq!(image["tag"], Value::String("v2.0.0".into()));
        assert_eq!(image["repository"], Value::String("acme/checkout".into()));
        assert_eq!(value["spec"]["project"], Value::String("shop".into()));
    }

    #[test]
    fn stamps_the_deployment_timestamp_when_given() {
        let updated = update_tag_document(
            MANIFEST,
            &fake_path(),
            "v2.0.0",
            Some("2026-08-27T09:30:00Z"),
        )
        .unwrap();

        let value: Value = serde_yaml::from_str(&updated).unwrap();
        let image = &value["spec"]["source"]["helm"]["valuesObject"]["image"];
        assert_eq!(
            image[DEPLOYMENT_TIMESTAMP_FIELD],
            Value::String("2026-08-27T09:30:00Z".into())
        );
    }

    #[test]
    fn missing_field_path_is_an_error() {
        let manifest = "spec:\n  source:\n    path: charts/app\n";
        let err = update_tag_document(manifest, &fake_path(), "v2", None).unwrap_err();
        match err {
            ManifestError::FieldNotFound { field, .. } => assert_eq!(field, IMAGE_TAG_PATH),
            other => panic!("expected FieldNotFound, got {:?}", other),
        }
    }

    #[test]
    fn missing_tag_leaf_is_an_error() {
        let manifest = "\
spec:
  source:
    helm:
      valuesObject:
        image:
          repository: acme/checkout
";
        let err = update_tag_document(manifest, &fake_path(), "v2", None).unwrap_err();
        assert!(matches!(err, ManifestError::FieldNotFound { .. }));
    }

    #[test]
    fn non_string_tag_is_an_error() {
        let manifest = "\
spec:
  source:
    helm:
      valuesObject:
        image:
          tag: 123
";
        let err = update_tag_document(manifest, &fake_path(), "v2", None).unwrap_err();
        assert!(matches!(err, ManifestError::FieldNotAString { .. }));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let err = update_tag_document("spec: [unclosed", &fake_path(), "v2", None).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn application_file_path_layout() {
        let path = application_file_path(Path::new("."), "prod", "shop", "checkout");
        assert_eq!(path, PathBuf::from("./env/prod/shop/checkout.yaml"));
    }
}
