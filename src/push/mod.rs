//! push
//!
//! The optimistic, retrying commit protocol: compose a commit from a batch
//! of file edits and push it to a branch, tolerating concurrent writers.
//!
//! # Modules
//!
//! - [`ops`]: the five stateless repository primitives
//! - [`composer`]: one push attempt (snapshot, build, re-check, rebase or
//!   apply)
//!
//! The driver in this module binds a composer attempt into the retry
//! supervisor. Layering of failures: primitives never retry, the composer
//! never swallows, the supervisor is the single retry boundary.

pub mod composer;
pub mod ops;

pub use composer::{compose_and_push, PushOutcome};
pub use ops::FileEdit;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::host::{GitHost, HostApiError};
use crate::retry::{self, RetryExhausted, RetryObserver, RetryPolicy};
use crate::ui::output::Verbosity;

/// A failed push attempt.
#[derive(Debug, Error)]
pub enum PushError {
    /// A file scheduled for the commit could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A host API call failed.
    #[error(transparent)]
    Host(#[from] HostApiError),
}

/// Failure label used for the push retry loop.
const PUSH_FAILURE_LABEL: &str = "Failed to commit and push changes";

/// Commit `file_paths` to `branch` with the given message, retrying the
/// whole compose-and-push sequence on any failure.
///
/// File contents are re-read from disk on every attempt, so each retry
/// commits the latest on-disk state. `root` is the working-tree root the
/// repository is checked out at; tree entry paths are the file paths made
/// relative to it. The ref is `heads/<branch>`; the policy's
/// `max_attempts` bounds total attempts including the first.
pub async fn commit_and_push_with_retries(
    host: &dyn GitHost,
    root: &Path,
    file_paths: &[PathBuf],
    branch: &str,
    message: &str,
    policy: &RetryPolicy,
    observer: &dyn RetryObserver,
    verbosity: Verbosity,
) -> Result<PushOutcome, RetryExhausted<PushError>> {
    let ref_name = format!("heads/{}", branch);

    retry::run_with_retry(
        || {
            let ref_name = ref_name.clone();
            async move {
                let edits = read_edits(root, file_paths).await?;
                let outcome = compose_and_push(host, &ref_name, &edits, message, verbosity).await?;
                Ok::<_, PushError>(outcome)
            }
        },
        policy,
        PUSH_FAILURE_LABEL,
        observer,
    )
    .await
}

/// Read the current content of every file in the batch.
async fn read_edits(root: &Path, file_paths: &[PathBuf]) -> Result<Vec<FileEdit>, PushError> {
    let mut edits = Vec::with_capacity(file_paths.len());
    for path in file_paths {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PushError::ReadFile {
                path: path.clone(),
                source,
            })?;
        edits.push(FileEdit {
            path: relative_repo_path(root, path),
            content,
        });
    }
    Ok(edits)
}

/// Map an on-disk path to the repository-relative form the tree API
/// expects: stripped of the working-tree root, forward slashes, no leading
/// `./`.
fn relative_repo_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let raw = relative.to_string_lossy();
    let trimmed = raw.strip_prefix("./").unwrap_or(&raw);
    trimmed.replace('\\', "/")
}
