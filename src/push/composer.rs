//! push::composer
//!
//! One push attempt: snapshot the branch tip, build the new tree and
//! commit, re-check the tip, then either fast-forward the ref or rebase
//! the commit onto the moved tip and force-push.

use crate::host::{CommitSha, GitHost, HostApiError};
use crate::ui::output::{self, Verbosity};

use super::ops::{self, FileEdit};

/// How a successful push attempt landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The tip did not move; the candidate commit was applied with the
    /// host's fast-forward check in force.
    Applied(CommitSha),
    /// The tip moved between the two ref reads; the edits were re-parented
    /// onto the observed tip and force-pushed.
    Rebased {
        /// The commit the ref now points at.
        sha: CommitSha,
        /// The moved tip the commit was re-parented onto.
        parent: CommitSha,
    },
}

impl PushOutcome {
    /// The commit the ref points at after this attempt.
    pub fn sha(&self) -> &CommitSha {
        match self {
            PushOutcome::Applied(sha) => sha,
            PushOutcome::Rebased { sha, .. } => sha,
        }
    }
}

/// Compose a commit from `edits` and push it to `ref_name`.
///
/// Steps, in order:
///
/// 1. read the tip
/// 2. read its tree
/// 3. write the edits as a tree layered over it
/// 4. write a commit with the tip as parent
/// 5. re-read the tip
/// 6. unchanged tip: update the ref without force
/// 7. moved tip: write a second commit re-parented onto the new tip
///    (the tree is reused; edits are absolute, not diffs) and force-push
///
/// The rebase in step 7 is a best-effort single shot, not a loop: a third
/// writer landing between steps 5 and 7 is silently overwritten by the
/// force-push. Callers that cannot accept that window must not share the
/// branch with uncoordinated writers.
pub async fn compose_and_push(
    host: &dyn GitHost,
    ref_name: &str,
    edits: &[FileEdit],
    message: &str,
    verbosity: Verbosity,
) -> Result<PushOutcome, HostApiError> {
    let tip = ops::read_ref(host, ref_name).await?;
    let base_tree = ops::read_tree(host, &tip).await?;
    let new_tree = ops::write_files_tree(host, &base_tree, edits).await?;
    let candidate = ops::write_commit(host, message, &new_tree, &tip).await?;

    let latest = ops::read_ref(host, ref_name).await?;
    if latest == tip {
        ops::update_ref(host, ref_name, &candidate, false).await?;
        return Ok(PushOutcome::Applied(candidate));
    }

    output::warn(
        format!(
            "The branch has been updated since we last fetched the latest commit sha. \
             Rebasing onto {}.",
            latest
        ),
        verbosity,
    );
    let rebased = ops::write_commit(host, message, &new_tree, &latest).await?;
    ops::update_ref(host, ref_name, &rebased, true).await?;
    Ok(PushOutcome::Rebased {
        sha: rebased,
        parent: latest,
    })
}
