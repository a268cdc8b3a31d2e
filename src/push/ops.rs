//! push::ops
//!
//! The five stateless repository primitives the commit protocol is built
//! from: read a ref, read a commit's tree, write a batch of file edits as a
//! tree, write a commit, move a ref.
//!
//! No retries happen here; every failure propagates to the caller as a
//! [`HostApiError`] naming the failing operation.

use futures::future::try_join_all;

use crate::host::{CommitSha, GitHost, HostApiError, TreeEntry, TreeSha};

/// One file whose full content is to be replaced in the next commit.
///
/// Edits are absolute replacements, not diffs, which is what makes the
/// composed tree reusable when a commit has to be re-parented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    /// Repository-relative path.
    pub path: String,
    /// Complete new file content.
    pub content: String,
}

/// Read the commit a ref currently points at.
pub async fn read_ref(host: &dyn GitHost, ref_name: &str) -> Result<CommitSha, HostApiError> {
    host.get_ref(ref_name).await
}

/// Read the tree of a commit.
pub async fn read_tree(host: &dyn GitHost, commit: &CommitSha) -> Result<TreeSha, HostApiError> {
    host.get_commit(commit).await
}

/// Store each edit's content as a blob and create a tree layering those
/// blobs over `base_tree`.
///
/// Blob creation is dispatched concurrently; the calls are mutually
/// independent and must merely all complete before the tree is created.
/// Files not named in `edits` are preserved from `base_tree`.
pub async fn write_files_tree(
    host: &dyn GitHost,
    base_tree: &TreeSha,
    edits: &[FileEdit],
) -> Result<TreeSha, HostApiError> {
    let entries = try_join_all(edits.iter().map(|edit| async move {
        let sha = host.create_blob(&edit.content).await?;
        Ok::<_, HostApiError>(TreeEntry {
            path: edit.path.clone(),
            sha,
        })
    }))
    .await?;

    host.create_tree(base_tree, &entries).await
}

/// Write a single-parent commit.
pub async fn write_commit(
    host: &dyn GitHost,
    message: &str,
    tree: &TreeSha,
    parent: &CommitSha,
) -> Result<CommitSha, HostApiError> {
    host.create_commit(message, tree, parent).await
}

/// Point a ref at a commit, optionally forcing past the host's
/// fast-forward check.
pub async fn update_ref(
    host: &dyn GitHost,
    ref_name: &str,
    sha: &CommitSha,
    force: bool,
) -> Result<(), HostApiError> {
    host.update_ref(ref_name, sha, force).await
}
