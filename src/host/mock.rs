//! host::mock
//!
//! In-memory `GitHost` implementation for deterministic testing.
//!
//! # Design
//!
//! The mock stores blobs, trees, commits and refs in memory, assigns
//! predictable shas (`blob1`, `tree2`, `commit3`, ...), records every
//! operation for verification and supports two fault knobs:
//!
//! - [`MockHost::set_fail_on`]: fail a given operation unconditionally
//! - [`MockHost::set_fail_times`]: fail a given operation the next N times
//!
//! Ref reads can additionally be scripted with
//! [`MockHost::script_ref_reads`], which is how tests simulate a branch tip
//! moving between two reads inside one push attempt.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use super::traits::{
    BlobSha, CommitSha, GitHost, HostApiError, HostErrorKind, TreeEntry, TreeSha,
};

/// Mock host for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    inner: Arc<Mutex<MockHostInner>>,
}

/// A commit stored by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommit {
    pub message: String,
    pub tree: TreeSha,
    pub parent: CommitSha,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockHostInner {
    /// Blob sha -> content.
    blobs: HashMap<String, String>,
    /// Tree sha -> path -> blob sha.
    trees: HashMap<String, BTreeMap<String, BlobSha>>,
    /// Commit sha -> commit.
    commits: HashMap<String, MockCommit>,
    /// Ref name -> current tip.
    refs: HashMap<String, CommitSha>,
    /// Scripted answers for `get_ref`, consumed before `refs` is consulted.
    ref_scripts: HashMap<String, VecDeque<CommitSha>>,
    /// Which operation should fail, and how.
    fail_on: Option<FailOn>,
    /// If set, `fail_on` only applies this many more times.
    fail_remaining: Option<u32>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
    /// Counter for sha generation.
    next_id: u64,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetRef(HostErrorKind),
    GetCommit(HostErrorKind),
    CreateBlob(HostErrorKind),
    CreateTree(HostErrorKind),
    CreateCommit(HostErrorKind),
    UpdateRef(HostErrorKind),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetRef {
        ref_name: String,
    },
    GetCommit {
        commit: CommitSha,
    },
    CreateBlob {
        content: String,
    },
    CreateTree {
        base_tree: TreeSha,
        entries: Vec<TreeEntry>,
    },
    CreateCommit {
        message: String,
        tree: TreeSha,
        parent: CommitSha,
    },
    UpdateRef {
        ref_name: String,
        sha: CommitSha,
        force: bool,
    },
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree and commit holding `files` and return the commit sha.
    ///
    /// Does not touch any ref; pair with [`set_ref`](MockHost::set_ref).
    pub fn seed_commit(&self, files: &[(&str, &str)]) -> CommitSha {
        let mut inner = self.inner.lock().unwrap();
        let mut tree = BTreeMap::new();
        for (path, content) in files {
            let blob_sha = BlobSha(format!("blob{}", inner.bump_id()));
            inner.blobs.insert(blob_sha.0.clone(), content.to_string());
            tree.insert(path.to_string(), blob_sha);
        }
        let tree_sha = TreeSha(format!("tree{}", inner.bump_id()));
        inner.trees.insert(tree_sha.0.clone(), tree);
        let commit_sha = CommitSha(format!("commit{}", inner.bump_id()));
        inner.commits.insert(
            commit_sha.0.clone(),
            MockCommit {
                message: "seed".to_string(),
                tree: tree_sha,
                parent: CommitSha("root".into()),
            },
        );
        commit_sha
    }

    /// Seed a branch: create a commit holding `files` and point `ref_name`
    /// at it.
    pub fn seed_branch(&self, ref_name: &str, files: &[(&str, &str)]) -> CommitSha {
        let sha = self.seed_commit(files);
        self.set_ref(ref_name, sha.clone());
        sha
    }

    /// Point a ref at a commit without any fast-forward checking.
    pub fn set_ref(&self, ref_name: &str, sha: CommitSha) {
        self.inner
            .lock()
            .unwrap()
            .refs
            .insert(ref_name.to_string(), sha);
    }

    /// Script the next answers `get_ref` gives for `ref_name`, in order.
    /// Once the script is exhausted, reads fall back to the live ref map.
    pub fn script_ref_reads(&self, ref_name: &str, shas: Vec<CommitSha>) {
        self.inner
            .lock()
            .unwrap()
            .ref_scripts
            .insert(ref_name.to_string(), shas.into());
    }

    /// Make one operation fail unconditionally.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = Some(fail_on);
        inner.fail_remaining = None;
    }

    /// Make one operation fail the next `times` invocations, then recover.
    pub fn set_fail_times(&self, fail_on: FailOn, times: u32) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = Some(fail_on);
        inner.fail_remaining = Some(times);
    }

    /// All operations recorded so far.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Number of recorded operations matching `predicate`.
    pub fn count_ops(&self, predicate: impl Fn(&MockOperation) -> bool) -> usize {
        self.inner
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|op| predicate(op))
            .count()
    }

    /// Current tip of a ref.
    pub fn ref_sha(&self, ref_name: &str) -> Option<CommitSha> {
        self.inner.lock().unwrap().refs.get(ref_name).cloned()
    }

    /// A stored commit.
    pub fn commit(&self, sha: &CommitSha) -> Option<MockCommit> {
        self.inner.lock().unwrap().commits.get(sha.as_str()).cloned()
    }

    /// Resolve a tree to `path -> content` using the stored blobs.
    pub fn tree_files(&self, tree: &TreeSha) -> Option<BTreeMap<String, String>> {
        let inner = self.inner.lock().unwrap();
        let entries = inner.trees.get(tree.as_str())?;
        Some(
            entries
                .iter()
                .map(|(path, blob)| {
                    let content = inner.blobs.get(blob.as_str()).cloned().unwrap_or_default();
                    (path.clone(), content)
                })
                .collect(),
        )
    }
}

impl MockHostInner {
    fn bump_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Consume a configured failure for `operation`, if any.
    fn take_failure(
        &mut self,
        operation: &'static str,
        matches: impl Fn(&FailOn) -> Option<HostErrorKind>,
    ) -> Result<(), HostApiError> {
        let kind = match self.fail_on.as_ref().and_then(matches) {
            Some(kind) => kind,
            None => return Ok(()),
        };
        if let Some(remaining) = self.fail_remaining.as_mut() {
            if *remaining == 0 {
                self.fail_on = None;
                self.fail_remaining = None;
                return Ok(());
            }
            *remaining -= 1;
        }
        Err(HostApiError::new(operation, kind))
    }
}

#[async_trait]
impl GitHost for MockHost {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_ref(&self, ref_name: &str) -> Result<CommitSha, HostApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::GetRef {
            ref_name: ref_name.to_string(),
        });
        inner.take_failure("get_ref", |f| match f {
            FailOn::GetRef(kind) => Some(kind.clone()),
            _ => None,
        })?;

        if let Some(script) = inner.ref_scripts.get_mut(ref_name) {
            if let Some(sha) = script.pop_front() {
                return Ok(sha);
            }
        }
        inner.refs.get(ref_name).cloned().ok_or_else(|| {
            HostApiError::new("get_ref", HostErrorKind::NotFound(ref_name.to_string()))
        })
    }

    async fn get_commit(&self, commit: &CommitSha) -> Result<TreeSha, HostApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::GetCommit {
            commit: commit.clone(),
        });
        inner.take_failure("get_commit", |f| match f {
            FailOn::GetCommit(kind) => Some(kind.clone()),
            _ => None,
        })?;

        inner
            .commits
            .get(commit.as_str())
            .map(|c| c.tree.clone())
            .ok_or_else(|| {
                HostApiError::new("get_commit", HostErrorKind::NotFound(commit.to_string()))
            })
    }

    async fn create_blob(&self, content: &str) -> Result<BlobSha, HostApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::CreateBlob {
            content: content.to_string(),
        });
        inner.take_failure("create_blob", |f| match f {
            FailOn::CreateBlob(kind) => Some(kind.clone()),
            _ => None,
        })?;

        let sha = BlobSha(format!("blob{}", inner.bump_id()));
        inner.blobs.insert(sha.0.clone(), content.to_string());
        Ok(sha)
    }

    async fn create_tree(
        &self,
        base_tree: &TreeSha,
        entries: &[TreeEntry],
    ) -> Result<TreeSha, HostApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::CreateTree {
            base_tree: base_tree.clone(),
            entries: entries.to_vec(),
        });
        inner.take_failure("create_tree", |f| match f {
            FailOn::CreateTree(kind) => Some(kind.clone()),
            _ => None,
        })?;

        // Layer the entries over the base tree, like the real API does.
        let mut files = inner
            .trees
            .get(base_tree.as_str())
            .cloned()
            .ok_or_else(|| {
                HostApiError::new("create_tree", HostErrorKind::NotFound(base_tree.to_string()))
            })?;
        for entry in entries {
            files.insert(entry.path.clone(), entry.sha.clone());
        }
        let sha = TreeSha(format!("tree{}", inner.bump_id()));
        inner.trees.insert(sha.0.clone(), files);
        Ok(sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &TreeSha,
        parent: &CommitSha,
    ) -> Result<CommitSha, HostApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::CreateCommit {
            message: message.to_string(),
            tree: tree.clone(),
            parent: parent.clone(),
        });
        inner.take_failure("create_commit", |f| match f {
            FailOn::CreateCommit(kind) => Some(kind.clone()),
            _ => None,
        })?;

        let sha = CommitSha(format!("commit{}", inner.bump_id()));
        inner.commits.insert(
            sha.0.clone(),
            MockCommit {
                message: message.to_string(),
                tree: tree.clone(),
                parent: parent.clone(),
            },
        );
        Ok(sha)
    }

    async fn update_ref(
        &self,
        ref_name: &str,
        sha: &CommitSha,
        force: bool,
    ) -> Result<(), HostApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::UpdateRef {
            ref_name: ref_name.to_string(),
            sha: sha.clone(),
            force,
        });
        inner.take_failure("update_ref", |f| match f {
            FailOn::UpdateRef(kind) => Some(kind.clone()),
            _ => None,
        })?;

        let commit = inner.commits.get(sha.as_str()).cloned().ok_or_else(|| {
            HostApiError::new("update_ref", HostErrorKind::NotFound(sha.to_string()))
        })?;
        if !force {
            // Host-enforced fast-forward check: the new commit's parent must
            // be the ref's current tip.
            let current = inner.refs.get(ref_name);
            if current != Some(&commit.parent) {
                return Err(HostApiError::new(
                    "update_ref",
                    HostErrorKind::FastForwardRejected(format!(
                        "{} is at {:?}, not {}",
                        ref_name, current, commit.parent
                    )),
                ));
            }
        }
        inner.refs.insert(ref_name.to_string(), sha.clone());
        Ok(())
    }
}
