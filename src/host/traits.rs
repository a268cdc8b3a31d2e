//! host::traits
//!
//! The `GitHost` trait: the six git-data operations this tool needs from a
//! remote hosting service (read a ref, read a commit's tree, create blobs,
//! trees and commits, move a ref).
//!
//! # Design
//!
//! The trait is async because every operation is a network call. All methods
//! return `Result<_, HostApiError>`; the error carries the name of the
//! operation that failed so callers can report which step of the commit
//! sequence went wrong. No method retries internally — retry is the
//! supervisor's job, one layer up.

use async_trait::async_trait;
use thiserror::Error;

/// Identifier of a commit object on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitSha(pub String);

/// Identifier of a tree (directory snapshot) on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeSha(pub String);

/// Identifier of a blob (file content) on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobSha(pub String);

macro_rules! sha_impls {
    ($name:ident) => {
        impl $name {
            /// The raw hex string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

sha_impls!(CommitSha);
sha_impls!(TreeSha);
sha_impls!(BlobSha);

/// One entry of a tree creation request.
///
/// Mode and type are fixed by the host implementation (regular file, blob);
/// callers only choose the path and the blob it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Repository-relative file path.
    pub path: String,
    /// Blob holding the file's new content.
    pub sha: BlobSha,
}

/// A failed host API call.
///
/// `operation` names the `GitHost` method that failed; `kind` says how.
#[derive(Debug, Clone, Error)]
#[error("{operation}: {kind}")]
pub struct HostApiError {
    /// Name of the failing operation (e.g. `"get_ref"`).
    pub operation: &'static str,
    /// What went wrong.
    #[source]
    pub kind: HostErrorKind,
}

impl HostApiError {
    pub fn new(operation: &'static str, kind: HostErrorKind) -> Self {
        Self { operation, kind }
    }
}

/// Failure modes of host API calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostErrorKind {
    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested object or ref was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// A non-force ref update was rejected because the ref moved.
    #[error("update is not a fast-forward: {0}")]
    FastForwardRejected(String),

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },
}

/// The six git-data operations against a remote host.
///
/// Implementations must be `Send + Sync` so a host can be shared across
/// retry attempts. Every call is stateless with respect to this process;
/// the only state lives on the host itself.
#[async_trait]
pub trait GitHost: Send + Sync {
    /// Host name (e.g. "github", "mock").
    fn name(&self) -> &'static str;

    /// Resolve a ref (e.g. `heads/main`) to the commit it points at.
    ///
    /// # Errors
    ///
    /// `NotFound` if the ref does not exist.
    async fn get_ref(&self, ref_name: &str) -> Result<CommitSha, HostApiError>;

    /// Fetch the tree of a commit.
    ///
    /// # Errors
    ///
    /// `NotFound` if the commit is unknown to the host.
    async fn get_commit(&self, commit: &CommitSha) -> Result<TreeSha, HostApiError>;

    /// Store file content as a blob, verbatim (UTF-8, never re-encoded).
    async fn create_blob(&self, content: &str) -> Result<BlobSha, HostApiError>;

    /// Create a tree layering `entries` over `base_tree`.
    ///
    /// Paths not named in `entries` keep whatever `base_tree` has for them.
    async fn create_tree(
        &self,
        base_tree: &TreeSha,
        entries: &[TreeEntry],
    ) -> Result<TreeSha, HostApiError>;

    /// Create a single-parent commit.
    async fn create_commit(
        &self,
        message: &str,
        tree: &TreeSha,
        parent: &CommitSha,
    ) -> Result<CommitSha, HostApiError>;

    /// Point `ref_name` at `sha`.
    ///
    /// With `force = false` the host rejects the update unless it is a
    /// fast-forward from the ref's current tip (`FastForwardRejected`).
    /// With `force = true` the ref is moved unconditionally.
    async fn update_ref(
        &self,
        ref_name: &str,
        sha: &CommitSha,
        force: bool,
    ) -> Result<(), HostApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha_display_and_conversion() {
        let sha = CommitSha::from("abc123");
        assert_eq!(sha.as_str(), "abc123");
        assert_eq!(format!("{}", sha), "abc123");
        assert_eq!(CommitSha::from("abc123".to_string()), sha);
    }

    #[test]
    fn host_api_error_names_operation() {
        let err = HostApiError::new("get_ref", HostErrorKind::NotFound("heads/main".into()));
        assert_eq!(format!("{}", err), "get_ref: not found: heads/main");
    }

    #[test]
    fn host_error_kind_display() {
        assert_eq!(
            format!("{}", HostErrorKind::AuthFailed("bad token".into())),
            "authentication failed: bad token"
        );
        assert_eq!(format!("{}", HostErrorKind::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                HostErrorKind::Api {
                    status: 500,
                    message: "boom".into()
                }
            ),
            "API error: 500 - boom"
        );
        assert_eq!(
            format!(
                "{}",
                HostErrorKind::FastForwardRejected("Update is not a fast forward".into())
            ),
            "update is not a fast-forward: Update is not a fast forward"
        );
    }
}
