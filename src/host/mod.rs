//! host
//!
//! Abstraction over the remote hosting service's git-data API.
//!
//! # Modules
//!
//! - `traits`: the [`GitHost`] trait, sha newtypes and [`HostApiError`]
//! - [`github`]: GitHub implementation over the REST API
//! - [`mock`]: in-memory implementation for deterministic testing
//!
//! The commit/push layer ([`crate::push`]) talks only to `&dyn GitHost`, so
//! every push-protocol test runs against [`mock::MockHost`] and the GitHub
//! client is exercised separately at the HTTP level.

pub mod github;
pub mod mock;
pub mod traits;

pub use traits::{BlobSha, CommitSha, GitHost, HostApiError, HostErrorKind, TreeEntry, TreeSha};
