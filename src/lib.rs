//! retag - update image tags in ArgoCD manifests and push them back
//!
//! retag is a single-binary CI step: given a cluster, a project and a list
//! of applications, it rewrites the image tag inside each application's
//! YAML manifest in the working tree, then commits and pushes those files
//! to a branch through the GitHub REST git-data API.
//!
//! # Architecture
//!
//! The codebase is layered:
//!
//! - [`cli`] - Parses inputs, edits manifests, delegates the push
//! - [`manifest`] - YAML editing of the fixed image-tag field path
//! - [`push`] - The optimistic commit protocol (primitives, composer, driver)
//! - [`retry`] - Bounded retry with linear backoff and uniform jitter
//! - [`host`] - Git-data API abstraction (GitHub implementation + mock)
//! - [`ui`] - Output utilities
//!
//! # Concurrency model
//!
//! The branch ref is the single shared mutable resource and is never
//! locked: each push attempt reads the tip, builds a commit, re-reads the
//! tip and either fast-forwards or re-parents onto the moved tip. Hard
//! failures re-run the whole sequence under the retry supervisor.

pub mod cli;
pub mod host;
pub mod manifest;
pub mod push;
pub mod retry;
pub mod ui;
