//! ui
//!
//! User-facing output utilities.
//!
//! All output goes through [`output`] so quiet mode is honored everywhere
//! and formatting stays consistent.

pub mod output;
