//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! Inputs mirror what the CI pipeline hands the step: the cluster, project
//! and applications identifying which manifests to edit, the tag to set,
//! and the repository coordinates and token for the push. `GITHUB_TOKEN`
//! and `GITHUB_HEAD_REF` are picked up from the environment the way CI
//! runners export them.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

/// Update image tags in ArgoCD application manifests and push the result
/// back to a branch.
#[derive(Parser, Debug)]
#[command(name = "retag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Cluster the applications deploy to (env/<cluster>/...)
    #[arg(long)]
    pub cluster_name: String,

    /// Project directory under the cluster (env/<cluster>/<project>/...)
    #[arg(long)]
    pub project_name: String,

    /// Applications to update, separated by ';' or ','
    #[arg(long)]
    pub applications: String,

    /// Image tag to set
    #[arg(long)]
    pub tag: String,

    /// Repository owner (user or organization)
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// GitHub token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// Branch to push to; defaults to the CI head ref or "main"
    #[arg(long, env = "GITHUB_HEAD_REF", default_value = "")]
    pub branch: String,

    /// Additional push attempts after the first
    #[arg(long, default_value = "1")]
    pub retries: String,

    /// Working-tree root containing env/<cluster>/<project>/
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Stamp a deploymentTimestamp field next to the tag
    #[arg(long)]
    pub stamp_timestamp: bool,

    /// Commit the files that did update even if some failed to edit
    #[arg(long)]
    pub allow_partial: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Invalid configuration, caught before any file or network activity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("retries must be a non-negative integer, got {0:?}")]
    Retries(String),

    #[error("applications list is empty")]
    NoApplications,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// The branch to push to. CI exports `GITHUB_HEAD_REF` as an empty
    /// string on non-PR events, so empty falls back to `main`.
    pub fn branch_name(&self) -> &str {
        if self.branch.is_empty() {
            "main"
        } else {
            &self.branch
        }
    }

    /// Parse the configured retry count.
    pub fn parsed_retries(&self) -> Result<u32, InvalidInput> {
        self.retries
            .trim()
            .parse::<u32>()
            .map_err(|_| InvalidInput::Retries(self.retries.clone()))
    }
}

/// Split an applications list on `;` or `,`, trimming whitespace and
/// dropping empty entries.
pub fn parse_applications(raw: &str) -> Vec<String> {
    raw.split([';', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
