//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse and validate inputs (invalid configuration fails before any
//!   file or network activity)
//! - Edit the application manifests
//! - Delegate the push to [`crate::push`] under the retry supervisor
//!
//! The CLI layer is thin: all push semantics live in the library modules.

pub mod args;

pub use args::{Cli, InvalidInput};

use anyhow::{bail, Result};

use crate::host::github::GitHubHost;
use crate::manifest;
use crate::push;
use crate::retry::{ConsoleObserver, RetryPolicy};
use crate::ui::output::{self, Verbosity};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    run_with(cli).await
}

/// Run with already-parsed arguments (separated for tests).
pub async fn run_with(cli: Cli) -> Result<()> {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    // Validate configuration before touching any file or the network.
    let retries = cli.parsed_retries()?;
    let applications = args::parse_applications(&cli.applications);
    if applications.is_empty() {
        bail!(InvalidInput::NoApplications);
    }
    let branch = cli.branch_name().to_string();

    let report = manifest::update_application_files(
        &cli.root,
        &cli.cluster_name,
        &cli.project_name,
        &applications,
        &cli.tag,
        cli.stamp_timestamp,
        verbosity,
    );
    for (path, error) in &report.failed {
        output::warn(
            format!(
                "Failed to update application tag in file {}: {}",
                path.display(),
                error
            ),
            verbosity,
        );
    }
    if report.updated.is_empty() {
        bail!("no application files were updated");
    }
    if !report.failed.is_empty() && !cli.allow_partial {
        bail!(
            "{} of {} application files failed to update (pass --allow-partial to push the rest)",
            report.failed.len(),
            applications.len()
        );
    }

    let message = format!(
        "in {}: Update {} to {}",
        cli.cluster_name,
        applications.join(", "),
        cli.tag
    );
    output::debug(format!("commit message: {}", message), verbosity);

    let host = GitHubHost::new(&cli.github_token, &cli.owner, &cli.repo);
    let policy = RetryPolicy::for_retries(retries);
    let observer = ConsoleObserver::new(verbosity);

    push::commit_and_push_with_retries(
        &host,
        &cli.root,
        &report.updated,
        &branch,
        &message,
        &policy,
        &observer,
        verbosity,
    )
    .await?;

    output::print("Successfully committed and pushed changes.", verbosity);
    Ok(())
}
