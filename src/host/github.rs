//! host::github
//!
//! GitHub implementation of the `GitHost` trait over the REST git-data API.
//!
//! # Design
//!
//! One endpoint per trait method:
//!
//! - `GET  /repos/{owner}/{repo}/git/ref/{ref}`
//! - `GET  /repos/{owner}/{repo}/git/commits/{sha}`
//! - `POST /repos/{owner}/{repo}/git/blobs`
//! - `POST /repos/{owner}/{repo}/git/trees`
//! - `POST /repos/{owner}/{repo}/git/commits`
//! - `PATCH /repos/{owner}/{repo}/git/refs/{ref}`
//!
//! Blob content is sent verbatim with `encoding: "utf-8"` (never base64
//! re-encoded), and tree entries are always mode `100644`, type `blob`.
//!
//! The client carries its full context explicitly (token, owner, repo,
//! API base); there is no process-wide singleton. The API base is
//! configurable for GitHub Enterprise and for tests.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{
    BlobSha, CommitSha, GitHost, HostApiError, HostErrorKind, TreeEntry, TreeSha,
};
use async_trait::async_trait;

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "retag-ci";

/// Blob mode for regular files.
const BLOB_MODE: &str = "100644";

/// GitHub host client.
///
/// Holds the credential and repository context for every call, per
/// invocation rather than per process.
pub struct GitHubHost {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token
    token: String,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubHost")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubHost {
    /// Create a client against api.github.com.
    pub fn new(token: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self::with_api_base(token, owner, repo, DEFAULT_API_BASE)
    }

    /// Create a client against a custom API base URL (GitHub Enterprise,
    /// or a mock server in tests).
    pub fn with_api_base(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.into(),
        }
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Build common headers for API requests.
    fn headers(&self, operation: &'static str) -> Result<HeaderMap, HostApiError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token)).map_err(|_| {
            HostApiError::new(
                operation,
                HostErrorKind::AuthFailed("token is not a valid header value".into()),
            )
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a git-data endpoint.
    fn git_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/git/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    fn network_err(operation: &'static str, err: reqwest::Error) -> HostApiError {
        HostApiError::new(operation, HostErrorKind::Network(err.to_string()))
    }

    /// Handle API response, mapping error statuses appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &'static str,
        response: Response,
    ) -> Result<T, HostApiError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                HostApiError::new(
                    operation,
                    HostErrorKind::Api {
                        status: status.as_u16(),
                        message: format!("Failed to parse response: {}", e),
                    },
                )
            })
        } else {
            // Try to get the error message from the body
            let message = match response.json::<GitHubErrorResponse>().await {
                Ok(err) => err.message,
                Err(_) => "Unknown error".to_string(),
            };

            let kind = match status {
                StatusCode::UNAUTHORIZED => {
                    HostErrorKind::AuthFailed("Invalid or expired token".into())
                }
                StatusCode::FORBIDDEN => {
                    HostErrorKind::AuthFailed(format!("Permission denied: {}", message))
                }
                StatusCode::NOT_FOUND => HostErrorKind::NotFound(message),
                StatusCode::TOO_MANY_REQUESTS => HostErrorKind::RateLimited,
                _ => HostErrorKind::Api {
                    status: status.as_u16(),
                    message,
                },
            };
            Err(HostApiError::new(operation, kind))
        }
    }
}

#[async_trait]
impl GitHost for GitHubHost {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn get_ref(&self, ref_name: &str) -> Result<CommitSha, HostApiError> {
        const OP: &str = "get_ref";
        let url = self.git_url(&format!("ref/{}", ref_name));

        let response = self
            .client
            .get(&url)
            .headers(self.headers(OP)?)
            .send()
            .await
            .map_err(|e| Self::network_err(OP, e))?;

        let git_ref: GitRefResponse = self.handle_response(OP, response).await?;
        Ok(CommitSha(git_ref.object.sha))
    }

    async fn get_commit(&self, commit: &CommitSha) -> Result<TreeSha, HostApiError> {
        const OP: &str = "get_commit";
        let url = self.git_url(&format!("commits/{}", commit));

        let response = self
            .client
            .get(&url)
            .headers(self.headers(OP)?)
            .send()
            .await
            .map_err(|e| Self::network_err(OP, e))?;

        let git_commit: GitCommitResponse = self.handle_response(OP, response).await?;
        Ok(TreeSha(git_commit.tree.sha))
    }

    async fn create_blob(&self, content: &str) -> Result<BlobSha, HostApiError> {
        const OP: &str = "create_blob";
        let url = self.git_url("blobs");

        let body = CreateBlobBody {
            content,
            encoding: "utf-8",
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers(OP)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::network_err(OP, e))?;

        let created: ShaResponse = self.handle_response(OP, response).await?;
        Ok(BlobSha(created.sha))
    }

    async fn create_tree(
        &self,
        base_tree: &TreeSha,
        entries: &[TreeEntry],
    ) -> Result<TreeSha, HostApiError> {
        const OP: &str = "create_tree";
        let url = self.git_url("trees");

        let body = CreateTreeBody {
            base_tree: base_tree.as_str(),
            tree: entries
                .iter()
                .map(|entry| TreeEntryBody {
                    path: &entry.path,
                    mode: BLOB_MODE,
                    kind: "blob",
                    sha: entry.sha.as_str(),
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers(OP)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::network_err(OP, e))?;

        let created: ShaResponse = self.handle_response(OP, response).await?;
        Ok(TreeSha(created.sha))
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &TreeSha,
        parent: &CommitSha,
    ) -> Result<CommitSha, HostApiError> {
        const OP: &str = "create_commit";
        let url = self.git_url("commits");

        let body = CreateCommitBody {
            message,
            tree: tree.as_str(),
            parents: vec![parent.as_str()],
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers(OP)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::network_err(OP, e))?;

        let created: ShaResponse = self.handle_response(OP, response).await?;
        Ok(CommitSha(created.sha))
    }

    async fn update_ref(
        &self,
        ref_name: &str,
        sha: &CommitSha,
        force: bool,
    ) -> Result<(), HostApiError> {
        const OP: &str = "update_ref";
        let url = self.git_url(&format!("refs/{}", ref_name));

        let body = UpdateRefBody {
            sha: sha.as_str(),
            force,
        };

        let response = self
            .client
            .patch(&url)
            .headers(self.headers(OP)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::network_err(OP, e))?;

        let result: Result<GitRefResponse, HostApiError> =
            self.handle_response(OP, response).await;
        match result {
            Ok(_) => Ok(()),
            // GitHub answers 422 to a non-fast-forward update without force
            Err(HostApiError {
                kind: HostErrorKind::Api { status: 422, message },
                ..
            }) if !force => Err(HostApiError::new(
                OP,
                HostErrorKind::FastForwardRejected(message),
            )),
            Err(err) => Err(err),
        }
    }
}

// --- Request/response bodies --------------------------------------------

#[derive(Debug, Deserialize)]
struct GitRefResponse {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitCommitResponse {
    tree: ShaResponse,
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Debug, Serialize)]
struct CreateBlobBody<'a> {
    content: &'a str,
    encoding: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTreeBody<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntryBody<'a>>,
}

#[derive(Debug, Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_url_format() {
        let host = GitHubHost::new("token", "octocat", "hello-world");
        assert_eq!(
            host.git_url("ref/heads/main"),
            "https://api.github.com/repos/octocat/hello-world/git/ref/heads/main"
        );
        assert_eq!(
            host.git_url("blobs"),
            "https://api.github.com/repos/octocat/hello-world/git/blobs"
        );
    }

    #[test]
    fn with_api_base_overrides_default() {
        let host = GitHubHost::with_api_base(
            "token",
            "owner",
            "repo",
            "https://github.example.com/api/v3",
        );
        assert_eq!(
            host.git_url("commits"),
            "https://github.example.com/api/v3/repos/owner/repo/git/commits"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let host = GitHubHost::new("secret_token_abc123", "owner", "repo");
        let debug_output = format!("{:?}", host);
        assert!(!debug_output.contains("secret_token_abc123"));
        assert!(debug_output.contains("owner"));
    }

    #[test]
    fn tree_entry_body_serializes_type_field() {
        let body = TreeEntryBody {
            path: "env/prod/app.yaml",
            mode: BLOB_MODE,
            kind: "blob",
            sha: "abc",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "blob");
        assert_eq!(json["mode"], "100644");
    }
}
