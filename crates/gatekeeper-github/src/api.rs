use std::sync::Arc;

use async_trait::async_trait;

use gatekeeper_types::{PolicyResult, Result};

use crate::{CommitComparison, FileContent, PullRequestFile};

// ---------------------------------------------------------------------------
// GitHubApi
// ---------------------------------------------------------------------------

/// The slice of the GitHub API the checks consume.
///
/// Implementations must not retry: every call maps to exactly one request so
/// the checks keep their one-status-per-invocation guarantee.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn list_pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>>;

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<FileContent>;

    async fn compare_commits(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison>;

    async fn create_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &PolicyResult,
    ) -> Result<()>;

    /// Run a GraphQL document. GraphQL-level errors come back as
    /// [`gatekeeper_types::GatekeeperError::Graphql`].
    async fn graphql(&self, query: &str, variables: serde_json::Value)
        -> Result<serde_json::Value>;
}

/// Shared handle to a GitHub client, cloned into every handler.
pub type SharedGitHub = Arc<dyn GitHubApi>;
