//! In-memory `GitHubApi` for tests.
//!
//! `MockGitHub` serves canned responses and records every call so tests can
//! assert on the exact side effects a check produced.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use gatekeeper_types::{GatekeeperError, PolicyResult, Result};

use crate::{CommitComparison, ComparedCommit, FileContent, GitHubApi, PullRequestFile};

/// Record of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// Trait method name, e.g. `"create_commit_status"`.
    pub method: String,
    pub args: Vec<String>,
    pub payload: Option<serde_json::Value>,
}

#[derive(Default)]
struct MockState {
    calls: Vec<MockCall>,
    files: Vec<PullRequestFile>,
    contents: HashMap<(String, String), FileContent>,
    comparison: CommitComparison,
    status_error: Option<String>,
    /// Query substring → GraphQL error messages returned for matching documents.
    graphql_errors: Vec<(String, Vec<String>)>,
}

#[derive(Default)]
pub struct MockGitHub {
    state: Mutex<MockState>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, method: &str, args: Vec<String>, payload: Option<serde_json::Value>) {
        self.lock().calls.push(MockCall {
            method: method.to_string(),
            args,
            payload,
        });
    }

    // --- configuration ---

    pub fn with_files(self, files: Vec<PullRequestFile>) -> Self {
        self.lock().files = files;
        self
    }

    /// Serve `content` (already base64-encoded) for `path` at `git_ref`.
    pub fn with_file_content(self, path: &str, git_ref: &str, content: &str) -> Self {
        self.lock().contents.insert(
            (path.to_string(), git_ref.to_string()),
            FileContent {
                content: content.to_string(),
                encoding: Some("base64".into()),
            },
        );
        self
    }

    pub fn with_commits(self, commits: Vec<ComparedCommit>) -> Self {
        self.lock().comparison = CommitComparison { commits };
        self
    }

    /// Make every commit status creation fail with an HTTP 500.
    pub fn failing_statuses(self, message: &str) -> Self {
        self.lock().status_error = Some(message.to_string());
        self
    }

    /// Fail GraphQL documents containing `query_marker` with the given messages.
    pub fn failing_graphql(self, query_marker: &str, messages: &[&str]) -> Self {
        self.lock().graphql_errors.push((
            query_marker.to_string(),
            messages.iter().map(|m| m.to_string()).collect(),
        ));
        self
    }

    // --- inspection ---

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<MockCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Every commit status posted so far, in order.
    pub fn statuses(&self) -> Vec<PolicyResult> {
        self.calls_to("create_commit_status")
            .into_iter()
            .filter_map(|c| c.payload.and_then(|p| serde_json::from_value(p).ok()))
            .collect()
    }

    /// The GraphQL documents sent so far, in order.
    pub fn graphql_queries(&self) -> Vec<String> {
        self.calls_to("graphql")
            .into_iter()
            .filter_map(|c| c.args.into_iter().next())
            .collect()
    }
}

#[async_trait]
impl GitHubApi for MockGitHub {
    async fn list_pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>> {
        self.record(
            "list_pull_request_files",
            vec![owner.into(), repo.into(), number.to_string()],
            None,
        );
        Ok(self.lock().files.clone())
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<FileContent> {
        self.record(
            "get_file_content",
            vec![owner.into(), repo.into(), path.into(), git_ref.into()],
            None,
        );
        self.lock()
            .contents
            .get(&(path.to_string(), git_ref.to_string()))
            .cloned()
            .ok_or_else(|| GatekeeperError::Api {
                endpoint: format!("GET /repos/{}/{}/contents/{}", owner, repo, path),
                status: 404,
                message: "Not Found".into(),
            })
    }

    async fn compare_commits(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison> {
        self.record(
            "compare_commits",
            vec![owner.into(), repo.into(), base.into(), head.into()],
            None,
        );
        Ok(self.lock().comparison.clone())
    }

    async fn create_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &PolicyResult,
    ) -> Result<()> {
        self.record(
            "create_commit_status",
            vec![owner.into(), repo.into(), sha.into()],
            serde_json::to_value(status).ok(),
        );
        match self.lock().status_error.clone() {
            Some(message) => Err(GatekeeperError::Api {
                endpoint: format!("POST /repos/{}/{}/statuses/{}", owner, repo, sha),
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }

    async fn graphql(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.record("graphql", vec![query.to_string()], Some(variables));
        let failure = self
            .lock()
            .graphql_errors
            .iter()
            .find(|(marker, _)| query.contains(marker.as_str()))
            .map(|(_, messages)| messages.clone());
        match failure {
            Some(messages) => Err(GatekeeperError::Graphql { messages }),
            None => Ok(serde_json::json!({})),
        }
    }
}
