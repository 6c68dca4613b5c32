//! Pull-request GraphQL mutations and the classification of their errors.

use serde_json::json;

use gatekeeper_types::{GatekeeperError, Result};

use crate::GitHubApi;

pub const APPROVE_PULL_REQUEST: &str = r#"
mutation approvePullRequest($pullRequestId: ID!) {
  addPullRequestReview(input: {pullRequestId: $pullRequestId, event: APPROVE}) {
    clientMutationId
  }
}
"#;

pub const ENABLE_AUTO_MERGE: &str = r#"
mutation enableAutoMerge($pullRequestId: ID!) {
  enablePullRequestAutoMerge(input: {pullRequestId: $pullRequestId}) {
    clientMutationId
  }
}
"#;

pub const MERGE_PULL_REQUEST: &str = r#"
mutation mergePullRequest($pullRequestId: ID!) {
  mergePullRequest(input: {pullRequestId: $pullRequestId}) {
    clientMutationId
  }
}
"#;

const CLEAN_STATUS_MARKER: &str = "pull request is in clean status";

/// What a failed auto-merge mutation means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphqlFailure {
    /// The PR already satisfies every requirement, so GitHub refuses to queue
    /// it for auto-merge. It can be merged directly.
    CleanStatus,
    /// Anything else.
    Other,
}

impl GraphqlFailure {
    pub fn classify(err: &GatekeeperError) -> Self {
        match err {
            GatekeeperError::Graphql { messages }
                if messages
                    .iter()
                    .any(|m| m.to_lowercase().contains(CLEAN_STATUS_MARKER)) =>
            {
                GraphqlFailure::CleanStatus
            }
            _ => GraphqlFailure::Other,
        }
    }
}

pub async fn approve(api: &dyn GitHubApi, pull_request_id: &str) -> Result<()> {
    tracing::debug!(pull_request_id, "Submitting approving review");
    api.graphql(APPROVE_PULL_REQUEST, json!({ "pullRequestId": pull_request_id }))
        .await?;
    Ok(())
}

pub async fn enable_auto_merge(api: &dyn GitHubApi, pull_request_id: &str) -> Result<()> {
    tracing::debug!(pull_request_id, "Enabling auto-merge");
    api.graphql(ENABLE_AUTO_MERGE, json!({ "pullRequestId": pull_request_id }))
        .await?;
    Ok(())
}

pub async fn merge(api: &dyn GitHubApi, pull_request_id: &str) -> Result<()> {
    tracing::debug!(pull_request_id, "Merging pull request");
    api.graphql(MERGE_PULL_REQUEST, json!({ "pullRequestId": pull_request_id }))
        .await?;
    Ok(())
}
