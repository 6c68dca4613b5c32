//! Posts policy results back to GitHub as commit statuses.

use gatekeeper_github::SharedGitHub;
use gatekeeper_types::{HandlerResponse, PolicyResult, PullRequestContext};

/// Best-effort status poster: one attempt, no retry, never fails the invocation.
#[derive(Clone)]
pub struct StatusReporter {
    github: SharedGitHub,
}

impl StatusReporter {
    pub fn new(github: SharedGitHub) -> Self {
        Self { github }
    }

    pub async fn report(&self, pr: &PullRequestContext, result: &PolicyResult) -> HandlerResponse {
        match self
            .github
            .create_commit_status(&pr.owner, &pr.repo, &pr.head_sha, result)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    repo = %pr.full_name,
                    pr = pr.number,
                    sha = %pr.head_sha,
                    context = %result.context,
                    state = %result.state,
                    "Commit status posted"
                );
                HandlerResponse::processed(format!(
                    "Process finished with state: {}",
                    result.state
                ))
            }
            Err(e) => {
                tracing::warn!(
                    repo = %pr.full_name,
                    pr = pr.number,
                    error = %e,
                    "Failed to post commit status"
                );
                HandlerResponse::error(format!("Process finished with error: {}", e))
            }
        }
    }
}
