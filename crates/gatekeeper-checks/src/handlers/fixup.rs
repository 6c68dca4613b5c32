use async_trait::async_trait;
use regex::Regex;

use gatekeeper_github::SharedGitHub;
use gatekeeper_types::{status_context, PolicyResult, PullRequestContext, Result};

use crate::handler::PolicyCheck;

const CHECK_NAME: &str = "Fixup check";

/// Fails while the branch still carries `fixup!` commits. Merge commits are
/// never inspected.
pub struct FixupCheck {
    github: SharedGitHub,
    pattern: Regex,
    context: String,
}

impl FixupCheck {
    pub fn new(github: SharedGitHub, namespace: &str) -> Self {
        Self {
            github,
            pattern: Regex::new(r"(?im)^fixup! .*$").unwrap(),
            context: status_context(namespace, CHECK_NAME),
        }
    }
}

#[async_trait]
impl PolicyCheck for FixupCheck {
    fn name(&self) -> &str {
        "fixup"
    }

    async fn evaluate(&self, pr: &PullRequestContext) -> Result<PolicyResult> {
        let comparison = self
            .github
            .compare_commits(&pr.owner, &pr.repo, &pr.base_sha, &pr.head_sha)
            .await?;

        let offending = comparison
            .commits
            .iter()
            .find(|c| !c.is_merge() && self.pattern.is_match(c.message()));

        match offending {
            Some(commit) => {
                tracing::info!(sha = %commit.sha, message = %commit.message(), "Fixup commit found");
                Ok(PolicyResult::failure(
                    &self.context,
                    "Fixup commits in history, squash them to merge",
                ))
            }
            None => Ok(PolicyResult::success(
                &self.context,
                "No fixup commits in history",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gatekeeper_github::testing::MockGitHub;
    use gatekeeper_github::ComparedCommit;
    use gatekeeper_types::CommitState;

    use crate::handlers::fixtures::pull_request;

    async fn evaluate(commits: Vec<ComparedCommit>) -> (PolicyResult, Arc<MockGitHub>) {
        let github = Arc::new(MockGitHub::new().with_commits(commits));
        let result = FixupCheck::new(github.clone(), "20 Minutes")
            .evaluate(&pull_request())
            .await
            .unwrap();
        (result, github)
    }

    #[tokio::test]
    async fn clean_history_passes() {
        let (result, github) = evaluate(vec![
            ComparedCommit::new("Add feature", &["a"]),
            ComparedCommit::new("Fix tests\n\nfixup is a word here", &["b"]),
        ])
        .await;

        assert_eq!(
            result,
            PolicyResult::success("20 Minutes - Fixup check", "No fixup commits in history")
        );
        let calls = github.calls_to("compare_commits");
        assert_eq!(
            calls[0].args,
            vec![
                "foo",
                "bar",
                "1e55a1223ce20c3e7cb776349cb7f8efb7b8851e",
                "ee55a1223ce20c3e7cb776349cb7f8efb7b88511"
            ]
        );
    }

    #[tokio::test]
    async fn fixup_commit_fails() {
        let (result, _) = evaluate(vec![
            ComparedCommit::new("Add feature", &["a"]),
            ComparedCommit::new("fixup! Add feature", &["b"]),
        ])
        .await;

        assert_eq!(
            result,
            PolicyResult::failure(
                "20 Minutes - Fixup check",
                "Fixup commits in history, squash them to merge"
            )
        );
    }

    #[tokio::test]
    async fn fixup_on_any_line_case_insensitive() {
        let (result, _) =
            evaluate(vec![ComparedCommit::new("Squashed\nFIXUP! typo", &["a"])]).await;
        assert_eq!(result.state, CommitState::Failure);
    }

    #[tokio::test]
    async fn merge_commits_are_exempt() {
        let (result, _) = evaluate(vec![ComparedCommit::new(
            "fixup! Merge branch 'main'",
            &["a", "b"],
        )])
        .await;
        assert_eq!(result.state, CommitState::Success);
    }

    #[tokio::test]
    async fn empty_comparison_passes() {
        let (result, _) = evaluate(vec![]).await;
        assert!(result.is_success());
    }
}
