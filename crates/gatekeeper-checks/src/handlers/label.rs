use async_trait::async_trait;

use gatekeeper_types::{status_context, PolicyResult, PullRequestContext, Result};

use crate::handler::PolicyCheck;

const CHECK_NAME: &str = "Label validation";

/// Blocks pull requests carrying any of the configured labels.
///
/// With a non-empty block list, a pull request without any label fails too.
pub struct LabelCheck {
    block_labels: Vec<String>,
    context: String,
}

impl LabelCheck {
    pub fn new(block_labels: Vec<String>, namespace: &str) -> Self {
        Self {
            block_labels,
            context: status_context(namespace, CHECK_NAME),
        }
    }

    fn pass(&self) -> PolicyResult {
        PolicyResult::success(&self.context, "Label validation passed")
    }

    fn fail(&self) -> PolicyResult {
        PolicyResult::failure(&self.context, "Label validation failed")
    }
}

#[async_trait]
impl PolicyCheck for LabelCheck {
    fn name(&self) -> &str {
        "label"
    }

    async fn evaluate(&self, pr: &PullRequestContext) -> Result<PolicyResult> {
        if self.block_labels.is_empty() {
            tracing::info!("Success: no blocked labels defined");
            return Ok(self.pass());
        }

        if pr.labels.is_empty() {
            tracing::info!("Fail: no labels defined in the PR");
            return Ok(self.fail());
        }

        match pr.labels.iter().find(|l| self.block_labels.contains(l)) {
            Some(label) => {
                tracing::info!(label = %label, "Fail: blocked label found");
                Ok(self.fail())
            }
            None => Ok(self.pass()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::fixtures::pull_request;
    use gatekeeper_types::{parse_block_labels, CommitState};

    fn check(block: &str) -> LabelCheck {
        LabelCheck::new(parse_block_labels(block), "20 Minutes")
    }

    #[tokio::test]
    async fn empty_block_list_passes() {
        let mut pr = pull_request();
        pr.labels = vec!["wip".into()];

        let result = check(" , ").evaluate(&pr).await.unwrap();

        assert_eq!(
            result,
            PolicyResult::success("20 Minutes - Label validation", "Label validation passed")
        );
    }

    #[tokio::test]
    async fn unlabelled_pr_fails_when_blocking() {
        let result = check("wip").evaluate(&pull_request()).await.unwrap();
        assert_eq!(
            result,
            PolicyResult::failure("20 Minutes - Label validation", "Label validation failed")
        );
    }

    #[tokio::test]
    async fn blocked_label_fails() {
        let mut pr = pull_request();
        pr.labels = vec!["ready".into(), "wip".into()];

        let result = check("wip, do not merge").evaluate(&pr).await.unwrap();
        assert_eq!(result.state, CommitState::Failure);
    }

    #[tokio::test]
    async fn matching_is_exact_and_case_sensitive() {
        let mut pr = pull_request();
        pr.labels = vec!["WIP".into(), "wip-ish".into()];

        let result = check("wip").evaluate(&pr).await.unwrap();
        assert_eq!(result.state, CommitState::Success);
    }
}
