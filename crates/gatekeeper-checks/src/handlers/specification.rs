use async_trait::async_trait;

use gatekeeper_types::{status_context, PolicyResult, PullRequestContext, Result};

use crate::handler::PolicyCheck;

const CHECK_NAME: &str = "PR Specification";

/// Requires a minimal title and description length.
pub struct SpecificationCheck {
    title_min_length: usize,
    body_min_length: usize,
    context: String,
}

impl SpecificationCheck {
    pub fn new(title_min_length: usize, body_min_length: usize, namespace: &str) -> Self {
        Self {
            title_min_length,
            body_min_length,
            context: status_context(namespace, CHECK_NAME),
        }
    }
}

fn too_short(text: Option<&str>, min: usize) -> bool {
    match text {
        None | Some("") => true,
        Some(t) => t.chars().count() < min,
    }
}

#[async_trait]
impl PolicyCheck for SpecificationCheck {
    fn name(&self) -> &str {
        "specification"
    }

    async fn evaluate(&self, pr: &PullRequestContext) -> Result<PolicyResult> {
        let mut result = PolicyResult::success(&self.context, "All good!");

        if too_short(pr.title.as_deref(), self.title_min_length) {
            tracing::info!("Fail: title too short");
            result = PolicyResult::failure(&self.context, "Title is too short.");
        }

        // Checked last so its description wins.
        if too_short(pr.body.as_deref(), self.body_min_length) {
            tracing::info!("Fail: body too short");
            result = PolicyResult::failure(&self.context, "PR description is too short.");
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::fixtures::pull_request;

    fn check() -> SpecificationCheck {
        SpecificationCheck::new(8, 8, "20 Minutes")
    }

    #[tokio::test]
    async fn long_enough_passes() {
        let result = check().evaluate(&pull_request()).await.unwrap();
        assert_eq!(
            result,
            PolicyResult::success("20 Minutes - PR Specification", "All good!")
        );
    }

    #[tokio::test]
    async fn short_title_fails() {
        let mut pr = pull_request();
        pr.title = Some("Update".into());

        let result = check().evaluate(&pr).await.unwrap();
        assert_eq!(
            result,
            PolicyResult::failure("20 Minutes - PR Specification", "Title is too short.")
        );
    }

    #[tokio::test]
    async fn body_description_wins() {
        let mut pr = pull_request();
        pr.title = None;
        pr.body = Some("Short".into());

        let result = check().evaluate(&pr).await.unwrap();
        assert_eq!(result.description, "PR description is too short.");
    }

    #[tokio::test]
    async fn missing_body_fails() {
        let mut pr = pull_request();
        pr.body = None;

        let result = check().evaluate(&pr).await.unwrap();
        assert_eq!(result.description, "PR description is too short.");
    }

    #[tokio::test]
    async fn lengths_count_characters() {
        let mut pr = pull_request();
        // 8 characters, 16 bytes
        pr.title = Some("éééééééé".into());

        let result = check().evaluate(&pr).await.unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn configured_thresholds_apply() {
        let mut pr = pull_request();
        pr.title = Some("Fix".into());
        pr.body = Some("Ok".into());

        let result = SpecificationCheck::new(3, 2, "")
            .evaluate(&pr)
            .await
            .unwrap();
        assert!(result.is_success());
        assert_eq!(result.context, " - PR Specification");
    }
}
