//! Approve and merge minor/patch dependency bumps opened by Dependabot.

use async_trait::async_trait;
use regex::Regex;

use gatekeeper_github::{graphql, GraphqlFailure, SharedGitHub};
use gatekeeper_types::{AutoMergeState, HandlerResponse, PullRequestContext, Result};

use crate::handler::WebhookHandler;
use crate::semver::{self, UpdateType};

pub const DEPENDABOT_LOGIN: &str = "dependabot[bot]";

const ACCEPTED_ACTIONS: [&str; 3] = ["opened", "reopened", "synchronize"];

// ---------------------------------------------------------------------------
// Decision types
// ---------------------------------------------------------------------------

/// Why a pull request was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    WrongAction,
    NotMergeable,
    AutoMergeNotAllowed,
    NotDependabot,
    UnknownUpdateType,
    MajorUpdate,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::WrongAction => "Wrong action",
            RejectReason::NotMergeable => "PR can't be merged",
            RejectReason::AutoMergeNotAllowed => "Repo does not allow auto merge",
            RejectReason::NotDependabot => "Not a PR from dependabot",
            RejectReason::UnknownUpdateType => "Unable to determine the update type",
            RejectReason::MajorUpdate => "Update is a major version",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// What the handler ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoMergeAction {
    Reject(RejectReason),
    Approve,
    ApproveAndEnableAutoMerge,
    ApproveAndMerge,
}

// ---------------------------------------------------------------------------
// AutoMergeHandler
// ---------------------------------------------------------------------------

pub struct AutoMergeHandler {
    github: SharedGitHub,
    title_pattern: Regex,
    grouped_pattern: Regex,
}

impl AutoMergeHandler {
    pub fn new(github: SharedGitHub) -> Self {
        Self {
            github,
            title_pattern: Regex::new(r"(?i)from ([\w.-]+) to ([\w.-]+)").unwrap(),
            grouped_pattern: Regex::new(r"Updates (.*) from (.*) to (.*)").unwrap(),
        }
    }

    /// Run the guards in order; the first one that fails decides the rejection.
    pub fn decide(&self, pr: &PullRequestContext) -> std::result::Result<UpdateType, RejectReason> {
        let action = pr.action.as_deref().unwrap_or_default();
        if !ACCEPTED_ACTIONS.contains(&action) {
            tracing::info!(action, "Wrong action");
            return Err(RejectReason::WrongAction);
        }

        if pr.mergeable == Some(false) {
            tracing::info!("PR can't be merged");
            return Err(RejectReason::NotMergeable);
        }

        if pr.allow_auto_merge != Some(true) {
            tracing::info!(allow_auto_merge = ?pr.allow_auto_merge, "Repo does not allow auto merge");
            return Err(RejectReason::AutoMergeNotAllowed);
        }

        if pr.author.as_deref() != Some(DEPENDABOT_LOGIN) {
            tracing::info!(author = ?pr.author, "Not a PR from dependabot");
            return Err(RejectReason::NotDependabot);
        }

        let Some(update_type) = self.update_type(pr) else {
            tracing::info!(title = ?pr.title, "Unable to determine the update type");
            return Err(RejectReason::UnknownUpdateType);
        };

        if update_type == UpdateType::Major {
            tracing::info!(title = ?pr.title, "Update is a major version");
            return Err(RejectReason::MajorUpdate);
        }

        Ok(update_type)
    }

    /// Classify the bump from the title, or from the body of a grouped update.
    ///
    /// A grouped update is major as soon as one of its entries is, minor
    /// otherwise. An entry whose versions do not parse makes the whole
    /// group undetermined.
    pub fn update_type(&self, pr: &PullRequestContext) -> Option<UpdateType> {
        if let Some(caps) = pr
            .title
            .as_deref()
            .and_then(|title| self.title_pattern.captures(title))
        {
            return semver::diff(&caps[1], &caps[2]);
        }

        let body = pr.body.as_deref()?;
        let mut entries = 0;
        let mut major = false;
        for caps in self.grouped_pattern.captures_iter(body) {
            entries += 1;
            if semver::diff(caps[2].trim(), caps[3].trim())? == UpdateType::Major {
                major = true;
            }
        }

        match (entries, major) {
            (0, _) => None,
            (_, true) => Some(UpdateType::Major),
            (_, false) => Some(UpdateType::Minor),
        }
    }

    pub async fn evaluate(&self, pr: &PullRequestContext) -> Result<AutoMergeAction> {
        let update_type = match self.decide(pr) {
            Ok(update_type) => update_type,
            Err(reason) => return Ok(AutoMergeAction::Reject(reason)),
        };

        graphql::approve(self.github.as_ref(), &pr.node_id).await?;
        tracing::info!(update = %update_type, "PR approved");

        if pr.auto_merge != AutoMergeState::Disabled {
            return Ok(AutoMergeAction::Approve);
        }

        match graphql::enable_auto_merge(self.github.as_ref(), &pr.node_id).await {
            Ok(()) => {
                tracing::info!("Auto-merge enabled, PR will be merged once checks pass");
                Ok(AutoMergeAction::ApproveAndEnableAutoMerge)
            }
            Err(err) => match GraphqlFailure::classify(&err) {
                GraphqlFailure::CleanStatus => {
                    graphql::merge(self.github.as_ref(), &pr.node_id).await?;
                    tracing::info!("PR already in clean status, merged");
                    Ok(AutoMergeAction::ApproveAndMerge)
                }
                GraphqlFailure::Other => Err(err),
            },
        }
    }
}

#[async_trait]
impl WebhookHandler for AutoMergeHandler {
    fn name(&self) -> &str {
        "auto-merge"
    }

    async fn handle(&self, pr: &PullRequestContext) -> Result<HandlerResponse> {
        match self.evaluate(pr).await? {
            AutoMergeAction::Reject(reason) => Ok(HandlerResponse::processed(reason.message())),
            _ => Ok(HandlerResponse::processed("All done!")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gatekeeper_github::testing::MockGitHub;
    use gatekeeper_github::graphql::{APPROVE_PULL_REQUEST, ENABLE_AUTO_MERGE, MERGE_PULL_REQUEST};
    use gatekeeper_types::GatekeeperError;

    fn dependabot_pr() -> PullRequestContext {
        PullRequestContext {
            owner: "foo".into(),
            repo: "bar".into(),
            full_name: "foo/bar".into(),
            number: 42,
            node_id: "PR_kwDOAbc123".into(),
            action: Some("opened".into()),
            title: Some(
                "build(deps-dev): bump @storybook/addon-essentials from 6.5.12 to 6.5.13".into(),
            ),
            body: Some(String::new()),
            head_sha: "ee55a1223ce20c3e7cb776349cb7f8efb7b88511".into(),
            base_sha: "1e55a1223ce20c3e7cb776349cb7f8efb7b8851e".into(),
            labels: vec![],
            author: Some(DEPENDABOT_LOGIN.into()),
            mergeable: Some(true),
            auto_merge: AutoMergeState::Disabled,
            allow_auto_merge: Some(true),
        }
    }

    fn handler(github: &Arc<MockGitHub>) -> AutoMergeHandler {
        AutoMergeHandler::new(github.clone())
    }

    #[test]
    fn guards_run_in_order() {
        let h = handler(&Arc::new(MockGitHub::new()));

        let mut pr = dependabot_pr();
        pr.action = Some("closed".into());
        pr.author = Some("octocat".into());
        assert_eq!(h.decide(&pr), Err(RejectReason::WrongAction));

        let mut pr = dependabot_pr();
        pr.mergeable = Some(false);
        pr.allow_auto_merge = None;
        assert_eq!(h.decide(&pr), Err(RejectReason::NotMergeable));

        let mut pr = dependabot_pr();
        pr.allow_auto_merge = Some(false);
        assert_eq!(h.decide(&pr), Err(RejectReason::AutoMergeNotAllowed));

        let mut pr = dependabot_pr();
        pr.author = Some("octocat".into());
        assert_eq!(h.decide(&pr), Err(RejectReason::NotDependabot));
    }

    #[test]
    fn unknown_mergeable_state_passes() {
        let h = handler(&Arc::new(MockGitHub::new()));
        let mut pr = dependabot_pr();
        pr.mergeable = None;
        assert_eq!(h.decide(&pr), Ok(UpdateType::Patch));
    }

    #[test]
    fn missing_action_is_wrong_action() {
        let h = handler(&Arc::new(MockGitHub::new()));
        let mut pr = dependabot_pr();
        pr.action = None;
        assert_eq!(h.decide(&pr), Err(RejectReason::WrongAction));
    }

    #[test]
    fn major_title_is_rejected() {
        let h = handler(&Arc::new(MockGitHub::new()));
        let mut pr = dependabot_pr();
        pr.title =
            Some("build(deps-dev): bump @storybook/addon-essentials from 6.5.12 to 7.5.13".into());
        assert_eq!(h.decide(&pr), Err(RejectReason::MajorUpdate));
    }

    #[tokio::test]
    async fn prerelease_to_major_release_is_rejected() {
        let github = Arc::new(MockGitHub::new());
        let mut pr = dependabot_pr();
        pr.title = Some("Bump foo from 1.0.0-beta.1 to 1.0.0".into());

        assert_eq!(handler(&github).decide(&pr), Err(RejectReason::MajorUpdate));
        let resp = handler(&github).handle(&pr).await.unwrap();
        assert_eq!(resp, HandlerResponse::processed("Update is a major version"));
        assert!(github.calls().is_empty());
    }

    #[tokio::test]
    async fn bump_to_major_prerelease_proceeds() {
        let github = Arc::new(MockGitHub::new());
        let mut pr = dependabot_pr();
        pr.title = Some("Bump foo from 1.2.3 to 2.0.0-rc.1".into());

        assert_eq!(handler(&github).decide(&pr), Ok(UpdateType::Premajor));
        let action = handler(&github).evaluate(&pr).await.unwrap();
        assert_eq!(action, AutoMergeAction::ApproveAndEnableAutoMerge);
    }

    #[test]
    fn title_match_is_case_insensitive() {
        let h = handler(&Arc::new(MockGitHub::new()));
        let mut pr = dependabot_pr();
        pr.title = Some("Bump lodash FROM 4.17.20 TO 4.18.0".into());
        assert_eq!(h.update_type(&pr), Some(UpdateType::Minor));
    }

    #[test]
    fn grouped_update_without_major_is_minor() {
        let h = handler(&Arc::new(MockGitHub::new()));
        let mut pr = dependabot_pr();
        pr.title = Some("build(deps): bump the storybook group with 2 updates".into());
        pr.body = Some(
            "Bumps the storybook group with 2 updates.\n\
             Updates `@storybook/addon-essentials` from 6.5.12 to 6.5.13\n\
             Updates `@storybook/react` from 6.5.12 to 6.6.0\n"
                .into(),
        );
        assert_eq!(h.update_type(&pr), Some(UpdateType::Minor));
    }

    #[test]
    fn grouped_update_with_one_major_is_major() {
        let h = handler(&Arc::new(MockGitHub::new()));
        let mut pr = dependabot_pr();
        pr.title = Some("build(deps): bump the storybook group with 2 updates".into());
        pr.body = Some(
            "Updates `@storybook/addon-essentials` from 6.5.12 to 6.5.13\n\
             Updates `@storybook/react` from 6.5.12 to 7.0.0\n"
                .into(),
        );
        assert_eq!(h.decide(&pr), Err(RejectReason::MajorUpdate));
    }

    #[test]
    fn undetermined_update_type() {
        let h = handler(&Arc::new(MockGitHub::new()));

        let mut pr = dependabot_pr();
        pr.title = Some("Bump everything".into());
        pr.body = Some("Nothing to see here".into());
        assert_eq!(h.decide(&pr), Err(RejectReason::UnknownUpdateType));

        pr.body = None;
        assert_eq!(h.decide(&pr), Err(RejectReason::UnknownUpdateType));

        pr.title = Some("bump foo from latest to 1.0.0".into());
        assert_eq!(h.decide(&pr), Err(RejectReason::UnknownUpdateType));
    }

    #[tokio::test]
    async fn approves_then_enables_auto_merge() {
        let github = Arc::new(MockGitHub::new());
        let action = handler(&github).evaluate(&dependabot_pr()).await.unwrap();

        assert_eq!(action, AutoMergeAction::ApproveAndEnableAutoMerge);
        assert_eq!(
            github.graphql_queries(),
            vec![APPROVE_PULL_REQUEST.to_string(), ENABLE_AUTO_MERGE.to_string()]
        );
        let calls = github.calls_to("graphql");
        assert_eq!(
            calls[0].payload,
            Some(serde_json::json!({ "pullRequestId": "PR_kwDOAbc123" }))
        );
    }

    #[tokio::test]
    async fn configured_auto_merge_only_approves() {
        let github = Arc::new(MockGitHub::new());
        let mut pr = dependabot_pr();
        pr.auto_merge = AutoMergeState::Configured(serde_json::json!({ "merge_method": "squash" }));

        let action = handler(&github).evaluate(&pr).await.unwrap();

        assert_eq!(action, AutoMergeAction::Approve);
        assert_eq!(github.graphql_queries(), vec![APPROVE_PULL_REQUEST.to_string()]);
    }

    #[tokio::test]
    async fn absent_auto_merge_only_approves() {
        let github = Arc::new(MockGitHub::new());
        let mut pr = dependabot_pr();
        pr.auto_merge = AutoMergeState::Absent;

        let action = handler(&github).evaluate(&pr).await.unwrap();
        assert_eq!(action, AutoMergeAction::Approve);
    }

    #[tokio::test]
    async fn clean_status_falls_back_to_merge() {
        let github = Arc::new(MockGitHub::new().failing_graphql(
            "enablePullRequestAutoMerge",
            &["Pull request Pull request is in clean status"],
        ));

        let action = handler(&github).evaluate(&dependabot_pr()).await.unwrap();

        assert_eq!(action, AutoMergeAction::ApproveAndMerge);
        assert_eq!(
            github.graphql_queries(),
            vec![
                APPROVE_PULL_REQUEST.to_string(),
                ENABLE_AUTO_MERGE.to_string(),
                MERGE_PULL_REQUEST.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn other_graphql_errors_propagate() {
        let github = Arc::new(
            MockGitHub::new().failing_graphql("enablePullRequestAutoMerge", &["Something bad"]),
        );

        let err = handler(&github).evaluate(&dependabot_pr()).await.unwrap_err();

        assert!(matches!(err, GatekeeperError::Graphql { .. }));
        assert_eq!(github.graphql_queries().len(), 2);
    }

    #[tokio::test]
    async fn approval_failure_stops_everything() {
        let github = Arc::new(
            MockGitHub::new().failing_graphql("addPullRequestReview", &["Forbidden"]),
        );

        let err = handler(&github).evaluate(&dependabot_pr()).await.unwrap_err();

        assert!(matches!(err, GatekeeperError::Graphql { .. }));
        assert_eq!(github.graphql_queries(), vec![APPROVE_PULL_REQUEST.to_string()]);
    }

    #[tokio::test]
    async fn rejection_makes_no_calls() {
        let github = Arc::new(MockGitHub::new());
        let mut pr = dependabot_pr();
        pr.author = Some("octocat".into());

        let resp = handler(&github).handle(&pr).await.unwrap();

        assert_eq!(resp, HandlerResponse::processed("Not a PR from dependabot"));
        assert!(github.calls().is_empty());
    }

    #[tokio::test]
    async fn success_response() {
        let github = Arc::new(MockGitHub::new());
        let resp = handler(&github).handle(&dependabot_pr()).await.unwrap();
        assert_eq!(resp, HandlerResponse::processed("All done!"));
    }
}
