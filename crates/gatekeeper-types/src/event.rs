//! GitHub webhook payload model and the validated pull-request view.
//!
//! Only the fields the checks read are modelled. Everything else in the
//! payload is ignored by serde.

use serde::{Deserialize, Deserializer};

use crate::{GatekeeperError, Result};

// ---------------------------------------------------------------------------
// Shared payload pieces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub owner: Account,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GitRef {
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BaseRepository {
    #[serde(default)]
    pub allow_auto_merge: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BaseBranch {
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub repo: Option<BaseRepository>,
}

/// State of `pull_request.auto_merge`.
///
/// GitHub sends `null` when auto-merge is off and an object when it is
/// configured. A payload without the key at all is neither.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AutoMergeState {
    #[default]
    Absent,
    Disabled,
    Configured(serde_json::Value),
}

impl<'de> Deserialize<'de> for AutoMergeState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Null => AutoMergeState::Disabled,
            other => AutoMergeState::Configured(other),
        })
    }
}

// ---------------------------------------------------------------------------
// Setup ("ping") event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Hook {
    #[serde(default)]
    pub events: Vec<String>,
}

/// Sent by GitHub when a webhook is created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetupEvent {
    pub hook: Hook,
    #[serde(default)]
    pub sender: Account,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub organization: Option<Account>,
}

// ---------------------------------------------------------------------------
// Pull request event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub head: GitRef,
    #[serde(default)]
    pub base: BaseBranch,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub user: Option<Account>,
    #[serde(default)]
    pub mergeable: Option<bool>,
    #[serde(default)]
    pub auto_merge: AutoMergeState,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequestEvent {
    #[serde(default)]
    pub action: Option<String>,
    pub pull_request: PullRequest,
    #[serde(default)]
    pub repository: Repository,
}

// ---------------------------------------------------------------------------
// WebhookEvent: the raw inbound payload, classified once
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    /// Payload carrying a `hook` field.
    Setup(SetupEvent),
    /// Payload carrying a `pull_request` field.
    PullRequest(Box<PullRequestEvent>),
    /// Anything else GitHub may deliver (push, issues, ...).
    Other(serde_json::Value),
}

impl WebhookEvent {
    /// Parse a raw JSON body.
    pub fn parse(body: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
            GatekeeperError::MalformedRequest(format!("Unable to parse the event body: {e}"))
        })?;
        Self::from_value(value)
    }

    /// Classify an already-decoded payload by the keys it carries.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let has_key = |key: &str| value.as_object().is_some_and(|o| o.contains_key(key));

        if has_key("hook") {
            let setup = serde_json::from_value(value).map_err(|e| {
                GatekeeperError::MalformedRequest(format!("Invalid webhook setup event: {e}"))
            })?;
            return Ok(WebhookEvent::Setup(setup));
        }

        if has_key("pull_request") {
            let event = serde_json::from_value(value).map_err(|e| {
                GatekeeperError::MalformedRequest(format!("Invalid pull request event: {e}"))
            })?;
            return Ok(WebhookEvent::PullRequest(Box::new(event)));
        }

        Ok(WebhookEvent::Other(value))
    }
}

// ---------------------------------------------------------------------------
// PullRequestContext: read-only projection the checks work on
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    pub full_name: String,
    pub number: u64,
    pub node_id: String,
    pub action: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub head_sha: String,
    pub base_sha: String,
    pub labels: Vec<String>,
    pub author: Option<String>,
    pub mergeable: Option<bool>,
    pub auto_merge: AutoMergeState,
    pub allow_auto_merge: Option<bool>,
}

impl From<PullRequestEvent> for PullRequestContext {
    fn from(event: PullRequestEvent) -> Self {
        let PullRequestEvent {
            action,
            pull_request: pr,
            repository,
        } = event;

        Self {
            owner: repository.owner.login,
            repo: repository.name,
            full_name: repository.full_name,
            number: pr.number,
            node_id: pr.node_id,
            action,
            title: pr.title,
            body: pr.body,
            head_sha: pr.head.sha,
            base_sha: pr.base.sha,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            author: pr.user.map(|u| u.login),
            mergeable: pr.mergeable,
            auto_merge: pr.auto_merge,
            allow_auto_merge: pr.base.repo.and_then(|r| r.allow_auto_merge),
        }
    }
}
