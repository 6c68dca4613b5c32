//! Shared types, errors, and configuration for the Gatekeeper webhook handlers.
//!
//! This crate provides the foundational types used across all other Gatekeeper crates:
//! - `GatekeeperError`: unified error taxonomy
//! - `WebhookEvent` / `PullRequestContext`: the inbound payload and its validated view
//! - `PolicyResult`: the commit status every policy check produces
//! - `HandlerResponse`: the `{statusCode, body}` answer returned to the caller
//! - `GatekeeperConfig`: configuration built once at startup

pub mod config;
pub mod event;

pub use config::{parse_block_labels, GatekeeperConfig, DEFAULT_API_BASE_URL};
pub use event::{
    Account, AutoMergeState, BaseBranch, BaseRepository, GitRef, Hook, Label, PullRequest,
    PullRequestContext, PullRequestEvent, Repository, SetupEvent, WebhookEvent,
};

use serde::{Deserialize, Serialize};

/// Unified error type for all Gatekeeper subsystems.
#[derive(Debug, thiserror::Error)]
pub enum GatekeeperError {
    // === Request Errors ===
    #[error("{0}")]
    MalformedRequest(String),

    #[error("This webhook needs the \"{event}\" event. Please tick it.")]
    MissingWebhookEvent { event: String },

    #[error("Event is not a Pull Request")]
    NotAPullRequest,

    #[error("No handler registered for '{0}'")]
    UnknownHandler(String),

    // === Configuration Errors ===
    #[error("Invalid configuration for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    // === GitHub Errors ===
    #[error("GitHub API {endpoint} returned HTTP {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("GraphQL request failed: {}", .messages.join("; "))]
    Graphql { messages: Vec<String> },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GatekeeperError {
    /// Returns `true` for errors caused by the inbound request itself. These are
    /// answered directly to the webhook sender instead of being treated as failures
    /// of the invocation.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GatekeeperError::MalformedRequest(_)
                | GatekeeperError::MissingWebhookEvent { .. }
                | GatekeeperError::NotAPullRequest
        )
    }

    /// Maps the error to an HTTP status code for server mode.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            GatekeeperError::MalformedRequest(_)
            | GatekeeperError::MissingWebhookEvent { .. }
            | GatekeeperError::NotAPullRequest => Some(500),
            GatekeeperError::UnknownHandler(_) => Some(404),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, GatekeeperError>`.
pub type Result<T> = std::result::Result<T, GatekeeperError>;

// ---------------------------------------------------------------------------
// CommitState / PolicyResult: what a policy check reports back to GitHub
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    Success,
    Failure,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitState::Success => "success",
            CommitState::Failure => "failure",
        }
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The commit status payload produced by every policy check.
///
/// `context` is namespaced as `"<namespace> - <check name>"` so several
/// Gatekeeper checks can coexist on the same commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub state: CommitState,
    pub description: String,
    pub context: String,
}

impl PolicyResult {
    /// Create a passing result.
    pub fn success(context: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            state: CommitState::Success,
            description: description.into(),
            context: context.into(),
        }
    }

    /// Create a failing result.
    pub fn failure(context: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            state: CommitState::Failure,
            description: description.into(),
            context: context.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == CommitState::Success
    }
}

/// Build a namespaced status context, e.g. `"Acme - Fixup check"`.
pub fn status_context(namespace: &str, check: &str) -> String {
    format!("{} - {}", namespace, check)
}

// ---------------------------------------------------------------------------
// HandlerResponse: `{statusCode, body}` answer for the hosting layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    /// `200 OK` with a message.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// `204`: the webhook was processed; GitHub ignores the body but we keep it for logs.
    pub fn processed(body: impl Into<String>) -> Self {
        Self::new(204, body)
    }

    /// `500` with a human-readable reason.
    pub fn error(body: impl Into<String>) -> Self {
        Self::new(500, body)
    }

    /// Answer a request-level error. Returns `None` for errors that are not rejections.
    pub fn from_rejection(err: &GatekeeperError) -> Option<Self> {
        if !err.is_rejection() {
            return None;
        }
        Some(Self::new(err.http_status().unwrap_or(500), err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_missing_webhook_event() {
        let err = GatekeeperError::MissingWebhookEvent {
            event: "pull_request".into(),
        };
        assert_eq!(
            err.to_string(),
            "This webhook needs the \"pull_request\" event. Please tick it."
        );
    }

    #[test]
    fn error_display_not_a_pull_request() {
        assert_eq!(
            GatekeeperError::NotAPullRequest.to_string(),
            "Event is not a Pull Request"
        );
    }

    #[test]
    fn error_display_api() {
        let err = GatekeeperError::Api {
            endpoint: "POST /repos/foo/bar/statuses/abc".into(),
            status: 422,
            message: "Validation Failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "GitHub API POST /repos/foo/bar/statuses/abc returned HTTP 422: Validation Failed"
        );
    }

    #[test]
    fn error_display_graphql_joins_messages() {
        let err = GatekeeperError::Graphql {
            messages: vec!["first".into(), "second".into()],
        };
        assert_eq!(err.to_string(), "GraphQL request failed: first; second");
    }

    #[test]
    fn error_display_invalid_config() {
        let err = GatekeeperError::InvalidConfig {
            key: "ARTIFACTS_REGEX".into(),
            message: "unclosed group".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration for ARTIFACTS_REGEX: unclosed group"
        );
    }

    // --- is_rejection / http_status ---

    #[test]
    fn request_errors_are_rejections() {
        assert!(GatekeeperError::MalformedRequest("bad".into()).is_rejection());
        assert!(GatekeeperError::NotAPullRequest.is_rejection());
        assert!(GatekeeperError::MissingWebhookEvent {
            event: "pull_request".into()
        }
        .is_rejection());
    }

    #[test]
    fn transport_errors_are_not_rejections() {
        let err = GatekeeperError::Graphql {
            messages: vec!["boom".into()],
        };
        assert!(!err.is_rejection());
        assert_eq!(err.http_status(), None);
    }

    #[test]
    fn http_status_rejections_are_500() {
        assert_eq!(GatekeeperError::NotAPullRequest.http_status(), Some(500));
        assert_eq!(
            GatekeeperError::MalformedRequest("x".into()).http_status(),
            Some(500)
        );
    }

    #[test]
    fn http_status_unknown_handler_404() {
        let err = GatekeeperError::UnknownHandler("nope".into());
        assert_eq!(err.http_status(), Some(404));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: GatekeeperError = json_err.into();
        assert!(matches!(err, GatekeeperError::Json(_)));
    }

    // --- CommitState / PolicyResult ---

    #[test]
    fn commit_state_serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&CommitState::Success).unwrap(),
            "\"success\""
        );
        assert_eq!(
            serde_json::to_string(&CommitState::Failure).unwrap(),
            "\"failure\""
        );
    }

    #[test]
    fn policy_result_serializes_as_status_payload() {
        let result = PolicyResult::failure("Acme - Fixup check", "nope");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({
                "state": "failure",
                "description": "nope",
                "context": "Acme - Fixup check",
            })
        );
        assert!(!result.is_success());
    }

    #[test]
    fn status_context_is_namespaced() {
        assert_eq!(status_context("20 Minutes", "PR Specification"), "20 Minutes - PR Specification");
    }

    // --- HandlerResponse ---

    #[test]
    fn handler_response_uses_camel_case() {
        let resp = HandlerResponse::processed("All done!");
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            serde_json::json!({ "statusCode": 204, "body": "All done!" })
        );
    }

    #[test]
    fn handler_response_from_rejection() {
        let resp = HandlerResponse::from_rejection(&GatekeeperError::NotAPullRequest).unwrap();
        assert_eq!(resp, HandlerResponse::error("Event is not a Pull Request"));

        let fatal = GatekeeperError::Other("boom".into());
        assert!(HandlerResponse::from_rejection(&fatal).is_none());
    }
}
