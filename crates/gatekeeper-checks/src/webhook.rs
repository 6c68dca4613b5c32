//! Classification of inbound webhook payloads.
//!
//! A setup payload is answered with a greeting, a pull-request payload is
//! projected into a [`PullRequestContext`], anything else is rejected.

use gatekeeper_types::{
    GatekeeperError, PullRequestContext, Result, SetupEvent, WebhookEvent,
};

/// The event every Gatekeeper webhook must subscribe to.
pub const REQUIRED_EVENT: &str = "pull_request";

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The webhook was just created; answer with this greeting.
    Setup { greeting: String },
    PullRequest(Box<PullRequestContext>),
}

pub fn validate(event: WebhookEvent) -> Result<ValidationOutcome> {
    match event {
        WebhookEvent::Setup(setup) => Ok(ValidationOutcome::Setup {
            greeting: greeting(&setup)?,
        }),
        WebhookEvent::PullRequest(event) => Ok(ValidationOutcome::PullRequest(Box::new(
            PullRequestContext::from(*event),
        ))),
        WebhookEvent::Other(_) => Err(GatekeeperError::NotAPullRequest),
    }
}

/// Greeting for a freshly installed webhook. The organization wins when both
/// an organization and a repository are present.
pub fn greeting(setup: &SetupEvent) -> Result<String> {
    if !setup.hook.events.iter().any(|e| e == REQUIRED_EVENT) {
        return Err(GatekeeperError::MissingWebhookEvent {
            event: REQUIRED_EVENT.to_string(),
        });
    }

    let sender = &setup.sender.login;
    match (&setup.organization, &setup.repository) {
        (Some(org), _) => Ok(format!(
            "Hello {}, the webhook is now enabled for the organization {}, enjoy!",
            sender, org.login
        )),
        (None, Some(repo)) => Ok(format!(
            "Hello {}, the webhook is now enabled for {}, enjoy!",
            sender, repo.full_name
        )),
        (None, None) => Err(GatekeeperError::MalformedRequest(
            "Setup event has neither an organization nor a repository".into(),
        )),
    }
}
