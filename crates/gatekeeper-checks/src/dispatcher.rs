//! Entry point for one webhook delivery: content-type gate, parsing,
//! validation, then the named handler.

use std::path::Path;

use tracing::Instrument;
use uuid::Uuid;

use gatekeeper_github::SharedGitHub;
use gatekeeper_types::{GatekeeperConfig, GatekeeperError, HandlerResponse, Result, WebhookEvent};

use crate::handler::{default_registry, HandlerRegistry};
use crate::webhook::{self, ValidationOutcome};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const WRONG_CONTENT_TYPE: &str = "Please choose \"application/json\" as Content type in the webhook definition (you should re-create it)";

// ---------------------------------------------------------------------------
// InboundEvent
// ---------------------------------------------------------------------------

/// The raw delivery as the hosting layer received it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundEvent {
    pub content_type: Option<String>,
    pub body: String,
}

impl InboundEvent {
    pub fn new(content_type: Option<String>, body: impl Into<String>) -> Self {
        Self {
            content_type,
            body: body.into(),
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::new(Some("application/json".into()), body)
    }

    /// Read a recorded delivery body from disk.
    pub fn from_file(path: &Path, content_type: Option<String>) -> Result<Self> {
        let body = std::fs::read_to_string(path)?;
        Ok(Self::new(content_type, body))
    }

    fn is_form_encoded(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE))
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn from_config(config: &GatekeeperConfig, github: SharedGitHub) -> Self {
        Self::new(default_registry(config, github))
    }

    pub fn handler_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.registry.has(name)
    }

    /// Process one delivery.
    ///
    /// Request-level problems (wrong content type, unparsable body, setup
    /// event without `pull_request`, non-PR event) are answered with a
    /// response. Only an unknown handler or a fatal failure inside a handler
    /// is returned as an error.
    pub async fn dispatch(&self, handler_name: &str, event: &InboundEvent) -> Result<HandlerResponse> {
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!("invocation", id = %invocation_id, handler = handler_name);
        self.dispatch_inner(handler_name, event).instrument(span).await
    }

    async fn dispatch_inner(&self, handler_name: &str, event: &InboundEvent) -> Result<HandlerResponse> {
        let handler = self
            .registry
            .get(handler_name)
            .ok_or_else(|| GatekeeperError::UnknownHandler(handler_name.to_string()))?;

        if event.is_form_encoded() {
            tracing::warn!("Webhook delivered as form data");
            return Ok(HandlerResponse::error(WRONG_CONTENT_TYPE));
        }

        let outcome = WebhookEvent::parse(&event.body).and_then(webhook::validate);
        match outcome {
            Ok(ValidationOutcome::Setup { greeting }) => {
                tracing::info!("{}", greeting);
                Ok(HandlerResponse::ok(greeting))
            }
            Ok(ValidationOutcome::PullRequest(pr)) => {
                tracing::info!("Working on repo {} for PR #{}", pr.full_name, pr.number);
                let response = handler.handle(&pr).await?;
                tracing::info!(status = response.status_code, body = %response.body, "Handled");
                Ok(response)
            }
            Err(err) => match HandlerResponse::from_rejection(&err) {
                Some(response) => {
                    tracing::warn!(error = %err, "Rejected delivery");
                    Ok(response)
                }
                None => Err(err),
            },
        }
    }
}
