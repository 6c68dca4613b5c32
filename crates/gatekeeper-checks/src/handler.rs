//! Handler and policy-check traits, the status-check adapter, and the handler registry.

use std::collections::HashMap;

use async_trait::async_trait;

use gatekeeper_github::SharedGitHub;
use gatekeeper_types::{GatekeeperConfig, HandlerResponse, PolicyResult, PullRequestContext, Result};

use crate::reporter::StatusReporter;

// ---------------------------------------------------------------------------
// WebhookHandler trait
// ---------------------------------------------------------------------------

/// Something that turns a validated pull request into a webhook answer.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// The handler name used for routing (e.g. "fixup", "auto-merge").
    fn name(&self) -> &str;

    async fn handle(&self, pr: &PullRequestContext) -> Result<HandlerResponse>;
}

// ---------------------------------------------------------------------------
// PolicyCheck trait
// ---------------------------------------------------------------------------

/// A check that produces exactly one commit status for a pull request.
#[async_trait]
pub trait PolicyCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn evaluate(&self, pr: &PullRequestContext) -> Result<PolicyResult>;
}

/// Runs a [`PolicyCheck`] and posts its result through a [`StatusReporter`].
pub struct StatusCheckHandler<C> {
    check: C,
    reporter: StatusReporter,
}

impl<C: PolicyCheck> StatusCheckHandler<C> {
    pub fn new(check: C, reporter: StatusReporter) -> Self {
        Self { check, reporter }
    }
}

#[async_trait]
impl<C: PolicyCheck> WebhookHandler for StatusCheckHandler<C> {
    fn name(&self) -> &str {
        self.check.name()
    }

    async fn handle(&self, pr: &PullRequestContext) -> Result<HandlerResponse> {
        let result = self.check.evaluate(pr).await?;
        tracing::info!(
            check = self.check.name(),
            state = %result.state,
            description = %result.description,
            "Policy evaluated"
        );
        Ok(self.reporter.report(pr, &result).await)
    }
}

// ---------------------------------------------------------------------------
// DynHandler: object-safe wrapper
// ---------------------------------------------------------------------------

pub struct DynHandler(Box<dyn WebhookHandler>);

impl DynHandler {
    pub fn new(handler: impl WebhookHandler + 'static) -> Self {
        Self(Box::new(handler))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub async fn handle(&self, pr: &PullRequestContext) -> Result<HandlerResponse> {
        self.0.handle(pr).await
    }
}

// ---------------------------------------------------------------------------
// HandlerRegistry
// ---------------------------------------------------------------------------

pub struct HandlerRegistry {
    handlers: HashMap<String, DynHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, handler: impl WebhookHandler + 'static) {
        let name = handler.name().to_string();
        self.handlers.insert(name, DynHandler::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&DynHandler> {
        self.handlers.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered handler names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Default registry factory
// ---------------------------------------------------------------------------

/// Register every handler the configuration enables.
///
/// The artifacts check needs `ARTIFACTS_REGEX`; without it the route is not
/// registered at all.
pub fn default_registry(config: &GatekeeperConfig, github: SharedGitHub) -> HandlerRegistry {
    use crate::handlers::{
        ArtifactsCheck, AutoMergeHandler, FixupCheck, LabelCheck, SpecificationCheck,
    };

    let reporter = StatusReporter::new(github.clone());
    let mut reg = HandlerRegistry::new();

    match &config.artifacts_pattern {
        Some(pattern) => reg.register(StatusCheckHandler::new(
            ArtifactsCheck::new(github.clone(), pattern.clone(), &config.namespace),
            reporter.clone(),
        )),
        None => tracing::info!("ARTIFACTS_REGEX not set, artifacts check disabled"),
    }

    reg.register(StatusCheckHandler::new(
        FixupCheck::new(github.clone(), &config.namespace),
        reporter.clone(),
    ));
    reg.register(StatusCheckHandler::new(
        LabelCheck::new(config.block_labels.clone(), &config.namespace),
        reporter.clone(),
    ));
    reg.register(StatusCheckHandler::new(
        SpecificationCheck::new(
            config.title_min_length,
            config.body_min_length,
            &config.namespace,
        ),
        reporter,
    ));
    reg.register(AutoMergeHandler::new(github));
    reg
}
