//! Pull request policy checks driven by GitHub webhooks.
//!
//! Each delivery goes through the [`Dispatcher`], which rejects form-encoded
//! bodies, classifies the payload with [`webhook::validate`] and hands the
//! resulting pull request to the named [`WebhookHandler`]. Status checks
//! (artifacts, fixup, label, specification) report a commit status through
//! the [`StatusReporter`]; the auto-merge handler approves and merges
//! Dependabot bumps.

pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod reporter;
pub mod semver;
pub mod webhook;

pub use dispatcher::{Dispatcher, InboundEvent};
pub use handler::{
    default_registry, DynHandler, HandlerRegistry, PolicyCheck, StatusCheckHandler,
    WebhookHandler,
};
pub use reporter::StatusReporter;
pub use webhook::{validate, ValidationOutcome};
