//! GitHub collaborator for the Gatekeeper checks.
//!
//! Provides the `GitHubApi` trait the checks depend on, the reqwest-backed
//! `RestClient`, the REST response models, and the pull-request GraphQL
//! mutations together with their error classification. `testing` holds an
//! in-memory client for exercising the checks without the network.

mod api;
mod client;
pub mod graphql;
pub mod testing;
mod types;

pub use api::*;
pub use client::RestClient;
pub use graphql::GraphqlFailure;
pub use types::*;
