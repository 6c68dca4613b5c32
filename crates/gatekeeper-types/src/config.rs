//! Configuration, built once at process start and passed by reference.

use regex::Regex;

use crate::{status_context, GatekeeperError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_TITLE_MIN_LENGTH: usize = 8;
const DEFAULT_BODY_MIN_LENGTH: usize = 8;

#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    pub github_token: String,
    pub api_base_url: String,
    /// Brand prefix used in every commit status context.
    pub namespace: String,
    pub artifacts_pattern: Option<Regex>,
    pub block_labels: Vec<String>,
    pub title_min_length: usize,
    pub body_min_length: usize,
}

impl GatekeeperConfig {
    pub fn new(github_token: impl Into<String>) -> Self {
        Self {
            github_token: github_token.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            namespace: String::new(),
            artifacts_pattern: None,
            block_labels: Vec::new(),
            title_min_length: DEFAULT_TITLE_MIN_LENGTH,
            body_min_length: DEFAULT_BODY_MIN_LENGTH,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    ///
    /// Empty values are treated as unset. `GITHUB_TOKEN` is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("GITHUB_TOKEN").ok_or_else(|| GatekeeperError::InvalidConfig {
            key: "GITHUB_TOKEN".into(),
            message: "a GitHub token is required".into(),
        })?;

        let mut config = Self::new(token);

        if let Some(url) = get("GITHUB_API_URL") {
            config = config.with_api_base_url(url);
        }
        if let Some(namespace) = lookup("NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(pattern) = get("ARTIFACTS_REGEX") {
            let regex = Regex::new(&pattern).map_err(|e| GatekeeperError::InvalidConfig {
                key: "ARTIFACTS_REGEX".into(),
                message: e.to_string(),
            })?;
            config.artifacts_pattern = Some(regex);
        }
        if let Some(labels) = lookup("BLOCK_LABELS") {
            config.block_labels = parse_block_labels(&labels);
        }
        if let Some(raw) = get("CHECK_TITLE_LENGTH") {
            config.title_min_length = parse_length("CHECK_TITLE_LENGTH", &raw)?;
        }
        if let Some(raw) = get("CHECK_BODY_LENGTH") {
            config.body_min_length = parse_length("CHECK_BODY_LENGTH", &raw)?;
        }

        Ok(config)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Point at another API root (e.g. GitHub Enterprise). A trailing slash is dropped.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Namespaced status context for a check, e.g. `"Acme - Label validation"`.
    pub fn status_context(&self, check: &str) -> String {
        status_context(&self.namespace, check)
    }
}

fn parse_length(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| GatekeeperError::InvalidConfig {
            key: key.into(),
            message: format!("expected a non-negative integer, got '{}': {}", raw, e),
        })
}

/// Split a comma-separated block list into trimmed, non-empty label names.
pub fn parse_block_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(String::from)
        .collect()
}
