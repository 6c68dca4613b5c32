use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;

use gatekeeper_types::{GatekeeperConfig, GatekeeperError, PolicyResult, Result, DEFAULT_API_BASE_URL};

use crate::{CommitComparison, FileContent, GitHubApi, PullRequestFile};

const USER_AGENT: &str = concat!("gatekeeper/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const FILES_PER_PAGE: usize = 100;

// ---------------------------------------------------------------------------
// RestClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl RestClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn from_config(config: &GatekeeperConfig) -> Self {
        Self::new(config.github_token.clone()).with_base_url(config.api_base_url.clone())
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn api_url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let invalid = |message: String| GatekeeperError::InvalidConfig {
            key: "GITHUB_API_URL".into(),
            message,
        };
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| invalid(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Contents endpoint for a repository file; each directory level is
    /// its own segment.
    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> Result<reqwest::Url> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        self.api_url(&segments)
    }

    fn request(&self, method: Method, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("authorization", format!("token {}", self.token))
            .header("accept", "application/vnd.github+json")
            .header("user-agent", USER_AGENT)
            .header("x-github-api-version", API_VERSION)
    }

    /// Send a request and return the raw body of a successful response.
    async fn send(&self, builder: reqwest::RequestBuilder, endpoint: &str) -> Result<String> {
        tracing::debug!(endpoint, "GitHub request");

        let resp = builder.send().await.map_err(|e| GatekeeperError::Api {
            endpoint: endpoint.to_string(),
            status: 0,
            message: e.to_string(),
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| GatekeeperError::Api {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(map_error(endpoint, status, &body));
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<T> {
        let body = self.send(builder, endpoint).await?;
        serde_json::from_str(&body).map_err(|e| GatekeeperError::Api {
            endpoint: endpoint.to_string(),
            status: 200,
            message: format!("Failed to parse response JSON: {e}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Response translation
// ---------------------------------------------------------------------------

/// Turn a non-2xx GitHub response into an error, preferring GitHub's own
/// `message` field over the raw body.
fn map_error(endpoint: &str, status: reqwest::StatusCode, body: &str) -> GatekeeperError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string());

    GatekeeperError::Api {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
    }
}

/// Unwrap a GraphQL envelope: any entry in `errors` fails the call.
fn parse_graphql_response(body: &serde_json::Value) -> Result<serde_json::Value> {
    if let Some(errors) = body["errors"].as_array() {
        if !errors.is_empty() {
            let messages = errors
                .iter()
                .map(|e| e["message"].as_str().unwrap_or("unknown error").to_string())
                .collect();
            return Err(GatekeeperError::Graphql { messages });
        }
    }
    Ok(body["data"].clone())
}

// ---------------------------------------------------------------------------
// GitHubApi implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl GitHubApi for RestClient {
    async fn list_pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>> {
        let number = number.to_string();
        let url = self.api_url(&["repos", owner, repo, "pulls", &number, "files"])?;
        let endpoint = format!("GET {}", url.path());

        let mut files = Vec::new();
        let mut page = 1usize;
        loop {
            let builder = self
                .request(Method::GET, url.clone())
                .query(&[("per_page", FILES_PER_PAGE), ("page", page)]);
            let batch: Vec<PullRequestFile> = self.send_json(builder, &endpoint).await?;
            let done = batch.len() < FILES_PER_PAGE;
            files.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        Ok(files)
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<FileContent> {
        let url = self.contents_url(owner, repo, path)?;
        let endpoint = format!("GET {}", url.path());
        let builder = self.request(Method::GET, url).query(&[("ref", git_ref)]);
        self.send_json(builder, &endpoint).await
    }

    async fn compare_commits(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison> {
        let range = format!("{}...{}", base, head);
        let url = self.api_url(&["repos", owner, repo, "compare", &range])?;
        let endpoint = format!("GET {}", url.path());
        self.send_json(self.request(Method::GET, url), &endpoint)
            .await
    }

    async fn create_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &PolicyResult,
    ) -> Result<()> {
        let url = self.api_url(&["repos", owner, repo, "statuses", sha])?;
        let endpoint = format!("POST {}", url.path());
        let builder = self.request(Method::POST, url).json(status);
        self.send(builder, &endpoint).await?;
        Ok(())
    }

    async fn graphql(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let endpoint = "POST /graphql";
        let builder = self
            .request(Method::POST, self.api_url(&["graphql"])?)
            .json(&json!({ "query": query, "variables": variables }));
        let body: serde_json::Value = self.send_json(builder, endpoint).await?;
        parse_graphql_response(&body)
    }
}
