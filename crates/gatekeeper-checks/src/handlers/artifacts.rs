//! Detects dependencies pulled from forbidden sources in `package.json`.
//!
//! Only the `dependencies` and `devDependencies` sections are inspected.
//! Anything that cannot be read (no manifest in the diff, no ref in the
//! contents URL, undecodable content) leaves the check green.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

use gatekeeper_github::{FileContent, SharedGitHub};
use gatekeeper_types::{status_context, PolicyResult, PullRequestContext, Result};

use crate::handler::PolicyCheck;

const CHECK_NAME: &str = "Artifacts check";
const MANIFEST: &str = "package.json";
const DEPENDENCY_SECTIONS: [&str; 2] = ["dependencies", "devDependencies"];

pub struct ArtifactsCheck {
    github: SharedGitHub,
    pattern: Regex,
    ref_pattern: Regex,
    context: String,
}

impl ArtifactsCheck {
    pub fn new(github: SharedGitHub, pattern: Regex, namespace: &str) -> Self {
        Self {
            github,
            pattern,
            ref_pattern: Regex::new(r"ref=([a-z0-9]+)").unwrap(),
            context: status_context(namespace, CHECK_NAME),
        }
    }

    fn pass(&self) -> PolicyResult {
        PolicyResult::success(&self.context, "No artifacts found in deps")
    }

    fn fail(&self) -> PolicyResult {
        PolicyResult::failure(&self.context, "Artifacts found in deps, remove them to merge")
    }
}

#[async_trait]
impl PolicyCheck for ArtifactsCheck {
    fn name(&self) -> &str {
        "artifacts"
    }

    async fn evaluate(&self, pr: &PullRequestContext) -> Result<PolicyResult> {
        let files = self
            .github
            .list_pull_request_files(&pr.owner, &pr.repo, pr.number)
            .await?;

        let Some(file) = files.iter().find(|f| f.filename.contains(MANIFEST)) else {
            tracing::info!("No manifest changed");
            return Ok(self.pass());
        };

        let Some(git_ref) = self
            .ref_pattern
            .captures(&file.contents_url)
            .map(|caps| caps[1].to_string())
        else {
            tracing::warn!(contents_url = %file.contents_url, "No ref in contents URL");
            return Ok(self.pass());
        };

        let content = self
            .github
            .get_file_content(&pr.owner, &pr.repo, &file.filename, &git_ref)
            .await?;

        let Some(manifest) = decode_manifest(&content) else {
            return Ok(self.pass());
        };

        let deps = dependency_sections(&manifest);
        match self.pattern.find(&deps) {
            Some(m) => {
                tracing::info!(file = %file.filename, found = m.as_str(), "Artifact found in deps");
                Ok(self.fail())
            }
            None => Ok(self.pass()),
        }
    }
}

/// Decode GitHub's base64 payload (wrapped every 60 characters) and parse it.
///
/// Files over 1 MB come back with encoding `none` and an empty body.
fn decode_manifest(file: &FileContent) -> Option<serde_json::Value> {
    if let Some(encoding) = file.encoding.as_deref().filter(|e| *e != "base64") {
        tracing::warn!(encoding, "Manifest content is not base64-encoded");
        return None;
    }

    let compact: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = match STANDARD.decode(compact) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Manifest is not valid base64");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Manifest is not valid JSON");
            None
        }
    }
}

/// Serialize only the dependency maps present in the manifest.
pub fn dependency_sections(manifest: &serde_json::Value) -> String {
    let mut sections = serde_json::Map::new();
    for key in DEPENDENCY_SECTIONS {
        if let Some(section) = manifest.get(key) {
            sections.insert(key.to_string(), section.clone());
        }
    }
    serde_json::Value::Object(sections).to_string()
}
