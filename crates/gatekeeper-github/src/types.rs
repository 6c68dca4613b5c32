use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Pull request files
// ---------------------------------------------------------------------------

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    #[serde(default)]
    pub contents_url: String,
}

/// Body of `GET /repos/{owner}/{repo}/contents/{path}?ref=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

// ---------------------------------------------------------------------------
// Commit comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitComparison {
    #[serde(default)]
    pub commits: Vec<ComparedCommit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparedCommit {
    #[serde(default)]
    pub sha: String,
    pub commit: CommitDetail,
    #[serde(default)]
    pub parents: Vec<ParentRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub sha: String,
}

impl ComparedCommit {
    /// Build a commit from its message and parent SHAs.
    pub fn new(message: impl Into<String>, parents: &[&str]) -> Self {
        Self {
            sha: String::new(),
            commit: CommitDetail {
                message: message.into(),
            },
            parents: parents
                .iter()
                .map(|sha| ParentRef {
                    sha: sha.to_string(),
                })
                .collect(),
        }
    }

    pub fn message(&self) -> &str {
        &self.commit.message
    }

    /// A merge commit has more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}
