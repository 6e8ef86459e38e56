//! The triggering build's metadata, injected as a JSON file by whatever is
//! driving this tool (CI or a developer by hand).

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuildContext {
    /// Commit to fetch; absent means the default branch head.
    pub gitiles_commit: Option<GitilesCommit>,

    /// Pending Gerrit patches. Non-empty marks a pre-submit (try) build,
    /// which suppresses packaging and publishing.
    pub gerrit_changes: Vec<GerritChange>,

    /// Builder project; publishing only happens for the internal one.
    pub project: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GitilesCommit {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct GerritChange {
    pub change: u64,
    pub patchset: u64,
}

const INTERNAL_PROJECT: &str = "infra-internal";

impl BuildContext {
    /// An omitted or missing file is a plain CI build of the default branch;
    /// a file that exists but does not parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read(path)
            .with_context(|| format!("failed to read build input {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse build input {}", path.display()))
    }

    pub fn fetch_ref(&self) -> &str {
        self.gitiles_commit
            .as_ref()
            .map(|c| c.id.as_str())
            .unwrap_or("refs/heads/master")
    }

    pub fn is_try(&self) -> bool {
        !self.gerrit_changes.is_empty()
    }

    pub fn is_internal(&self) -> bool {
        self.project.as_deref() == Some(INTERNAL_PROJECT)
    }
}

impl GerritChange {
    /// Gerrit ref for this patchset: `refs/changes/<NN>/<change>/<patchset>`
    /// where NN is the last two digits of the change number.
    pub fn fetch_ref(&self) -> String {
        let change = self.change.to_string();
        let shard = &change[change.len().saturating_sub(2)..];
        format!("refs/changes/{}/{}/{}", shard, self.change, self.patchset)
    }
}
