use std::collections::BTreeMap;
use std::path::Path;

use repeatkit_core::{DataPayload, FieldDefinition, ProjectId, ProjectMetadata};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

const DEFAULT_SURVEY_BASE_URL: &str = "https://capture.localhost";

/// Full contents of a [`crate::MemoryStore`], persisted as pretty JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Prefix for generated survey links.
    #[serde(default = "default_survey_base_url")]
    pub survey_base_url: String,
    #[serde(default)]
    pub projects: BTreeMap<ProjectId, ProjectSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub metadata: ProjectMetadata,
    /// Data dictionary rows for every form in the project.
    #[serde(default)]
    pub dictionary: Vec<FieldDefinition>,
    /// Stored data, keyed the same way as an export.
    #[serde(default)]
    pub records: DataPayload,
}

fn default_survey_base_url() -> String {
    DEFAULT_SURVEY_BASE_URL.to_string()
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            survey_base_url: default_survey_base_url(),
            projects: BTreeMap::new(),
        }
    }
}

impl ProjectSnapshot {
    pub fn new(metadata: ProjectMetadata, dictionary: Vec<FieldDefinition>) -> Self {
        Self {
            metadata,
            dictionary,
            records: DataPayload::new(),
        }
    }
}

impl StoreSnapshot {
    /// Read a snapshot from disk.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read(path)?;
        let snapshot: StoreSnapshot = serde_json::from_slice(&json)?;
        tracing::debug!(
            path = %path.display(),
            projects = snapshot.projects.len(),
            "store snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Write a snapshot to disk (atomic: tmp + rename).
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, path)?;

        tracing::debug!(path = %path.display(), "store snapshot saved");
        Ok(())
    }
}
