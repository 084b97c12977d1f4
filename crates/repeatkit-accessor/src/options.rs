use serde::{Deserialize, Serialize};

/// Construction-time options for a [`crate::FormAccessor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessorOptions {
    /// Also request the synthetic `<form>_complete` status field.
    pub include_completion_field: bool,
}

impl Default for AccessorOptions {
    fn default() -> Self {
        Self {
            include_completion_field: true,
        }
    }
}

impl AccessorOptions {
    /// Parse options from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
