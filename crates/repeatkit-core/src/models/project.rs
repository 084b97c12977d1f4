use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::ids::{EventId, ProjectId};

/// Project-level metadata as exposed by the host platform.
///
/// Events are keyed by id; a non-longitudinal project has a single arm with a
/// single event. `repeating` only lists events that carry some repeat setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_id: ProjectId,
    #[serde(default)]
    pub longitudinal: bool,
    pub forms: BTreeMap<String, FormMeta>,
    pub events: BTreeMap<EventId, EventMeta>,
    #[serde(default)]
    pub repeating: BTreeMap<EventId, RepeatSetup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormMeta {
    #[serde(default)]
    pub label: String,
    /// Present only when the form is enabled as a survey.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_id: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMeta {
    /// e.g. "baseline_arm_1"
    pub unique_name: String,
    #[serde(default = "default_arm")]
    pub arm: u32,
    /// Forms designated for this event.
    pub forms: Vec<String>,
}

fn default_arm() -> u32 {
    1
}

/// How an event repeats, if at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatSetup {
    /// The entire event repeats.
    WholeEvent,
    /// Only the listed forms repeat within the event.
    Forms(BTreeSet<String>),
}

/// One row of the data dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field_name: String,
    pub form_name: String,
    pub field_type: String,
    #[serde(default)]
    pub field_label: String,
}

impl ProjectMetadata {
    pub fn has_form(&self, form: &str) -> bool {
        self.forms.contains_key(form)
    }

    /// Events where `form` is designated, in id order.
    pub fn events_for_form<'a>(&'a self, form: &'a str) -> impl Iterator<Item = EventId> + 'a {
        self.events
            .iter()
            .filter(move |(_, meta)| meta.forms.iter().any(|f| f == form))
            .map(|(id, _)| *id)
    }

    pub fn repeat_setup(&self, event_id: EventId) -> Option<&RepeatSetup> {
        self.repeating.get(&event_id)
    }

    /// The first event of the first arm.
    pub fn first_event_id(&self) -> Option<EventId> {
        self.events
            .iter()
            .min_by_key(|(id, meta)| (meta.arm, **id))
            .map(|(id, _)| *id)
    }

    pub fn event_name(&self, event_id: EventId) -> Option<&str> {
        self.events.get(&event_id).map(|e| e.unique_name.as_str())
    }

    pub fn survey_id(&self, form: &str) -> Option<u32> {
        self.forms.get(form).and_then(|f| f.survey_id)
    }
}
