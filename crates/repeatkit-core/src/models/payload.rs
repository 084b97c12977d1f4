//! Wire payload exchanged with the record store.
//!
//! A record's payload has two halves:
//!
//! ```text
//! [record]
//!     events[event_id]                                  => {field: value}
//!     repeat_instances[event_id][form][instance_key]   => {field: value}
//! ```
//!
//! Singleton forms live under `events`; repeating forms (both repeat
//! variants) live under `repeat_instances`. Instance keys are store-level
//! strings, see [`crate::wire`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::{EventId, InstanceId, RecordId};

/// Field name to value. Values are always text in the store.
pub type FieldMap = BTreeMap<String, String>;

/// Instance id to fields, ordered numerically.
pub type InstanceMap = BTreeMap<InstanceId, FieldMap>;

/// Store-level instance key to fields.
pub type WireInstances = BTreeMap<String, FieldMap>;

pub type DataPayload = BTreeMap<RecordId, RecordPayload>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<EventId, FieldMap>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repeat_instances: BTreeMap<EventId, BTreeMap<String, WireInstances>>,
}

impl RecordPayload {
    /// Payload carrying one event's singleton fields.
    pub fn singleton(event_id: EventId, fields: FieldMap) -> Self {
        let mut payload = Self::default();
        payload.events.insert(event_id, fields);
        payload
    }

    /// Payload carrying one form's instances in one event.
    pub fn repeating(event_id: EventId, form: &str, instances: WireInstances) -> Self {
        let mut payload = Self::default();
        payload
            .repeat_instances
            .entry(event_id)
            .or_default()
            .insert(form.to_string(), instances);
        payload
    }

    pub fn singleton_fields(&self, event_id: EventId) -> Option<&FieldMap> {
        self.events.get(&event_id)
    }

    pub fn form_instances(&self, event_id: EventId, form: &str) -> Option<&WireInstances> {
        self.repeat_instances.get(&event_id)?.get(form)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.repeat_instances.is_empty()
    }

    /// Total number of field values carried.
    pub fn value_count(&self) -> usize {
        let singles: usize = self.events.values().map(BTreeMap::len).sum();
        let repeats: usize = self
            .repeat_instances
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum();
        singles + repeats
    }
}
