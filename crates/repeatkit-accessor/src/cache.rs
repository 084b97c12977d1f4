use std::collections::{BTreeMap, BTreeSet};

use repeatkit_core::{EventId, FieldMap, InstanceId, InstanceMap, RecordId, RepeatClass};

/// One form's data for a single (record, event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormData {
    /// Flat field map: a singleton form, or one instance of a repeating form.
    Fields(FieldMap),
    /// Every instance of a repeating form, ordered by instance id.
    Instances(InstanceMap),
}

impl FormData {
    /// The empty value of the shape `class` produces.
    pub fn empty(class: RepeatClass) -> Self {
        if class.is_repeating() {
            FormData::Instances(InstanceMap::new())
        } else {
            FormData::Fields(FieldMap::new())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FormData::Fields(fields) => fields.is_empty(),
            FormData::Instances(instances) => instances.is_empty(),
        }
    }

    pub fn as_fields(&self) -> Option<&FieldMap> {
        match self {
            FormData::Fields(fields) => Some(fields),
            FormData::Instances(_) => None,
        }
    }

    pub fn as_instances(&self) -> Option<&InstanceMap> {
        match self {
            FormData::Instances(instances) => Some(instances),
            FormData::Fields(_) => None,
        }
    }

    pub fn into_fields(self) -> Option<FieldMap> {
        match self {
            FormData::Fields(fields) => Some(fields),
            FormData::Instances(_) => None,
        }
    }

    pub fn into_instances(self) -> Option<InstanceMap> {
        match self {
            FormData::Instances(instances) => Some(instances),
            FormData::Fields(_) => None,
        }
    }

    /// Instance ids in ascending order. Empty for flat data.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.as_instances()
            .map(|i| i.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Fold a fresh read into this entry. Flat data is replaced, instances
    /// are replaced one by one so instances missing from `fresh` survive.
    fn absorb_read(&mut self, fresh: FormData) {
        match (self, fresh) {
            (FormData::Instances(cached), FormData::Instances(fresh)) => cached.extend(fresh),
            (slot, fresh) => *slot = fresh,
        }
    }

    /// Fold a successful write into this entry, field by field, the way the
    /// store merges it.
    fn absorb_write(&mut self, written: FormData) {
        match (self, written) {
            (FormData::Fields(cached), FormData::Fields(written)) => cached.extend(written),
            (FormData::Instances(cached), FormData::Instances(written)) => {
                for (id, fields) in written {
                    cached.entry(id).or_default().extend(fields);
                }
            }
            (slot, written) => *slot = written,
        }
    }
}

impl From<FieldMap> for FormData {
    fn from(fields: FieldMap) -> Self {
        FormData::Fields(fields)
    }
}

impl From<InstanceMap> for FormData {
    fn from(instances: InstanceMap) -> Self {
        FormData::Instances(instances)
    }
}

/// Per-accessor cache: record -> event -> form data.
///
/// Besides the data itself it remembers which records an unfiltered read
/// returned for an event (so "returned but empty" differs from "does not
/// exist") and which events were loaded for the whole project. Entries from
/// filtered reads may hold a subset of the instances and never settle a
/// (record, event) on their own.
#[derive(Debug, Default)]
pub struct FormCache {
    entries: BTreeMap<RecordId, BTreeMap<EventId, FormData>>,
    acknowledged: BTreeMap<EventId, BTreeSet<RecordId>>,
    exhaustive: BTreeSet<EventId>,
}

impl FormCache {
    pub fn get(&self, record: &RecordId, event_id: EventId) -> Option<&FormData> {
        self.entries.get(record)?.get(&event_id)
    }

    pub fn contains(&self, record: &RecordId, event_id: EventId) -> bool {
        self.get(record, event_id).is_some()
    }

    /// An unfiltered read returned this record for this event.
    pub fn is_acknowledged(&self, record: &RecordId, event_id: EventId) -> bool {
        self.acknowledged
            .get(&event_id)
            .is_some_and(|records| records.contains(record))
    }

    pub fn is_exhaustive(&self, event_id: EventId) -> bool {
        self.exhaustive.contains(&event_id)
    }

    /// Whether a read of (record, event) can be answered without the store.
    pub fn is_settled(&self, record: &RecordId, event_id: EventId) -> bool {
        self.is_acknowledged(record, event_id) || self.is_exhaustive(event_id)
    }

    pub fn acknowledge(&mut self, record: &RecordId, event_id: EventId) {
        self.acknowledged
            .entry(event_id)
            .or_default()
            .insert(record.clone());
    }

    pub fn mark_exhaustive(&mut self, event_id: EventId) {
        self.exhaustive.insert(event_id);
    }

    pub fn merge_read(&mut self, record: RecordId, event_id: EventId, data: FormData) {
        let events = self.entries.entry(record).or_default();
        match events.get_mut(&event_id) {
            Some(cached) => cached.absorb_read(data),
            None => {
                events.insert(event_id, data);
            }
        }
    }

    /// Apply a successful write. Entries the cache does not hold are left for
    /// the next read, unless the event was loaded for every record, in which
    /// case a miss would otherwise never reach the store.
    pub fn merge_write(&mut self, record: &RecordId, event_id: EventId, data: FormData) {
        if let Some(cached) = self
            .entries
            .get_mut(record)
            .and_then(|events| events.get_mut(&event_id))
        {
            cached.absorb_write(data);
        } else if self.is_exhaustive(event_id) {
            self.acknowledge(record, event_id);
            self.entries
                .entry(record.clone())
                .or_default()
                .insert(event_id, data);
        }
    }

    /// Number of (record, event) entries held.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
