use std::collections::BTreeSet;
use std::path::Path;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use repeatkit_core::models::payload::WireInstances;
use repeatkit_core::wire::{instance_key, parse_instance_key};
use repeatkit_core::{
    DataPayload, EventId, FieldDefinition, FieldMap, ProjectId, ProjectMetadata, RecordId,
    RecordPayload, RepeatSetup,
};

use crate::error::StoreError;
use crate::logic::Logic;
use crate::snapshot::{ProjectSnapshot, StoreSnapshot};
use crate::store::{DataRequest, LogicRequest, RecordStore, SaveOutcome, SurveyLinkRequest};

/// In-memory record store.
///
/// Follows the host platform's conventions: the first instance of a
/// repeating form is stored and exported under the empty key, saves merge
/// field-by-field into what is already stored, and a save that touches
/// nothing reports an item count of zero.
pub struct MemoryStore {
    state: RwLock<StoreSnapshot>,
    get_calls: AtomicUsize,
    save_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_snapshot(StoreSnapshot::default())
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            get_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
        }
    }

    /// Open a store seeded from a JSON snapshot on disk.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut snapshot = StoreSnapshot::load(path)?;
        for project in snapshot.projects.values_mut() {
            for payload in project.records.values_mut() {
                normalize_instance_keys(payload)?;
            }
        }
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current contents to disk.
    pub fn persist(&self, path: &Path) -> Result<(), StoreError> {
        self.snapshot()?.save(path)
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("snapshot"))?;
        Ok(state.clone())
    }

    /// Register a project, replacing any existing one with the same id.
    pub fn add_project(
        &self,
        metadata: ProjectMetadata,
        dictionary: Vec<FieldDefinition>,
    ) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("add_project"))?;
        state
            .projects
            .insert(metadata.project_id, ProjectSnapshot::new(metadata, dictionary));
        Ok(())
    }

    /// Seed a record directly, bypassing validation and call counting.
    pub fn put_record(
        &self,
        project_id: ProjectId,
        record: impl Into<RecordId>,
        mut payload: RecordPayload,
    ) -> Result<(), StoreError> {
        normalize_instance_keys(&mut payload)?;
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("put_record"))?;
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        merge_record(project.records.entry(record.into()).or_default(), payload);
        Ok(())
    }

    /// Number of `get_data` calls served so far.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `save_data` calls received so far.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn project(&self, project_id: ProjectId) -> Result<Option<ProjectMetadata>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("project"))?;
        Ok(state.projects.get(&project_id).map(|p| p.metadata.clone()))
    }

    fn data_dictionary(
        &self,
        project_id: ProjectId,
        form: &str,
    ) -> Result<Vec<FieldDefinition>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("data_dictionary"))?;
        let project = state
            .projects
            .get(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        Ok(project
            .dictionary
            .iter()
            .filter(|d| d.form_name == form)
            .cloned()
            .collect())
    }

    fn get_data(&self, request: &DataRequest) -> Result<DataPayload, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("get_data"))?;
        let project = state
            .projects
            .get(&request.project_id)
            .ok_or(StoreError::ProjectNotFound(request.project_id))?;
        if !project.metadata.events.contains_key(&request.event_id) {
            return Err(StoreError::UnknownEvent {
                project_id: request.project_id,
                event_id: request.event_id,
            });
        }

        let filter = request
            .filter
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(Logic::parse)
            .transpose()?;
        let passes = |row: &FieldMap| filter.as_ref().is_none_or(|logic| logic.evaluate(row));
        let forms = requested_forms(&project.dictionary, &request.fields);
        let event_id = request.event_id;

        let mut out = DataPayload::new();
        for (record, stored) in &project.records {
            if let Some(wanted) = &request.records
                && !wanted.contains(record)
            {
                continue;
            }

            let mut payload = RecordPayload::default();
            let mut matched = filter.is_none();

            if let Some(fields) = stored.singleton_fields(event_id)
                && passes(fields)
            {
                matched = true;
                let row = project_fields(fields, &request.fields);
                if !row.is_empty() {
                    payload.events.insert(event_id, row);
                }
            }

            if let Some(by_form) = stored.repeat_instances.get(&event_id) {
                for (form, instances) in by_form.iter().filter(|(f, _)| forms.contains(f.as_str())) {
                    let mut kept = WireInstances::new();
                    for (key, fields) in instances.iter().filter(|(_, f)| passes(f)) {
                        matched = true;
                        let row = project_fields(fields, &request.fields);
                        if !row.is_empty() {
                            kept.insert(key.clone(), row);
                        }
                    }
                    if !kept.is_empty() {
                        payload
                            .repeat_instances
                            .entry(event_id)
                            .or_default()
                            .insert(form.clone(), kept);
                    }
                }
            }

            if matched {
                out.insert(record.clone(), payload);
            }
        }

        tracing::debug!(
            project_id = %request.project_id,
            event_id = %event_id,
            records = out.len(),
            "memory store export"
        );
        Ok(out)
    }

    fn save_data(
        &self,
        project_id: ProjectId,
        payload: &DataPayload,
    ) -> Result<SaveOutcome, StoreError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("save_data"))?;
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;

        let errors: Vec<String> = payload
            .iter()
            .flat_map(|(record, data)| validate_record(project, record, data))
            .collect();
        if !errors.is_empty() {
            tracing::debug!(project_id = %project_id, errors = errors.len(), "memory store rejected save");
            return Ok(SaveOutcome {
                errors,
                item_count: 0,
                ids: Vec::new(),
            });
        }

        let mut ids = Vec::new();
        for (record, data) in payload {
            if data.value_count() == 0 {
                continue;
            }
            let mut data = data.clone();
            normalize_instance_keys(&mut data)?;
            merge_record(project.records.entry(record.clone()).or_default(), data);
            ids.push(record.clone());
        }

        Ok(SaveOutcome {
            errors: Vec::new(),
            item_count: ids.len(),
            ids,
        })
    }

    fn evaluate_logic(&self, request: &LogicRequest) -> Result<bool, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("evaluate_logic"))?;
        let project = state
            .projects
            .get(&request.project_id)
            .ok_or(StoreError::ProjectNotFound(request.project_id))?;

        let event_id = match &request.event_name {
            Some(name) => project
                .metadata
                .events
                .iter()
                .find(|(_, e)| &e.unique_name == name)
                .map(|(id, _)| *id)
                .ok_or_else(|| StoreError::UnknownEventName(name.clone()))?,
            None => project
                .metadata
                .first_event_id()
                .ok_or_else(|| StoreError::Logic("project has no events".into()))?,
        };
        let logic = Logic::parse(&request.expression)?;

        let mut row = FieldMap::new();
        if let Some(stored) = project.records.get(&request.record) {
            if let Some(fields) = stored.singleton_fields(event_id) {
                row.extend(fields.clone());
            }
            if let (Some(form), Some(instance)) = (&request.form, request.instance)
                && let Some(fields) = stored
                    .form_instances(event_id, form)
                    .and_then(|i| i.get(&instance_key(instance)))
            {
                row.extend(fields.clone());
            }
        }

        Ok(logic.evaluate(&row))
    }

    fn survey_link(&self, request: &SurveyLinkRequest) -> Result<String, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("survey_link"))?;
        let project = state
            .projects
            .get(&request.project_id)
            .ok_or(StoreError::ProjectNotFound(request.project_id))?;
        if !project.metadata.events.contains_key(&request.event_id) {
            return Err(StoreError::UnknownEvent {
                project_id: request.project_id,
                event_id: request.event_id,
            });
        }
        let survey_id = project
            .metadata
            .survey_id(&request.form)
            .ok_or_else(|| StoreError::NotASurvey {
                project_id: request.project_id,
                form: request.form.clone(),
            })?;

        let token = format!(
            "p{}s{}e{}r{}i{}",
            request.project_id, survey_id, request.event_id, request.record, request.instance
        );
        Ok(format!(
            "{}/surveys/?s={token}",
            state.survey_base_url.trim_end_matches('/')
        ))
    }
}

/// Forms owning at least one of the requested fields.
fn requested_forms<'a>(dictionary: &'a [FieldDefinition], fields: &[String]) -> BTreeSet<&'a str> {
    dictionary
        .iter()
        .filter(|d| {
            fields.iter().any(|f| {
                *f == d.field_name || f.strip_suffix("_complete") == Some(d.form_name.as_str())
            })
        })
        .map(|d| d.form_name.as_str())
        .collect()
}

fn project_fields(row: &FieldMap, fields: &[String]) -> FieldMap {
    row.iter()
        .filter(|(name, _)| fields.contains(name))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn form_of<'a>(project: &'a ProjectSnapshot, field: &str) -> Option<&'a str> {
    if let Some(def) = project.dictionary.iter().find(|d| d.field_name == field) {
        return Some(def.form_name.as_str());
    }
    let form = field.strip_suffix("_complete")?;
    project
        .metadata
        .forms
        .get_key_value(form)
        .map(|(name, _)| name.as_str())
}

fn repeats_in(metadata: &ProjectMetadata, event_id: EventId, form: &str) -> bool {
    match metadata.repeat_setup(event_id) {
        Some(RepeatSetup::WholeEvent) => true,
        Some(RepeatSetup::Forms(forms)) => forms.contains(form),
        None => false,
    }
}

fn designated(metadata: &ProjectMetadata, event_id: EventId, form: &str) -> bool {
    metadata
        .events
        .get(&event_id)
        .is_some_and(|e| e.forms.iter().any(|f| f == form))
}

fn validate_record(project: &ProjectSnapshot, record: &RecordId, data: &RecordPayload) -> Vec<String> {
    let metadata = &project.metadata;
    let mut errors = Vec::new();

    for (event_id, fields) in &data.events {
        if !metadata.events.contains_key(event_id) {
            errors.push(format!("{record}: event {event_id} does not exist"));
            continue;
        }
        for field in fields.keys() {
            match form_of(project, field) {
                None => errors.push(format!("{record}: field '{field}' does not exist")),
                Some(form) if !designated(metadata, *event_id, form) => errors.push(format!(
                    "{record}: field '{field}' is not designated for event {event_id}"
                )),
                Some(form) if repeats_in(metadata, *event_id, form) => errors.push(format!(
                    "{record}: field '{field}' is on a repeating form in event {event_id} and needs an instance"
                )),
                Some(_) => {}
            }
        }
    }

    for (event_id, by_form) in &data.repeat_instances {
        if !metadata.events.contains_key(event_id) {
            errors.push(format!("{record}: event {event_id} does not exist"));
            continue;
        }
        for (form, instances) in by_form {
            if !designated(metadata, *event_id, form) || !repeats_in(metadata, *event_id, form) {
                errors.push(format!(
                    "{record}: form '{form}' does not repeat in event {event_id}"
                ));
                continue;
            }
            for (key, fields) in instances {
                if let Err(e) = parse_instance_key(key) {
                    errors.push(format!("{record}: {e}"));
                }
                for field in fields.keys() {
                    if form_of(project, field) != Some(form.as_str()) {
                        errors.push(format!("{record}: field '{field}' is not on form '{form}'"));
                    }
                }
            }
        }
    }

    errors
}

/// Rewrite instance keys so the first instance always uses the empty key.
fn normalize_instance_keys(payload: &mut RecordPayload) -> Result<(), StoreError> {
    for by_form in payload.repeat_instances.values_mut() {
        for instances in by_form.values_mut() {
            let mut normalized = WireInstances::new();
            for (key, fields) in std::mem::take(instances) {
                let id = parse_instance_key(&key)?;
                normalized.entry(instance_key(id)).or_default().extend(fields);
            }
            *instances = normalized;
        }
    }
    Ok(())
}

fn merge_record(stored: &mut RecordPayload, incoming: RecordPayload) {
    for (event_id, fields) in incoming.events {
        stored.events.entry(event_id).or_default().extend(fields);
    }
    for (event_id, by_form) in incoming.repeat_instances {
        let stored_forms = stored.repeat_instances.entry(event_id).or_default();
        for (form, instances) in by_form {
            let stored_instances = stored_forms.entry(form).or_default();
            for (key, fields) in instances {
                stored_instances.entry(key).or_default().extend(fields);
            }
        }
    }
}
