use std::collections::BTreeMap;

use repeatkit_core::{EventId, FieldDefinition, ProjectId, ProjectMetadata, RepeatClass};
use repeatkit_store::RecordStore;

use crate::cache::FormCache;
use crate::discovery::classify_events;
use crate::error::AccessError;
use crate::options::AccessorOptions;

/// Instance-indexed access to one form of one project.
///
/// Built once per (project, form). Construction reads project metadata and
/// the data dictionary and classifies the form in every event; that
/// classification is never refreshed, so metadata changes made afterwards
/// are not seen. All reads go through a cache owned by this value, which is
/// never invalidated by writes made elsewhere.
///
/// Not synchronized: share one accessor between threads only behind a lock.
pub struct FormAccessor<S> {
    pub(crate) store: S,
    pub(crate) project: ProjectMetadata,
    pub(crate) form: String,
    pub(crate) dictionary: Vec<FieldDefinition>,
    pub(crate) fields: Vec<String>,
    pub(crate) survey_id: Option<u32>,
    pub(crate) classes: BTreeMap<EventId, RepeatClass>,
    pub(crate) cache: FormCache,
}

impl<S: RecordStore> FormAccessor<S> {
    pub fn new(store: S, project_id: ProjectId, form: &str) -> Result<Self, AccessError> {
        Self::with_options(store, project_id, form, &AccessorOptions::default())
    }

    pub fn with_options(
        store: S,
        project_id: ProjectId,
        form: &str,
        options: &AccessorOptions,
    ) -> Result<Self, AccessError> {
        let project = store
            .project(project_id)?
            .ok_or(AccessError::ProjectNotFound(project_id))?;
        if !project.has_form(form) {
            return Err(AccessError::UnknownForm {
                project_id,
                form: form.to_string(),
            });
        }

        let dictionary = store.data_dictionary(project_id, form)?;
        let mut fields: Vec<String> = dictionary.iter().map(|d| d.field_name.clone()).collect();
        if options.include_completion_field {
            fields.push(format!("{form}_complete"));
        }

        let survey_id = project.survey_id(form);
        let classes = classify_events(&project, form);

        tracing::debug!(
            project_id = %project_id,
            form = %form,
            fields = fields.len(),
            events = classes.len(),
            survey = survey_id.is_some(),
            "form accessor constructed"
        );

        Ok(Self {
            store,
            project,
            form: form.to_string(),
            dictionary,
            fields,
            survey_id,
            classes,
            cache: FormCache::default(),
        })
    }

    pub fn project_id(&self) -> ProjectId {
        self.project.project_id
    }

    pub fn form(&self) -> &str {
        &self.form
    }

    /// Field definitions of this form, as read at construction.
    pub fn data_dictionary(&self) -> &[FieldDefinition] {
        &self.dictionary
    }

    /// Fields requested on every load.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_survey(&self) -> bool {
        self.survey_id.is_some()
    }

    pub fn survey_id(&self) -> Option<u32> {
        self.survey_id
    }

    /// Classification in `event_id`, `None` when the form is not enabled there.
    pub fn classification(&self, event_id: EventId) -> Option<RepeatClass> {
        self.classes.get(&event_id).copied()
    }

    pub fn is_repeating(&self, event_id: EventId) -> bool {
        self.classification(event_id)
            .is_some_and(RepeatClass::is_repeating)
    }

    /// Events the form is enabled in, with their classification.
    pub fn enabled_events(&self) -> &BTreeMap<EventId, RepeatClass> {
        &self.classes
    }

    pub fn cache(&self) -> &FormCache {
        &self.cache
    }
}
