use repeatkit_core::{
    DataPayload, EventId, FieldDefinition, InstanceId, ProjectId, ProjectMetadata, RecordId,
};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Parameters for a data export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub project_id: ProjectId,
    /// `None` exports every record in the project.
    pub records: Option<Vec<RecordId>>,
    pub fields: Vec<String>,
    pub event_id: EventId,
    /// Passed through verbatim to the store's logic engine.
    pub filter: Option<String>,
}

/// Result of a save, as reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub item_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<RecordId>,
}

impl SaveOutcome {
    /// A save only counts when nothing was rejected and something was written.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.item_count > 0
    }
}

/// Context for evaluating a logic expression against one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicRequest {
    pub project_id: ProjectId,
    pub expression: String,
    pub record: RecordId,
    /// Unique event name, e.g. "baseline_arm_1". `None` for the first event.
    pub event_name: Option<String>,
    pub instance: Option<InstanceId>,
    pub form: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyLinkRequest {
    pub project_id: ProjectId,
    pub record: RecordId,
    pub form: String,
    pub event_id: EventId,
    pub instance: InstanceId,
}

/// The host platform's record store.
///
/// Timeouts and retries are the implementor's business; callers treat every
/// error as final.
pub trait RecordStore {
    /// Project metadata. `Ok(None)` when the project does not exist.
    fn project(&self, project_id: ProjectId) -> Result<Option<ProjectMetadata>, StoreError>;

    /// Field definitions for one form, in dictionary order.
    fn data_dictionary(
        &self,
        project_id: ProjectId,
        form: &str,
    ) -> Result<Vec<FieldDefinition>, StoreError>;

    /// Export data in the nested wire shape (see [`repeatkit_core::models::payload`]).
    fn get_data(&self, request: &DataRequest) -> Result<DataPayload, StoreError>;

    /// Import data. The payload uses the same shape as [`RecordStore::get_data`].
    fn save_data(
        &self,
        project_id: ProjectId,
        payload: &DataPayload,
    ) -> Result<SaveOutcome, StoreError>;

    fn evaluate_logic(&self, request: &LogicRequest) -> Result<bool, StoreError>;

    fn survey_link(&self, request: &SurveyLinkRequest) -> Result<String, StoreError>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn project(&self, project_id: ProjectId) -> Result<Option<ProjectMetadata>, StoreError> {
        (**self).project(project_id)
    }

    fn data_dictionary(
        &self,
        project_id: ProjectId,
        form: &str,
    ) -> Result<Vec<FieldDefinition>, StoreError> {
        (**self).data_dictionary(project_id, form)
    }

    fn get_data(&self, request: &DataRequest) -> Result<DataPayload, StoreError> {
        (**self).get_data(request)
    }

    fn save_data(
        &self,
        project_id: ProjectId,
        payload: &DataPayload,
    ) -> Result<SaveOutcome, StoreError> {
        (**self).save_data(project_id, payload)
    }

    fn evaluate_logic(&self, request: &LogicRequest) -> Result<bool, StoreError> {
        (**self).evaluate_logic(request)
    }

    fn survey_link(&self, request: &SurveyLinkRequest) -> Result<String, StoreError> {
        (**self).survey_link(request)
    }
}
