use repeatkit_core::{CoreError, EventId, InstanceId, ProjectId, RecordId, RepeatClass};
use repeatkit_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("unable to determine a valid project for {0}")]
    ProjectNotFound(ProjectId),

    #[error("form '{form}' is not valid in project {project_id}")]
    UnknownForm { project_id: ProjectId, form: String },

    #[error("an event id is required for longitudinal project {0}")]
    MissingEvent(ProjectId),

    #[error("{form} is not enabled in event {event_id}")]
    FormNotEnabled { form: String, event_id: EventId },

    #[error("record {record} in event {event_id} does not exist")]
    NotFound { record: RecordId, event_id: EventId },

    #[error("instance {instance} is not valid for record {record} in event {event_id}")]
    InstanceNotFound {
        record: RecordId,
        event_id: EventId,
        instance: InstanceId,
    },

    #[error("{form} is {actual} in event {event_id}, operation requires a {expected} form")]
    WrongClassification {
        form: String,
        event_id: EventId,
        actual: RepeatClass,
        expected: &'static str,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no data loaded for record {record} in event {event_id}")]
    NotLoaded { record: RecordId, event_id: EventId },

    #[error("{0} is not a survey")]
    NotASurvey(String),

    #[error("problem saving data for record {record} in event {event_id}. Returned: {diagnostic}")]
    Save {
        record: RecordId,
        event_id: EventId,
        /// The store's outcome, serialized as JSON.
        diagnostic: String,
    },

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("malformed store payload: {0}")]
    MalformedPayload(#[from] CoreError),
}

/// Failure kinds, without payloads, for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    MissingEvent,
    FormNotEnabled,
    NotFound,
    InstanceNotFound,
    WrongClassification,
    InvalidInput,
    NotLoaded,
    NotASurvey,
    Save,
    NotImplemented,
    Store,
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectNotFound(_) | Self::UnknownForm { .. } => ErrorKind::Configuration,
            Self::MissingEvent(_) => ErrorKind::MissingEvent,
            Self::FormNotEnabled { .. } => ErrorKind::FormNotEnabled,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InstanceNotFound { .. } => ErrorKind::InstanceNotFound,
            Self::WrongClassification { .. } => ErrorKind::WrongClassification,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotLoaded { .. } => ErrorKind::NotLoaded,
            Self::NotASurvey(_) => ErrorKind::NotASurvey,
            Self::Save { .. } => ErrorKind::Save,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
            Self::Store(_) | Self::MalformedPayload(_) => ErrorKind::Store,
        }
    }
}
