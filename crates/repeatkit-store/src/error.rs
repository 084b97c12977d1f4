use repeatkit_core::{CoreError, EventId, ProjectId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("event {event_id} does not exist in project {project_id}")]
    UnknownEvent {
        project_id: ProjectId,
        event_id: EventId,
    },

    #[error("event name '{0}' does not exist")]
    UnknownEventName(String),

    #[error("form '{form}' is not a survey in project {project_id}")]
    NotASurvey { project_id: ProjectId, form: String },

    #[error("logic error: {0}")]
    Logic(String),

    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("payload error: {0}")]
    Core(#[from] CoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
