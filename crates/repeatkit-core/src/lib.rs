//! repeatkit-core
//!
//! Pure domain types for instance-indexed form data: identifiers, repeat
//! classification, project metadata, and the record store's wire payload.
//! No store dependency. This is the shared vocabulary of the workspace.

pub mod error;
pub mod models;
pub mod wire;

pub use crate::error::CoreError;
pub use crate::models::ids::{EventId, InstanceId, ProjectId, RecordId};
pub use crate::models::payload::{DataPayload, FieldMap, InstanceMap, RecordPayload};
pub use crate::models::project::{EventMeta, FieldDefinition, FormMeta, ProjectMetadata, RepeatSetup};
pub use crate::models::repeat::RepeatClass;
