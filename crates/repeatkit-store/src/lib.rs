//! repeatkit-store
//!
//! The record-store contract the accessor is written against, plus an
//! in-memory implementation that speaks the same wire conventions.

pub mod error;
pub mod logic;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use crate::error::StoreError;
pub use crate::memory::MemoryStore;
pub use crate::snapshot::{ProjectSnapshot, StoreSnapshot};
pub use crate::store::{DataRequest, LogicRequest, RecordStore, SaveOutcome, SurveyLinkRequest};
