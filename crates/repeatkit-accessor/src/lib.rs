//! repeatkit-accessor
//!
//! Uniform, instance-indexed access to one form's data, whichever way the
//! form repeats in a given event.
//!
//! Public API:
//! - `FormAccessor::new()`: resolve the form and classify every event once
//! - `load()`: pull records into the cache (merging, never replacing)
//! - `get()` / `get_all_instances()`: read through the cache
//! - `first_instance_id()` / `last_instance_id()` / `next_instance_id()`
//! - `exists()`: find an instance by partial field match
//! - `save()` / `save_instance()`: write back in the store's wire shape

pub mod accessor;
pub mod cache;
pub mod discovery;
pub mod error;
pub mod events;
pub mod load;
pub mod options;
pub mod query;
pub mod write;

pub use crate::accessor::FormAccessor;
pub use crate::cache::FormData;
pub use crate::error::{AccessError, ErrorKind};
pub use crate::options::AccessorOptions;
