//! Instance key conventions of the record store.
//!
//! The store keeps no explicit index for the first instance: its key is the
//! empty string. Every other instance is keyed by its decimal number. These
//! functions are the only place that knows about that; everything above the
//! load/save boundary sees explicit [`InstanceId`]s.

use crate::error::CoreError;
use crate::models::ids::InstanceId;
use crate::models::payload::{FieldMap, InstanceMap, WireInstances};

/// Store-level key for an instance.
pub fn instance_key(id: InstanceId) -> String {
    if id == InstanceId::FIRST {
        String::new()
    } else {
        id.to_string()
    }
}

/// Parse a store-level key. Both `""` and `"1"` denote the first instance.
pub fn parse_instance_key(key: &str) -> Result<InstanceId, CoreError> {
    if key.trim().is_empty() {
        return Ok(InstanceId::FIRST);
    }
    key.parse()
        .map_err(|_| CoreError::MalformedInstanceKey(key.to_string()))
}

/// Convert store-keyed instances into an explicit instance map.
pub fn decode_instances(wire: &WireInstances) -> Result<InstanceMap, CoreError> {
    wire.iter()
        .map(|(key, fields)| Ok((parse_instance_key(key)?, fields.clone())))
        .collect()
}

/// Convert an explicit instance map into store-keyed instances.
pub fn encode_instances(instances: &InstanceMap) -> WireInstances {
    instances
        .iter()
        .map(|(id, fields)| (instance_key(*id), fields.clone()))
        .collect()
}

/// Store-keyed payload for exactly one instance.
pub fn encode_instance(id: InstanceId, fields: &FieldMap) -> WireInstances {
    WireInstances::from([(instance_key(id), fields.clone())])
}
