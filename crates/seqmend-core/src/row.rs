use serde::{Deserialize, Serialize};

/// The latest known state of one persistent entity.
///
/// Exactly one row exists per `persistence_id` after the first write: the
/// write path overwrites, it never appends. `global_offset` is generated by
/// the backend's native generator and is unique and strictly increasing
/// across the whole table; downstream consumers use it as their ordering
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableStateRow {
    /// Backend-generated table-wide ordering key.
    pub global_offset: i64,
    /// Entity identifier; primary key.
    pub persistence_id: String,
    /// Entity-local revision, monotonically non-decreasing per entity.
    pub seq_number: i64,
    /// Serialized entity state. Opaque to this crate.
    pub state_payload: Vec<u8>,
    /// Optional categorization label.
    pub tag: Option<String>,
    /// Serializer identity. Opaque to this crate.
    pub state_ser_id: i32,
    /// Serializer manifest. Opaque to this crate.
    pub state_ser_manifest: Option<String>,
    /// Wall clock of the last write, epoch millis.
    pub state_timestamp: i64,
}

/// Insert shape of a durable-state row: everything but the offset, which
/// the backend generates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDurableStateRow {
    pub persistence_id: String,
    pub seq_number: i64,
    pub state_payload: Vec<u8>,
    pub tag: Option<String>,
    pub state_ser_id: i32,
    pub state_ser_manifest: Option<String>,
    pub state_timestamp: i64,
}
