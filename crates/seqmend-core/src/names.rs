use serde::{Deserialize, Serialize};

/// Resolved naming for the durable-state table.
///
/// Names arrive from an externally supplied configuration and are inlined
/// into generated statements, so they must already be validated as plain
/// SQL identifiers (see `seqmend-config`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNames {
    /// Schema the table lives in, if any.
    pub schema: Option<String>,
    /// Unqualified table name.
    pub table: String,
    /// Column names.
    pub columns: ColumnNames,
}

impl TableNames {
    /// Schema-qualified table name.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.table),
            None => self.table.clone(),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            schema: None,
            table: "durable_state".to_string(),
            columns: ColumnNames::default(),
        }
    }
}

/// Column names of the durable-state table. Semantics are fixed, names are
/// caller-configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub global_offset: String,
    pub persistence_id: String,
    pub seq_number: String,
    pub state_payload: String,
    pub tag: String,
    pub state_ser_id: String,
    pub state_ser_manifest: String,
    pub state_timestamp: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            global_offset: "global_offset".to_string(),
            persistence_id: "persistence_id".to_string(),
            seq_number: "sequence_number".to_string(),
            state_payload: "state_payload".to_string(),
            tag: "tag".to_string(),
            state_ser_id: "state_ser_id".to_string(),
            state_ser_manifest: "state_ser_manifest".to_string(),
            state_timestamp: "state_timestamp".to_string(),
        }
    }
}
