use serde::Deserialize;

use seqmend_core::Dialect;

use crate::error::ConfigResult;

/// Raw durable-state table configuration as parsed from TOML.
///
/// Every name is optional and defaults to the canonical snake_case schema;
/// semantics of the columns are fixed regardless of what they are named.
#[derive(Debug, Deserialize)]
pub struct DurableStateTableConfig {
    /// Backend dialect selector (e.g. "postgres", "mysql").
    pub dialect: String,
    /// Schema the table lives in, if any.
    #[serde(default)]
    pub schema: Option<String>,
    /// Table name.
    #[serde(default = "default_table")]
    pub table: String,
    /// Column names.
    #[serde(default)]
    pub columns: ColumnConfig,
}

impl DurableStateTableConfig {
    /// Parse a table config from a TOML string.
    pub fn parse(toml_str: &str) -> ConfigResult<Self> {
        let config: DurableStateTableConfig = toml::from_str(toml_str)?;
        Ok(config)
    }

    /// Resolve the dialect selector.
    ///
    /// An unrecognized selector is fatal and must abort before any DDL is
    /// issued.
    pub fn dialect(&self) -> ConfigResult<Dialect> {
        Ok(self.dialect.parse()?)
    }
}

/// Column names (raw from TOML).
#[derive(Debug, Deserialize)]
pub struct ColumnConfig {
    #[serde(default = "default_global_offset")]
    pub global_offset: String,
    #[serde(default = "default_persistence_id")]
    pub persistence_id: String,
    #[serde(default = "default_seq_number")]
    pub seq_number: String,
    #[serde(default = "default_state_payload")]
    pub state_payload: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default = "default_state_ser_id")]
    pub state_ser_id: String,
    #[serde(default = "default_state_ser_manifest")]
    pub state_ser_manifest: String,
    #[serde(default = "default_state_timestamp")]
    pub state_timestamp: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            global_offset: default_global_offset(),
            persistence_id: default_persistence_id(),
            seq_number: default_seq_number(),
            state_payload: default_state_payload(),
            tag: default_tag(),
            state_ser_id: default_state_ser_id(),
            state_ser_manifest: default_state_ser_manifest(),
            state_timestamp: default_state_timestamp(),
        }
    }
}

fn default_table() -> String {
    "durable_state".to_string()
}

fn default_global_offset() -> String {
    "global_offset".to_string()
}

fn default_persistence_id() -> String {
    "persistence_id".to_string()
}

fn default_seq_number() -> String {
    "sequence_number".to_string()
}

fn default_state_payload() -> String {
    "state_payload".to_string()
}

fn default_tag() -> String {
    "tag".to_string()
}

fn default_state_ser_id() -> String {
    "state_ser_id".to_string()
}

fn default_state_ser_manifest() -> String {
    "state_ser_manifest".to_string()
}

fn default_state_timestamp() -> String {
    "state_timestamp".to_string()
}
