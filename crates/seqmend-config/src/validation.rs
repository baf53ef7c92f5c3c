use seqmend_core::{ColumnNames, TableNames};

use crate::error::{ConfigError, ConfigResult};
use crate::tables::DurableStateTableConfig;

/// Validate a table configuration.
///
/// Names end up inlined into DDL and catalog queries, so anything that is
/// not a plain SQL identifier is rejected here.
pub fn validate_table_config(config: &DurableStateTableConfig) -> ConfigResult<()> {
    config.dialect()?;

    if let Some(schema) = &config.schema {
        validate_identifier("schema", schema)?;
    }
    validate_identifier("table", &config.table)?;

    let c = &config.columns;
    validate_identifier("columns.global_offset", &c.global_offset)?;
    validate_identifier("columns.persistence_id", &c.persistence_id)?;
    validate_identifier("columns.seq_number", &c.seq_number)?;
    validate_identifier("columns.state_payload", &c.state_payload)?;
    validate_identifier("columns.tag", &c.tag)?;
    validate_identifier("columns.state_ser_id", &c.state_ser_id)?;
    validate_identifier("columns.state_ser_manifest", &c.state_ser_manifest)?;
    validate_identifier("columns.state_timestamp", &c.state_timestamp)?;

    Ok(())
}

/// Convert a validated config into resolved table names.
pub fn to_table_names(config: &DurableStateTableConfig) -> ConfigResult<TableNames> {
    validate_table_config(config)?;

    Ok(TableNames {
        schema: config.schema.clone(),
        table: config.table.clone(),
        columns: ColumnNames {
            global_offset: config.columns.global_offset.clone(),
            persistence_id: config.columns.persistence_id.clone(),
            seq_number: config.columns.seq_number.clone(),
            state_payload: config.columns.state_payload.clone(),
            tag: config.columns.tag.clone(),
            state_ser_id: config.columns.state_ser_id.clone(),
            state_ser_manifest: config.columns.state_ser_manifest.clone(),
            state_timestamp: config.columns.state_timestamp.clone(),
        },
    })
}

fn validate_identifier(field: &str, value: &str) -> ConfigResult<()> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                && value.len() <= 63
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_and_validate(toml: &str) -> ConfigResult<TableNames> {
        let config = DurableStateTableConfig::parse(toml)?;
        to_table_names(&config)
    }

    #[test]
    fn test_defaults_are_valid() {
        let names = parse_and_validate("dialect = \"h2\"").unwrap();
        assert_eq!(names.qualified(), "durable_state");
        assert_eq!(names.columns.seq_number, "sequence_number");
    }

    #[test]
    fn test_rejects_injection_attempt() {
        let toml = r#"
dialect = "postgres"
table = "durable_state; DROP TABLE users"
"#;
        let err = parse_and_validate(toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIdentifier { ref field, .. } if field == "table"));
    }

    #[test]
    fn test_rejects_empty_column_name() {
        let toml = r#"
dialect = "postgres"

[columns]
tag = ""
"#;
        assert!(parse_and_validate(toml).is_err());
    }

    #[test]
    fn test_rejects_digit_initial_identifier() {
        let toml = r#"
dialect = "postgres"
schema = "1app"
"#;
        assert!(parse_and_validate(toml).is_err());
    }

    #[test]
    fn test_rejects_unsupported_dialect_before_names() {
        assert!(parse_and_validate("dialect = \"sqlite\"").is_err());
    }
}
