//! Durable-state table DDL and the aggregate queries the repair path needs.

use crate::dialect::Dialect;
use crate::names::TableNames;

/// The single aggregate query that observes the current maximum offset.
///
/// Must run in the same session as the repair statements that follow it:
/// a write landing in between would make the reseed target stale.
pub fn max_offset_query(table: &str, offset_column: &str) -> String {
    format!("SELECT MAX({offset_column}) FROM {table}")
}

/// Clamp a row limit into the positive 32-bit range.
///
/// Some drivers take LIMIT as a 32-bit integer; callers hand us 64-bit
/// counts. Anything above `i32::MAX` reads "all of them" anyway.
pub fn clamp_limit(limit: u64) -> i64 {
    limit.min(i32::MAX as u64) as i64
}

/// DDL creating the durable-state table for a backend.
///
/// The shape is fixed: primary key on the persistence-id column, UNIQUE
/// constraint on the offset column, and the backend's native generator
/// feeding the offset. Oracle gets a named sequence plus a trigger, since
/// it has no inline auto-increment in this schema style.
pub fn create_table_statements(dialect: Dialect, names: &TableNames) -> Vec<String> {
    let table = dialect.qualified_table_name(names);
    let c = &names.columns;

    let offset_column = match dialect {
        Dialect::Postgres => format!("{} BIGSERIAL NOT NULL", c.global_offset),
        Dialect::MySql | Dialect::H2 => {
            format!("{} BIGINT NOT NULL AUTO_INCREMENT", c.global_offset)
        }
        Dialect::SqlServer => format!("{} BIGINT IDENTITY(1,1) NOT NULL", c.global_offset),
        Dialect::Oracle => format!("{} NUMBER(19) NOT NULL", c.global_offset),
    };

    let payload_type = match dialect {
        Dialect::Postgres => "BYTEA",
        Dialect::MySql | Dialect::H2 | Dialect::Oracle => "BLOB",
        Dialect::SqlServer => "VARBINARY(MAX)",
    };

    let create_table = format!(
        "CREATE TABLE {table} (\
         {offset_column}, \
         {pid} VARCHAR(255) NOT NULL, \
         {seq} BIGINT NOT NULL, \
         {payload} {payload_type} NOT NULL, \
         {tag} VARCHAR(255), \
         {ser_id} INTEGER NOT NULL, \
         {ser_manifest} VARCHAR(255), \
         {ts} BIGINT NOT NULL, \
         PRIMARY KEY ({pid}), \
         UNIQUE ({offset}))",
        pid = c.persistence_id,
        seq = c.seq_number,
        payload = c.state_payload,
        tag = c.tag,
        ser_id = c.state_ser_id,
        ser_manifest = c.state_ser_manifest,
        ts = c.state_timestamp,
        offset = c.global_offset,
    );

    let mut statements = vec![create_table];

    if dialect == Dialect::Oracle {
        // Bare name in user_sequences, schema-qualified in the DDL; the
        // repair lookup relies on this.
        let sequence = match &names.schema {
            Some(schema) => format!("{schema}.{}", Dialect::oracle_sequence_name(&names.table)),
            None => Dialect::oracle_sequence_name(&names.table),
        };
        statements.push(format!(
            "CREATE SEQUENCE {sequence} START WITH 1 INCREMENT BY 1 NOMAXVALUE"
        ));
        statements.push(format!(
            "CREATE OR REPLACE TRIGGER {table}_TRG BEFORE INSERT ON {table} FOR EACH ROW \
             WHEN (NEW.{offset} IS NULL) \
             BEGIN SELECT {sequence}.NEXTVAL INTO :NEW.{offset} FROM DUAL; END;",
            offset = c.global_offset,
        ));
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_offset_query() {
        assert_eq!(
            max_offset_query("durable_state", "global_offset"),
            "SELECT MAX(global_offset) FROM durable_state"
        );
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 0);
        assert_eq!(clamp_limit(100), 100);
        assert_eq!(clamp_limit(i32::MAX as u64), i32::MAX as i64);
        assert_eq!(clamp_limit(u64::MAX), i32::MAX as i64);
    }

    #[test]
    fn test_create_table_has_pk_and_unique_offset() {
        for dialect in Dialect::ALL {
            let statements = create_table_statements(dialect, &TableNames::default());
            let create = &statements[0];
            assert!(create.contains("PRIMARY KEY (persistence_id)"), "{dialect}");
            assert!(create.contains("UNIQUE (global_offset)"), "{dialect}");
        }
    }

    #[test]
    fn test_postgres_uses_bigserial() {
        let statements = create_table_statements(Dialect::Postgres, &TableNames::default());
        assert!(statements[0].contains("global_offset BIGSERIAL NOT NULL"));
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_oracle_creates_sequence_and_trigger() {
        let statements = create_table_statements(Dialect::Oracle, &TableNames::default());
        assert_eq!(statements.len(), 3);
        assert!(statements[1].starts_with("CREATE SEQUENCE DURABLE_STATE_SEQ START WITH 1"));
        assert!(statements[2].contains("DURABLE_STATE_SEQ.NEXTVAL"));
    }

    #[test]
    fn test_oracle_schema_qualified_sequence_matches_repair_lookup() {
        let names = TableNames {
            schema: Some("app".to_string()),
            ..TableNames::default()
        };
        let statements = create_table_statements(Dialect::Oracle, &names);
        assert!(statements[1].starts_with("CREATE SEQUENCE app.DURABLE_STATE_SEQ START WITH 1"));
        assert!(statements[2].contains("app.DURABLE_STATE_SEQ.NEXTVAL"));

        // The catalog lookup must target the bare name the DDL registers.
        match Dialect::Oracle.repair_plan(&names, 5) {
            crate::dialect::RepairPlan::Resolve(lookup) => {
                assert!(lookup.query().contains("= 'DURABLE_STATE_SEQ'"));
            }
            plan => panic!("expected a resolving plan, got {plan:?}"),
        }
    }

    #[test]
    fn test_schema_qualified_table() {
        let names = TableNames {
            schema: Some("app".to_string()),
            ..TableNames::default()
        };
        let statements = create_table_statements(Dialect::MySql, &names);
        assert!(statements[0].starts_with("CREATE TABLE app.durable_state ("));
    }
}
