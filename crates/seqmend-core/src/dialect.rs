//! Supported relational backends and their offset-repair statements.
//!
//! Each backend generates `global_offset` with a different native primitive
//! (identity column, auto-increment, or named sequence). After a bulk data
//! migration that generator still sits at its old position, so the next
//! insert would reissue an already-used offset. [`Dialect::repair_plan`]
//! produces the backend-native statements that realign the generator so its
//! next value is `observed_max + 1`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::names::TableNames;

/// A supported relational backend.
///
/// This set is closed: the migration orchestrator never branches on backend
/// type itself, so adding a backend means adding a variant here and its
/// match arms, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    Oracle,
    SqlServer,
    H2,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Oracle,
        Dialect::SqlServer,
        Dialect::H2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Oracle => "oracle",
            Dialect::SqlServer => "sqlserver",
            Dialect::H2 => "h2",
        }
    }

    /// Whether DDL and sequence manipulation take part in transactions.
    ///
    /// Only Postgres guarantees this; the other backends may auto-commit
    /// DDL, so their repair is best-effort atomic only.
    pub fn supports_transactional_ddl(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Resolve the fully-qualified durable-state table name.
    pub fn qualified_table_name(&self, names: &TableNames) -> String {
        names.qualified()
    }

    /// Name of the Oracle sequence that feeds the offset column.
    ///
    /// Follows the `<UPPER(TABLE)>_SEQ` convention of the schema scripts.
    pub fn oracle_sequence_name(table: &str) -> String {
        format!("{}_SEQ", table.to_uppercase())
    }

    /// Build the repair protocol for this backend.
    ///
    /// `observed_max` is the current `MAX(global_offset)` of the table,
    /// which must have been read in the same session with no intervening
    /// writes. After executing the plan the generator's next value is
    /// `observed_max + 1`.
    ///
    /// The empty-table case is handled by the caller: with no observed
    /// maximum, no plan is built and the generator keeps its initial state
    /// (next offset is 1 on a freshly created schema). Reseeding to a
    /// sentinel instead would behave differently across backends.
    pub fn repair_plan(&self, names: &TableNames, observed_max: i64) -> RepairPlan {
        let table = self.qualified_table_name(names);
        let offset_column = &names.columns.global_offset;
        match self {
            Dialect::H2 => RepairPlan::Direct(vec![format!(
                "ALTER TABLE {table} ALTER COLUMN {offset_column} RESTART WITH {}",
                observed_max + 1
            )]),
            Dialect::MySql => RepairPlan::Direct(vec![format!(
                "ALTER TABLE {table} AUTO_INCREMENT = {}",
                observed_max + 1
            )]),
            // RESEED sets the *last used* value, not the next one, so the
            // argument is observed_max rather than observed_max + 1.
            Dialect::SqlServer => RepairPlan::Direct(vec![format!(
                "DBCC CHECKIDENT ('{table}', RESEED, {observed_max})"
            )]),
            Dialect::Postgres => RepairPlan::Resolve(SequenceLookup {
                query: format!(
                    "SELECT pg_get_serial_sequence('{table}', '{offset_column}')"
                ),
                sequence_hint: format!("{table}.{offset_column}"),
                kind: LookupKind::PgSerialSequence,
                // pg_get_serial_sequence already returns a schema-qualified
                // name.
                qualifier: None,
                restart_with: observed_max + 1,
            }),
            Dialect::Oracle => {
                // user_sequences stores bare names; the schema qualifies
                // only the DROP/CREATE statements.
                let sequence = Self::oracle_sequence_name(&names.table);
                RepairPlan::Resolve(SequenceLookup {
                    query: format!(
                        "SELECT sequence_name FROM user_sequences \
                         WHERE sequence_name = '{sequence}'"
                    ),
                    sequence_hint: sequence,
                    kind: LookupKind::OracleUserSequences,
                    qualifier: names.schema.clone(),
                    restart_with: observed_max + 1,
                })
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "oracle" => Ok(Dialect::Oracle),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "h2" => Ok(Dialect::H2),
            other => Err(Error::UnsupportedDialect(other.to_string())),
        }
    }
}

/// How a dialect realigns its offset generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairPlan {
    /// Statements that can be issued as-is.
    Direct(Vec<String>),
    /// The owning sequence must be resolved from the catalog first; the
    /// final statements depend on the resolved name.
    Resolve(SequenceLookup),
}

/// A catalog lookup that resolves the sequence feeding the offset column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceLookup {
    query: String,
    sequence_hint: String,
    kind: LookupKind,
    /// Schema prefix for the statements built from the resolved name, when
    /// the catalog stores bare names (Oracle).
    qualifier: Option<String>,
    restart_with: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupKind {
    PgSerialSequence,
    OracleUserSequences,
}

impl SequenceLookup {
    /// The catalog query. Returns the sequence name, or no rows / NULL when
    /// the schema was not created via the expected generator mechanism.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Human-readable identity of the sequence being looked up, for error
    /// reporting.
    pub fn sequence_hint(&self) -> &str {
        &self.sequence_hint
    }

    /// The repair statements once the sequence name is known.
    pub fn statements_for(&self, sequence: &str) -> Vec<String> {
        let sequence = match &self.qualifier {
            Some(schema) => format!("{schema}.{sequence}"),
            None => sequence.to_string(),
        };
        match self.kind {
            // setval with is_called = false: the next nextval() returns
            // exactly restart_with, not restart_with + 1.
            LookupKind::PgSerialSequence => vec![format!(
                "SELECT setval('{sequence}', {}, false)",
                self.restart_with
            )],
            // Oracle has no single-statement restart; drop and recreate.
            // Not atomic: a crash in between leaves the sequence absent,
            // accepted for a one-time migration step.
            LookupKind::OracleUserSequences => vec![
                format!("DROP SEQUENCE {sequence}"),
                format!(
                    "CREATE SEQUENCE {sequence} START WITH {} INCREMENT BY 1 NOMAXVALUE",
                    self.restart_with
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(plan: RepairPlan) -> Vec<String> {
        match plan {
            RepairPlan::Direct(statements) => statements,
            RepairPlan::Resolve(_) => panic!("expected a direct plan"),
        }
    }

    fn resolve(plan: RepairPlan) -> SequenceLookup {
        match plan {
            RepairPlan::Resolve(lookup) => lookup,
            RepairPlan::Direct(_) => panic!("expected a resolving plan"),
        }
    }

    #[test]
    fn test_h2_restart_with_max_plus_one() {
        let plan = Dialect::H2.repair_plan(&TableNames::default(), 5);
        assert_eq!(
            direct(plan),
            vec!["ALTER TABLE durable_state ALTER COLUMN global_offset RESTART WITH 6"]
        );
    }

    #[test]
    fn test_mysql_auto_increment_max_plus_one() {
        let plan = Dialect::MySql.repair_plan(&TableNames::default(), 5);
        assert_eq!(
            direct(plan),
            vec!["ALTER TABLE durable_state AUTO_INCREMENT = 6"]
        );
    }

    #[test]
    fn test_sqlserver_reseeds_to_last_used_value() {
        // RESEED takes the last-used value; next identity is still max + 1.
        let plan = Dialect::SqlServer.repair_plan(&TableNames::default(), 5);
        assert_eq!(
            direct(plan),
            vec!["DBCC CHECKIDENT ('durable_state', RESEED, 5)"]
        );
    }

    #[test]
    fn test_postgres_setval_is_called_false() {
        let lookup = resolve(Dialect::Postgres.repair_plan(&TableNames::default(), 100));
        assert_eq!(
            lookup.query(),
            "SELECT pg_get_serial_sequence('durable_state', 'global_offset')"
        );
        assert_eq!(
            lookup.statements_for("public.durable_state_global_offset_seq"),
            vec!["SELECT setval('public.durable_state_global_offset_seq', 101, false)"]
        );
    }

    #[test]
    fn test_oracle_drop_then_recreate() {
        let lookup = resolve(Dialect::Oracle.repair_plan(&TableNames::default(), 5));
        assert_eq!(
            lookup.query(),
            "SELECT sequence_name FROM user_sequences WHERE sequence_name = 'DURABLE_STATE_SEQ'"
        );
        assert_eq!(lookup.sequence_hint(), "DURABLE_STATE_SEQ");
        assert_eq!(
            lookup.statements_for("DURABLE_STATE_SEQ"),
            vec![
                "DROP SEQUENCE DURABLE_STATE_SEQ",
                "CREATE SEQUENCE DURABLE_STATE_SEQ START WITH 6 INCREMENT BY 1 NOMAXVALUE",
            ]
        );
    }

    #[test]
    fn test_oracle_schema_qualified_lookup_uses_bare_name() {
        // user_sequences stores unqualified names, so the lookup must stay
        // bare even for a schema-qualified table; only the DROP/CREATE pair
        // gets the schema prefix.
        let names = TableNames {
            schema: Some("app".to_string()),
            ..TableNames::default()
        };
        let lookup = resolve(Dialect::Oracle.repair_plan(&names, 5));
        assert_eq!(
            lookup.query(),
            "SELECT sequence_name FROM user_sequences WHERE sequence_name = 'DURABLE_STATE_SEQ'"
        );
        assert_eq!(lookup.sequence_hint(), "DURABLE_STATE_SEQ");
        assert_eq!(
            lookup.statements_for("DURABLE_STATE_SEQ"),
            vec![
                "DROP SEQUENCE app.DURABLE_STATE_SEQ",
                "CREATE SEQUENCE app.DURABLE_STATE_SEQ START WITH 6 INCREMENT BY 1 NOMAXVALUE",
            ]
        );
    }

    #[test]
    fn test_gap_in_offsets_targets_max_plus_one() {
        // Offsets {1,2,3,5}: the observed max is 5, so every dialect must
        // make the next generated offset 6.
        for dialect in Dialect::ALL {
            let plan = dialect.repair_plan(&TableNames::default(), 5);
            let statements = match plan {
                RepairPlan::Direct(s) => s,
                RepairPlan::Resolve(lookup) => lookup.statements_for("DURABLE_STATE_SEQ"),
            };
            let expected = if dialect == Dialect::SqlServer { "5" } else { "6" };
            assert!(
                statements.iter().any(|s| s.contains(expected)),
                "{dialect}: {statements:?}"
            );
        }
    }

    #[test]
    fn test_from_str_round_trip() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.as_str().parse::<Dialect>().unwrap(), dialect);
        }
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("MSSQL".parse::<Dialect>().unwrap(), Dialect::SqlServer);
    }

    #[test]
    fn test_from_str_unsupported() {
        let err = "sqlite".parse::<Dialect>().unwrap_err();
        assert!(err.to_string().contains("sqlite"));
    }

    #[test]
    fn test_only_postgres_has_transactional_ddl() {
        for dialect in Dialect::ALL {
            assert_eq!(
                dialect.supports_transactional_ddl(),
                dialect == Dialect::Postgres
            );
        }
    }
}
