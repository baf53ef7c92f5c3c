//! Migration orchestration.
//!
//! Drives the one-time sequence: bulk-copy historical rows (caller
//! supplied), then repair the offset generator so new writes continue after
//! the copied data. The orchestrator is dialect-agnostic; all backend
//! branching lives in [`Dialect`].

use std::future::Future;

use tracing::info;

use seqmend_core::{Dialect, TableNames};

use crate::error::{StoreError, StoreResult};
use crate::repair::{OffsetRepairer, RepairOutcome};
use crate::session::SqlSession;

/// What a migration run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub dialect: Dialect,
    pub rows_copied: u64,
    pub outcome: RepairOutcome,
}

/// One-time durable-state migration driver.
///
/// There is no partial-resume protocol: a failed run is re-run from the
/// start, which is safe because the repair re-reads the maximum offset.
pub struct DurableStateMigrator<'a, S: SqlSession> {
    session: &'a S,
    dialect: Dialect,
    names: &'a TableNames,
}

impl<'a, S: SqlSession> DurableStateMigrator<'a, S> {
    pub fn new(session: &'a S, dialect: Dialect, names: &'a TableNames) -> Self {
        Self {
            session,
            dialect,
            names,
        }
    }

    /// Run the migration: `bulk_copy`, then offset repair.
    ///
    /// `bulk_copy` moves the historical rows into the new schema and
    /// returns how many it copied; it is external to this subsystem. The
    /// repair only starts once the copy future completes successfully, and
    /// every failure propagates verbatim. Writers must stay paused for the
    /// whole run (see [`OffsetRepairer::repair`]).
    pub async fn run<F, Fut>(&self, bulk_copy: F) -> StoreResult<MigrationReport>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64, Box<dyn std::error::Error + Send + Sync>>>,
    {
        info!(
            dialect = %self.dialect,
            table = %self.dialect.qualified_table_name(self.names),
            "Starting durable-state migration"
        );

        let rows_copied = bulk_copy()
            .await
            .map_err(|e| StoreError::BulkCopy(e.to_string()))?;
        info!(rows_copied, "Bulk copy complete");

        let outcome = OffsetRepairer::new(self.session, self.dialect, self.names)
            .repair()
            .await?;
        info!(?outcome, "Durable-state migration complete");

        Ok(MigrationReport {
            dialect: self.dialect,
            rows_copied,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSession;
    use seqmend_config::{to_table_names, DurableStateTableConfig};

    #[tokio::test]
    async fn test_copy_then_repair() {
        let session = MockSession::new();
        session.script_i64(Some(41));

        let names = TableNames::default();
        let report = DurableStateMigrator::new(&session, Dialect::MySql, &names)
            .run(|| async { Ok(12_000) })
            .await
            .unwrap();

        assert_eq!(report.dialect, Dialect::MySql);
        assert_eq!(report.rows_copied, 12_000);
        assert_eq!(
            report.outcome,
            RepairOutcome::Repaired {
                observed_max: 41,
                next_offset: 42
            }
        );
    }

    #[tokio::test]
    async fn test_failed_copy_aborts_before_any_statement() {
        let session = MockSession::new();

        let names = TableNames::default();
        let err = DurableStateMigrator::new(&session, Dialect::Postgres, &names)
            .run(|| async { Err("source unreachable".into()) })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::BulkCopy(ref m) if m.contains("source unreachable")));
        assert!(session.statement_log().is_empty());
    }

    #[tokio::test]
    async fn test_empty_target_reports_skip() {
        let session = MockSession::new();
        session.script_i64(None);

        let names = TableNames::default();
        let report = DurableStateMigrator::new(&session, Dialect::H2, &names)
            .run(|| async { Ok(0) })
            .await
            .unwrap();

        assert_eq!(report.rows_copied, 0);
        assert_eq!(report.outcome, RepairOutcome::SkippedEmptyTable);
    }

    #[tokio::test]
    async fn test_repair_errors_propagate_verbatim() {
        let session = MockSession::new();
        session.script_i64(Some(5)).script_text(None);

        let names = TableNames::default();
        let err = DurableStateMigrator::new(&session, Dialect::Oracle, &names)
            .run(|| async { Ok(1) })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::SequenceResolution { .. }));
    }

    #[tokio::test]
    async fn test_names_from_parsed_config() {
        let config = DurableStateTableConfig::parse(
            r#"
dialect = "mysql"
schema = "app"
table = "entity_state"

[columns]
global_offset = "ordering"
"#,
        )
        .unwrap();
        let names = to_table_names(&config).unwrap();

        let session = MockSession::new();
        session.script_i64(Some(5));

        DurableStateMigrator::new(&session, config.dialect().unwrap(), &names)
            .run(|| async { Ok(3) })
            .await
            .unwrap();

        assert_eq!(
            session.executed_statements(),
            vec!["ALTER TABLE app.entity_state AUTO_INCREMENT = 6"]
        );
        assert_eq!(
            session.statement_log()[0],
            "SELECT MAX(ordering) FROM app.entity_state"
        );
    }
}
