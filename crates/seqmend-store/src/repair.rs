//! Offset-generator repair.
//!
//! After a bulk copy the backend's native offset generator still sits at
//! its pre-migration position, so the next insert would reissue an offset
//! the copied rows already use. The repairer reads the current maximum
//! offset and reissues the generator so the next produced value is
//! `max + 1`.
//!
//! Caller contract: all write-path actors must be paused before
//! [`OffsetRepairer::repair`] runs and resumed only after it completes. The
//! repairer holds no lock itself; a write landing between the max read and
//! the reseed would make the target stale. Re-running a failed repair is
//! safe: the max is re-read and the reseed target recomputed.

use tracing::{debug, info, warn};

use seqmend_core::{max_offset_query, Dialect, RepairPlan, TableNames};

use crate::error::{StoreError, StoreResult};
use crate::session::SqlSession;

/// What a repair run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The table had no rows, so no statement was issued. The generator
    /// keeps its initial state: on a freshly created schema the next
    /// generated offset is 1.
    SkippedEmptyTable,
    /// The generator was realigned; its next value is `next_offset`.
    Repaired { observed_max: i64, next_offset: i64 },
}

/// Realigns one backend's offset generator with the table contents.
pub struct OffsetRepairer<'a, S: SqlSession> {
    session: &'a S,
    dialect: Dialect,
    names: &'a TableNames,
}

impl<'a, S: SqlSession> OffsetRepairer<'a, S> {
    pub fn new(session: &'a S, dialect: Dialect, names: &'a TableNames) -> Self {
        Self {
            session,
            dialect,
            names,
        }
    }

    /// Read the current maximum offset and reissue the generator.
    ///
    /// On Postgres the read and the reseed run inside one transaction; the
    /// other dialects may auto-commit DDL, so their repair is best-effort
    /// atomic only.
    pub async fn repair(&self) -> StoreResult<RepairOutcome> {
        let table = self.dialect.qualified_table_name(self.names);
        let transactional = self.dialect.supports_transactional_ddl();

        if transactional {
            self.transaction_control("BEGIN").await?;
        }

        let result = self.read_and_reseed(&table).await;

        if transactional {
            match &result {
                Ok(_) => self.transaction_control("COMMIT").await?,
                Err(_) => {
                    // Best-effort: the original error is what matters.
                    if let Err(e) = self.session.execute("ROLLBACK").await {
                        warn!(error = %e, "Rollback after failed repair also failed");
                    }
                }
            }
        }

        result
    }

    async fn read_and_reseed(&self, table: &str) -> StoreResult<RepairOutcome> {
        let offset_column = &self.names.columns.global_offset;

        let query = max_offset_query(table, offset_column);
        let observed_max =
            self.session
                .query_opt_i64(&query)
                .await
                .map_err(|e| StoreError::Query {
                    statement: query.clone(),
                    message: e.to_string(),
                })?;

        let Some(observed_max) = observed_max else {
            debug!(table, "Table is empty, offset generator left untouched");
            return Ok(RepairOutcome::SkippedEmptyTable);
        };

        let statements = match self.dialect.repair_plan(self.names, observed_max) {
            RepairPlan::Direct(statements) => statements,
            RepairPlan::Resolve(lookup) => {
                let resolved = self
                    .session
                    .query_opt_text(lookup.query())
                    .await
                    .map_err(|e| StoreError::Query {
                        statement: lookup.query().to_string(),
                        message: e.to_string(),
                    })?;

                let Some(sequence) = resolved else {
                    return Err(StoreError::SequenceResolution {
                        dialect: self.dialect,
                        sequence: lookup.sequence_hint().to_string(),
                    });
                };

                lookup.statements_for(&sequence)
            }
        };

        for statement in &statements {
            self.session
                .execute(statement)
                .await
                .map_err(|e| StoreError::Repair {
                    dialect: self.dialect,
                    statement: statement.clone(),
                    message: e.to_string(),
                })?;
        }

        info!(
            dialect = %self.dialect,
            table,
            observed_max,
            next_offset = observed_max + 1,
            "Realigned offset generator"
        );

        Ok(RepairOutcome::Repaired {
            observed_max,
            next_offset: observed_max + 1,
        })
    }

    async fn transaction_control(&self, statement: &str) -> StoreResult<()> {
        self.session
            .execute(statement)
            .await
            .map_err(|e| StoreError::Query {
                statement: statement.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
