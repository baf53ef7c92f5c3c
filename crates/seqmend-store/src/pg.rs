//! Postgres durable-state DAO.
//!
//! The write path keeps exactly one row per entity (overwrite, never
//! append) and lets the backend generate `global_offset`. An overwrite also
//! draws a fresh offset from the owning sequence, so every write is visible
//! to offset-ordered consumers.

use tracing::{debug, info};

use seqmend_core::{
    clamp_limit, create_table_statements, max_offset_query, Dialect, DurableStateRow,
    NewDurableStateRow, TableNames,
};

use crate::error::{StoreError, StoreResult};
use crate::session::{PgSession, SqlSession};

/// Postgres-backed durable-state store.
pub struct PostgresDurableStateStore {
    session: PgSession,
    names: TableNames,
}

impl PostgresDurableStateStore {
    /// Connect to Postgres.
    pub async fn connect(connection_string: &str, names: TableNames) -> StoreResult<Self> {
        let session = PgSession::connect(connection_string).await?;
        Ok(Self { session, names })
    }

    /// Wrap an existing session (for connection pooling or tests).
    pub fn from_session(session: PgSession, names: TableNames) -> Self {
        Self { session, names }
    }

    /// The underlying session, e.g. to run the offset repair on the same
    /// connection as the store.
    pub fn session(&self) -> &PgSession {
        &self.session
    }

    /// Create the durable-state table if it does not exist yet.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let table = self.names.qualified();
        let probe = format!("SELECT to_regclass('{table}')::text");

        if self.session.query_opt_text(&probe).await?.is_some() {
            debug!(table = %table, "Durable-state table already exists");
            return Ok(());
        }

        for statement in create_table_statements(Dialect::Postgres, &self.names) {
            self.session.execute(&statement).await?;
        }
        info!(table = %table, "Durable-state schema initialized");
        Ok(())
    }

    /// Insert or overwrite the latest state of an entity.
    ///
    /// At most one row exists per `persistence_id`; a conflicting insert
    /// overwrites the previous row and draws a fresh `global_offset`.
    pub async fn upsert_state(&self, row: &NewDurableStateRow) -> StoreResult<()> {
        self.session
            .client()
            .execute(
                upsert_sql(&self.names).as_str(),
                &[
                    &row.persistence_id,
                    &row.seq_number,
                    &row.state_payload,
                    &row.tag,
                    &row.state_ser_id,
                    &row.state_ser_manifest,
                    &row.state_timestamp,
                ],
            )
            .await
            .map_err(|e| StoreError::Session(e.into()))?;
        Ok(())
    }

    /// Read the latest state of an entity, if any.
    pub async fn get_state(&self, persistence_id: &str) -> StoreResult<Option<DurableStateRow>> {
        let row = self
            .session
            .client()
            .query_opt(select_one_sql(&self.names).as_str(), &[&persistence_id])
            .await
            .map_err(|e| StoreError::Session(e.into()))?;

        Ok(row.map(|r| DurableStateRow {
            global_offset: r.get(0),
            persistence_id: r.get(1),
            seq_number: r.get(2),
            state_payload: r.get(3),
            tag: r.get(4),
            state_ser_id: r.get(5),
            state_ser_manifest: r.get(6),
            state_timestamp: r.get(7),
        }))
    }

    /// Read up to `limit` rows ordered by `global_offset`.
    pub async fn rows_ordered_by_offset(&self, limit: u64) -> StoreResult<Vec<DurableStateRow>> {
        let rows = self
            .session
            .client()
            .query(select_ordered_sql(&self.names, limit).as_str(), &[])
            .await
            .map_err(|e| StoreError::Session(e.into()))?;

        Ok(rows
            .into_iter()
            .map(|r| DurableStateRow {
                global_offset: r.get(0),
                persistence_id: r.get(1),
                seq_number: r.get(2),
                state_payload: r.get(3),
                tag: r.get(4),
                state_ser_id: r.get(5),
                state_ser_manifest: r.get(6),
                state_timestamp: r.get(7),
            })
            .collect())
    }

    /// Current maximum `global_offset`, or `None` for an empty table.
    pub async fn max_global_offset(&self) -> StoreResult<Option<i64>> {
        let query = max_offset_query(&self.names.qualified(), &self.names.columns.global_offset);
        self.session
            .query_opt_i64(&query)
            .await
            .map_err(|e| StoreError::Query {
                statement: query.clone(),
                message: e.to_string(),
            })
    }
}

fn column_list(names: &TableNames) -> String {
    let c = &names.columns;
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}",
        c.global_offset,
        c.persistence_id,
        c.seq_number,
        c.state_payload,
        c.tag,
        c.state_ser_id,
        c.state_ser_manifest,
        c.state_timestamp
    )
}

fn upsert_sql(names: &TableNames) -> String {
    let table = names.qualified();
    let c = &names.columns;
    format!(
        "INSERT INTO {table} \
         ({pid}, {seq}, {payload}, {tag}, {ser_id}, {ser_manifest}, {ts}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT ({pid}) DO UPDATE SET \
         {offset} = nextval(pg_get_serial_sequence('{table}', '{offset}')), \
         {seq} = EXCLUDED.{seq}, \
         {payload} = EXCLUDED.{payload}, \
         {tag} = EXCLUDED.{tag}, \
         {ser_id} = EXCLUDED.{ser_id}, \
         {ser_manifest} = EXCLUDED.{ser_manifest}, \
         {ts} = EXCLUDED.{ts}",
        pid = c.persistence_id,
        seq = c.seq_number,
        payload = c.state_payload,
        tag = c.tag,
        ser_id = c.state_ser_id,
        ser_manifest = c.state_ser_manifest,
        ts = c.state_timestamp,
        offset = c.global_offset,
    )
}

fn select_one_sql(names: &TableNames) -> String {
    format!(
        "SELECT {columns} FROM {table} WHERE {pid} = $1",
        columns = column_list(names),
        table = names.qualified(),
        pid = names.columns.persistence_id,
    )
}

fn select_ordered_sql(names: &TableNames, limit: u64) -> String {
    format!(
        "SELECT {columns} FROM {table} ORDER BY {offset} LIMIT {limit}",
        columns = column_list(names),
        table = names.qualified(),
        offset = names.columns.global_offset,
        limit = clamp_limit(limit),
    )
}
