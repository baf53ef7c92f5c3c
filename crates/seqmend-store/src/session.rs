//! Explicit connection-handle injection.
//!
//! The repairer and the migrator take a [`SqlSession`] rather than opening
//! connections themselves: connection pooling, TLS and credentials belong
//! to the caller. All statements of one repair run must go through the same
//! session so the max-offset read and the reseed see the same table state.

use std::future::Future;

use tokio_postgres::Client;
use tracing::error;

use crate::error::{SessionError, SessionResult};

/// A single database session.
pub trait SqlSession: Send + Sync {
    /// Run a statement returning at most one row with one nullable 64-bit
    /// integer column. No row and a NULL value both map to `None`
    /// (an aggregate `MAX` over an empty table returns one NULL row).
    fn query_opt_i64(
        &self,
        statement: &str,
    ) -> impl Future<Output = SessionResult<Option<i64>>> + Send;

    /// Run a statement returning at most one row with one nullable text
    /// column. Used for catalog lookups that resolve sequence names.
    fn query_opt_text(
        &self,
        statement: &str,
    ) -> impl Future<Output = SessionResult<Option<String>>> + Send;

    /// Execute a statement, returning the affected row count.
    fn execute(&self, statement: &str) -> impl Future<Output = SessionResult<u64>> + Send;
}

/// Session over a `tokio_postgres` connection.
pub struct PgSession {
    client: Client,
}

impl PgSession {
    /// Connect to Postgres and spawn the connection driver task.
    pub async fn connect(connection_string: &str) -> SessionResult<Self> {
        let (client, connection) =
            tokio_postgres::connect(connection_string, tokio_postgres::NoTls)
                .await
                .map_err(|e| SessionError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Postgres connection error");
            }
        });

        Ok(Self { client })
    }

    /// Wrap an existing client (for connection pooling or tests).
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }
}

impl SqlSession for PgSession {
    fn query_opt_i64(
        &self,
        statement: &str,
    ) -> impl Future<Output = SessionResult<Option<i64>>> + Send {
        async move {
            let row = self.client.query_opt(statement, &[]).await?;
            Ok(row.and_then(|r| r.get::<_, Option<i64>>(0)))
        }
    }

    fn query_opt_text(
        &self,
        statement: &str,
    ) -> impl Future<Output = SessionResult<Option<String>>> + Send {
        async move {
            let row = self.client.query_opt(statement, &[]).await?;
            Ok(row.and_then(|r| r.get::<_, Option<String>>(0)))
        }
    }

    fn execute(&self, statement: &str) -> impl Future<Output = SessionResult<u64>> + Send {
        async move { Ok(self.client.execute(statement, &[]).await?) }
    }
}
