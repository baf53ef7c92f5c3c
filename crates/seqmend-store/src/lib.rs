pub mod error;
pub mod migrate;
pub mod mock;
pub mod pg;
pub mod repair;
pub mod session;

pub use error::{SessionError, SessionResult, StoreError, StoreResult};
pub use migrate::{DurableStateMigrator, MigrationReport};
pub use mock::MockSession;
pub use pg::PostgresDurableStateStore;
pub use repair::{OffsetRepairer, RepairOutcome};
pub use session::{PgSession, SqlSession};
