pub mod dialect;
pub mod error;
pub mod names;
pub mod row;
pub mod schema;

pub use dialect::{Dialect, RepairPlan, SequenceLookup};
pub use error::{Error, Result};
pub use names::{ColumnNames, TableNames};
pub use row::{DurableStateRow, NewDurableStateRow};
pub use schema::{clamp_limit, create_table_statements, max_offset_query};
