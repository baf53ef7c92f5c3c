mod error;
mod tables;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use tables::{ColumnConfig, DurableStateTableConfig};
pub use validation::{to_table_names, validate_table_config};
