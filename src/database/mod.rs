// Live database module
// Pooled MySQL connection that generated queries are executed against

pub mod mysql;

pub use mysql::{Database, ExecutionOutcome, QueryResult};
