
use anyhow::{Context, Result};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::Config;

const MAX_CONNECTIONS: u32 = 5;

/// Pooled connection to the live MySQL database. Connections are recycled
/// periodically and health-checked before reuse; the pool is created lazily
/// so an unreachable server surfaces per query, not at startup.
#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
}

/// Tabular result of a successful query, rendered to display strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Terminal outcome of one execution attempt. Exactly one of result or
/// error, never both, and the attempted SQL travels with either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success { sql: String, result: QueryResult },
    Failed { sql: String, error: String },
}

impl ExecutionOutcome {
    #[inline]
    pub fn sql(&self) -> &str {
        match self {
            Self::Success { sql, .. } | Self::Failed { sql, .. } => sql,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[inline]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

impl Database {
    /// Create the connection pool from config. Lazy: no I/O happens here.
    #[inline]
    pub fn connect(config: &Config) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.database.host)
            .port(config.database.port)
            .username(&config.database.user)
            .password(&config.database.password)
            .database(&config.database.name);

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
            .max_lifetime(Duration::from_secs(config.database.pool_recycle_secs))
            .test_before_acquire(true)
            .connect_lazy_with(options);

        debug!("Created MySQL pool for {}", config.database.display_url());

        Self { pool }
    }

    /// Round-trip connectivity check
    #[inline]
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    /// Run one SQL statement and capture whatever happens. Execution
    /// failures are logged with the offending statement and returned as a
    /// `Failed` outcome; this function never errors and never retries.
    #[inline]
    pub async fn execute(&self, sql: &str) -> ExecutionOutcome {
        debug!("Executing SQL: {}", sql);

        match sqlx::query(sql).fetch_all(&self.pool).await {
            Ok(rows) => {
                let result = collect_rows(&rows);
                info!("Query returned {} row(s)", result.row_count());
                ExecutionOutcome::Success {
                    sql: sql.to_string(),
                    result,
                }
            }
            Err(e) => {
                error!("Query execution failed: {} (sql: {})", e, sql);
                ExecutionOutcome::Failed {
                    sql: sql.to_string(),
                    error: e.to_string(),
                }
            }
        }
    }
}

fn collect_rows(rows: &[MySqlRow]) -> QueryResult {
    let columns = rows.first().map_or_else(Vec::new, |row| {
        row.columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect()
    });

    let rendered = rows
        .iter()
        .map(|row| {
            (0..row.columns().len())
                .map(|index| render_value(row, index))
                .collect()
        })
        .collect();

    QueryResult {
        columns,
        rows: rendered,
    }
}

/// Render one cell to a display string based on its MySQL column type
fn render_value(row: &MySqlRow, index: usize) -> String {
    let Ok(raw) = row.try_get_raw(index) else {
        return "<unreadable>".to_string();
    };

    if raw.is_null() {
        return "NULL".to_string();
    }

    let type_name = raw.type_info().name().to_string();
    drop(raw);

    let rendered = match type_name.as_str() {
        "BOOLEAN" => row.try_get::<bool, _>(index).map(|v| v.to_string()).ok(),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).map(|v| v.to_string()).ok()
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<u64, _>(index).map(|v| v.to_string()).ok(),
        "YEAR" => row
            .try_get_unchecked::<u64, _>(index)
            .map(|v| v.to_string())
            .ok(),
        "FLOAT" => row.try_get::<f32, _>(index).map(|v| v.to_string()).ok(),
        "DOUBLE" => row.try_get::<f64, _>(index).map(|v| v.to_string()).ok(),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(index)
            .map(|v| v.to_string())
            .ok(),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .map(|v| v.to_string())
            .ok(),
        "TIME" => row
            .try_get::<chrono::NaiveTime, _>(index)
            .map(|v| v.to_string())
            .ok(),
        // VARCHAR, CHAR, TEXT, ENUM, DECIMAL and friends all arrive as
        // text on the wire; skip the strict type check for the rest.
        _ => row.try_get_unchecked::<String, _>(index).ok(),
    };

    rendered.unwrap_or_else(|| format!("<{}>", type_name.to_lowercase()))
}
