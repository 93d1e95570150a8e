//! Native SQLite Database Adapter
//!
//! Implements the `DatabaseAdapter` trait using `sqlx` with the native SQLite
//! driver. This implementation is used on desktop platforms.
//!
//! ## Features
//!
//! - Connection pooling with configurable limits
//! - WAL mode for better concurrency
//! - Atomic batch execution via transactions

use async_trait::async_trait;
use bridge_traits::database::{DatabaseAdapter, DatabaseConfig, QueryRow, QueryValue};
use bridge_traits::error::{BridgeError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Column, Pool, Row, Sqlite, TypeInfo, ValueRef};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Native SQLite implementation of DatabaseAdapter
///
/// Wraps a `sqlx::Pool<Sqlite>`. One adapter instance is opened per process
/// and shared by every consumer; it is never reopened per operation.
pub struct SqliteAdapter {
    pool: Pool<Sqlite>,
}

impl SqliteAdapter {
    /// Create a new SqliteAdapter with the given configuration.
    ///
    /// Establishes the connection pool and configures SQLite options.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or pool creation fails.
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        info!(
            database_url = %config.database_url,
            min_connections = config.min_connections,
            max_connections = config.max_connections,
            "Creating SQLite database adapter"
        );

        let connect_options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| BridgeError::DatabaseError(format!("Invalid database URL: {}", e)))?
            // WAL mode for better concurrency
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous mode for good balance of safety and speed
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to create connection pool");
                BridgeError::DatabaseError(format!("Connection pool creation failed: {}", e))
            })?;

        info!(connections = pool.size(), "SQLite connection pool created");

        Ok(Self { pool })
    }

    /// Create a new SqliteAdapter from an existing pool
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Convert a sqlx Row to a QueryRow (HashMap).
    ///
    /// Decodes by the stored value's runtime type so that numeric-looking
    /// TEXT values are not coerced to integers.
    fn row_to_query_row(row: &sqlx::sqlite::SqliteRow) -> QueryRow {
        let mut result = HashMap::new();

        for column in row.columns() {
            let column_name = column.name().to_string();
            let ordinal = column.ordinal();

            let value = match row.try_get_raw(ordinal) {
                Ok(raw) if raw.is_null() => QueryValue::Null,
                Ok(raw) => match raw.type_info().name() {
                    "INTEGER" => row
                        .try_get::<i64, _>(ordinal)
                        .map(QueryValue::Integer)
                        .unwrap_or(QueryValue::Null),
                    "REAL" => row
                        .try_get::<f64, _>(ordinal)
                        .map(QueryValue::Real)
                        .unwrap_or(QueryValue::Null),
                    "BLOB" => row
                        .try_get::<Vec<u8>, _>(ordinal)
                        .map(QueryValue::Blob)
                        .unwrap_or(QueryValue::Null),
                    _ => row
                        .try_get::<String, _>(ordinal)
                        .map(QueryValue::Text)
                        .unwrap_or(QueryValue::Null),
                },
                Err(_) => QueryValue::Null,
            };

            result.insert(column_name, value);
        }

        result
    }

    /// Convert QueryValue parameters to sqlx-compatible format
    fn bind_params<'q>(
        query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        params: &'q [QueryValue],
    ) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        let mut query = query;
        for param in params {
            query = match param {
                QueryValue::Null => query.bind(None::<i64>),
                QueryValue::Integer(i) => query.bind(i),
                QueryValue::Real(r) => query.bind(r),
                QueryValue::Text(s) => query.bind(s.as_str()),
                QueryValue::Blob(b) => query.bind(b.as_slice()),
            };
        }
        query
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    async fn query(&self, query: &str, params: &[QueryValue]) -> Result<Vec<QueryRow>> {
        debug!(query = %query, param_count = params.len(), "Executing query");

        let sqlx_query = sqlx::query(query);
        let sqlx_query = Self::bind_params(sqlx_query, params);

        let rows = sqlx_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Query failed: {}", e)))?;

        let result: Vec<QueryRow> = rows.iter().map(Self::row_to_query_row).collect();

        debug!(row_count = result.len(), "Query executed successfully");
        Ok(result)
    }

    async fn execute(&self, statement: &str, params: &[QueryValue]) -> Result<u64> {
        debug!(statement = %statement, param_count = params.len(), "Executing statement");

        let sqlx_query = sqlx::query(statement);
        let sqlx_query = Self::bind_params(sqlx_query, params);

        let result = sqlx_query
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Execute failed: {}", e)))?;

        let rows_affected = result.rows_affected();
        debug!(rows_affected, "Statement executed successfully");

        Ok(rows_affected)
    }

    async fn query_one_optional(
        &self,
        query: &str,
        params: &[QueryValue],
    ) -> Result<Option<QueryRow>> {
        debug!(query = %query, param_count = params.len(), "Executing query_one_optional");

        let sqlx_query = sqlx::query(query);
        let sqlx_query = Self::bind_params(sqlx_query, params);

        let row = sqlx_query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Query one optional failed: {}", e)))?;

        Ok(row.as_ref().map(Self::row_to_query_row))
    }

    async fn execute_batch(&self, statements: &[(&str, &[QueryValue])]) -> Result<Vec<u64>> {
        debug!(statement_count = statements.len(), "Executing statement batch");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Begin transaction failed: {}", e)))?;

        let mut counts = Vec::with_capacity(statements.len());
        for (statement, params) in statements {
            let sqlx_query = Self::bind_params(sqlx::query(statement), params);
            let result = sqlx_query.execute(&mut *tx).await.map_err(|e| {
                warn!(error = %e, "Batch statement failed, rolling back");
                BridgeError::DatabaseError(format!("Batch statement failed: {}", e))
            })?;
            counts.push(result.rows_affected());
        }

        tx.commit()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Commit failed: {}", e)))?;

        Ok(counts)
    }
}
