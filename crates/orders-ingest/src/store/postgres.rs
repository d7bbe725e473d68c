//! PostgreSQL-backed order store
//!
//! Each order is one row of the `orders` table with the transformed record in
//! a JSONB `document` column. Lookup indexes are expression indexes on
//! `document->>'<field>'`.

use async_trait::async_trait;
use orders_common::types::ORDERS_TABLE;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::{debug, info, warn};

use super::{BulkInsertReport, DocumentFailure, OrderStore, StoreError};
use crate::config::DatabaseConfig;

/// Rows per multi-row `INSERT`, well under the bind parameter limit
const MAX_INSERT_ROWS: usize = 1000;

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Build a pool without connecting; the first `ping` opens a connection
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_one<'e, E>(executor: E, document: &Value) -> Result<(), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query("INSERT INTO orders (document) VALUES ($1)")
            .bind(Json(document))
            .execute(executor)
            .await
            .map(|_| ())
    }

    /// Insert each document in its own autocommit statement
    async fn insert_individually(&self, documents: &[Value]) -> BulkInsertReport {
        let mut report = BulkInsertReport::default();
        for (index, document) in documents.iter().enumerate() {
            match Self::insert_one(&self.pool, document).await {
                Ok(()) => report.inserted += 1,
                Err(e) => report.failures.push(DocumentFailure {
                    index,
                    message: e.to_string(),
                }),
            }
        }
        report
    }
}

/// Name of the expression index on `field`
pub fn index_name(field: &str) -> String {
    let sanitized: String = field
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("idx_{}_{}", ORDERS_TABLE, sanitized)
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn prepare_schema(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    async fn create_index(&self, field: &str) -> Result<(), StoreError> {
        let name = index_name(field);
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ((document->>'{}'))",
            name,
            ORDERS_TABLE,
            field.replace('\'', "''")
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        debug!(index = %name, field = %field, "Index ensured");
        Ok(())
    }

    async fn insert_unordered(&self, documents: &[Value]) -> Result<BulkInsertReport, StoreError> {
        if documents.is_empty() {
            return Ok(BulkInsertReport::default());
        }

        // Fast path: whole batch in one transaction of multi-row inserts
        let mut tx = self.pool.begin().await?;
        let mut failure = None;
        for (chunk_index, chunk) in documents.chunks(MAX_INSERT_ROWS).enumerate() {
            let mut query_builder = sqlx::QueryBuilder::new("INSERT INTO orders (document) ");
            query_builder.push_values(chunk, |mut b, document| {
                b.push_bind(Json(document));
            });

            if let Err(e) = query_builder.build().execute(&mut *tx).await {
                failure = Some((chunk_index * MAX_INSERT_ROWS, e));
                break;
            }
        }

        match failure {
            None => match tx.commit().await {
                Ok(()) => {
                    return Ok(BulkInsertReport {
                        inserted: documents.len(),
                        failures: Vec::new(),
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Batch commit failed, inserting documents individually");
                }
            },
            Some((chunk_start, e)) => {
                drop(tx);
                warn!(
                    chunk_start = chunk_start,
                    error = %e,
                    "Batch insert failed, inserting documents individually"
                );
            }
        }

        Ok(self.insert_individually(documents).await)
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("Database pool closed");
    }
}
