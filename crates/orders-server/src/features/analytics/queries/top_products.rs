//! Top products query
//!
//! Products ranked by summed sales, highest first.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::AnalyticsError;

/// Default number of products returned
pub const DEFAULT_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TopProductsQuery {
    pub limit: i64,
}

impl Default for TopProductsQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: Option<String>,
    pub total_sales: f64,
}

pub async fn handle(pool: &PgPool, query: TopProductsQuery) -> Result<Vec<TopProduct>, AnalyticsError> {
    let products = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT document->>'Product ID' AS product_id,
               COALESCE(SUM((document->>'Sales')::float8), 0)::float8 AS total_sales
        FROM orders
        GROUP BY document->>'Product ID'
        ORDER BY total_sales DESC, product_id
        LIMIT $1
        "#,
    )
    .bind(query.limit.max(0))
    .fetch_all(pool)
    .await?;

    Ok(products)
}
