//! Monthly revenue query
//!
//! Summed sales per calendar month, ordered by year then month. Orders
//! without an order date are left out.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::AnalyticsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: i32,
    pub revenue: f64,
}

pub async fn handle(pool: &PgPool) -> Result<Vec<MonthlyRevenue>, AnalyticsError> {
    let months = sqlx::query_as::<_, MonthlyRevenue>(
        r#"
        SELECT EXTRACT(YEAR FROM (document->>'Order Date')::date)::int4 AS year,
               EXTRACT(MONTH FROM (document->>'Order Date')::date)::int4 AS month,
               COALESCE(SUM((document->>'Sales')::float8), 0)::float8 AS revenue
        FROM orders
        WHERE document->>'Order Date' IS NOT NULL
        GROUP BY 1, 2
        ORDER BY 1, 2
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(months)
}
