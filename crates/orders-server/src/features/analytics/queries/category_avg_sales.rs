//! Average sales per category and sub-category, ordered by category

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::AnalyticsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryAvgSales {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Null when no order in the group has a sales value
    pub avg_sales: Option<f64>,
}

pub async fn handle(pool: &PgPool) -> Result<Vec<CategoryAvgSales>, AnalyticsError> {
    let rows = sqlx::query_as::<_, CategoryAvgSales>(
        r#"
        SELECT document->>'Category' AS category,
               document->>'Sub-Category' AS subcategory,
               AVG((document->>'Sales')::float8)::float8 AS avg_sales
        FROM orders
        GROUP BY 1, 2
        ORDER BY 1, 2
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
