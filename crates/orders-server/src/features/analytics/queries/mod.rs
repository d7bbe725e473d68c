pub mod category_avg_sales;
pub mod monthly_revenue;
pub mod top_products;
pub mod yearly_growth;

/// Error type for analytics queries
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
