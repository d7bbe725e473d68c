//! Order analytics
//!
//! Read-only aggregations over the `orders` document table. Sales figures are
//! read from the numeric `Sales` field and dates from the ISO `Order Date`
//! field written by the ingest pipeline.

pub mod queries;
pub mod repository;
pub mod routes;

pub use queries::{
    category_avg_sales::CategoryAvgSales,
    monthly_revenue::MonthlyRevenue,
    top_products::{TopProduct, TopProductsQuery},
    yearly_growth::{compute_growth, YearlyGrowth, YearlyTotal},
    AnalyticsError,
};
pub use repository::{AnalyticsRepository, PgAnalyticsRepository};
pub use routes::analytics_routes;
