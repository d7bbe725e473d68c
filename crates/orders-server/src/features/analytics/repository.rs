//! Analytics data access
//!
//! Routes depend on [`AnalyticsRepository`] rather than on a pool so the HTTP
//! contract can be exercised without a database.

use async_trait::async_trait;
use sqlx::PgPool;

use super::queries::{
    category_avg_sales::{self, CategoryAvgSales},
    monthly_revenue::{self, MonthlyRevenue},
    top_products::{self, TopProduct, TopProductsQuery},
    yearly_growth::{self, YearlyGrowth},
    AnalyticsError,
};

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn top_products(&self, query: TopProductsQuery) -> Result<Vec<TopProduct>, AnalyticsError>;

    async fn monthly_revenue(&self) -> Result<Vec<MonthlyRevenue>, AnalyticsError>;

    async fn category_avg_sales(&self) -> Result<Vec<CategoryAvgSales>, AnalyticsError>;

    async fn yearly_growth(&self) -> Result<Vec<YearlyGrowth>, AnalyticsError>;
}

#[derive(Clone)]
pub struct PgAnalyticsRepository {
    pool: PgPool,
}

impl PgAnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn top_products(&self, query: TopProductsQuery) -> Result<Vec<TopProduct>, AnalyticsError> {
        top_products::handle(&self.pool, query).await
    }

    async fn monthly_revenue(&self) -> Result<Vec<MonthlyRevenue>, AnalyticsError> {
        monthly_revenue::handle(&self.pool).await
    }

    async fn category_avg_sales(&self) -> Result<Vec<CategoryAvgSales>, AnalyticsError> {
        category_avg_sales::handle(&self.pool).await
    }

    async fn yearly_growth(&self) -> Result<Vec<YearlyGrowth>, AnalyticsError> {
        yearly_growth::handle(&self.pool).await
    }
}
