//! Analytics routes
//!
//! Public read-only routes. Every route answers with the standard envelope
//! and maps query failures to a 500 with a route-specific summary.

use axum::{extract::State, routing::get, Router};
use std::sync::Arc;

use super::queries::{
    category_avg_sales::CategoryAvgSales, monthly_revenue::MonthlyRevenue,
    top_products::{TopProduct, TopProductsQuery}, yearly_growth::YearlyGrowth,
};
use super::repository::AnalyticsRepository;
use crate::api::response::ApiResponse;
use crate::error::AppError;

type Repo = Arc<dyn AnalyticsRepository>;

/// Create analytics routes
pub fn analytics_routes() -> Router<Repo> {
    Router::new()
        .route("/top-products", get(top_products))
        .route("/monthly-revenue", get(monthly_revenue))
        .route("/category-avg-sales", get(category_avg_sales))
        .route("/yearly-growth", get(yearly_growth))
}

/// GET /top-products
async fn top_products(State(repo): State<Repo>) -> Result<ApiResponse<Vec<TopProduct>>, AppError> {
    let products = repo
        .top_products(TopProductsQuery::default())
        .await
        .map_err(AppError::query("Failed to fetch top products"))?;
    Ok(ApiResponse::success(products))
}

/// GET /monthly-revenue
async fn monthly_revenue(
    State(repo): State<Repo>,
) -> Result<ApiResponse<Vec<MonthlyRevenue>>, AppError> {
    let months = repo
        .monthly_revenue()
        .await
        .map_err(AppError::query("Failed to fetch monthly revenue"))?;
    Ok(ApiResponse::success(months))
}

/// GET /category-avg-sales
async fn category_avg_sales(
    State(repo): State<Repo>,
) -> Result<ApiResponse<Vec<CategoryAvgSales>>, AppError> {
    let rows = repo
        .category_avg_sales()
        .await
        .map_err(AppError::query("Failed to fetch category average sales"))?;
    Ok(ApiResponse::success(rows))
}

/// GET /yearly-growth
async fn yearly_growth(
    State(repo): State<Repo>,
) -> Result<ApiResponse<Vec<YearlyGrowth>>, AppError> {
    let years = repo
        .yearly_growth()
        .await
        .map_err(AppError::query("Failed to fetch yearly growth"))?;
    Ok(ApiResponse::success(years))
}
