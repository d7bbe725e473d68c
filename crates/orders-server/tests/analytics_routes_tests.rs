//! HTTP contract tests for the analytics API
//!
//! These tests verify:
//! - Every analytics route answers with the success envelope
//! - Query failures map to 500 with the route-specific error body
//! - Health check endpoint works

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use orders_server::{
    api,
    config::Config,
    features::{
        analytics::{
            AnalyticsError, AnalyticsRepository, CategoryAvgSales, MonthlyRevenue, TopProduct,
            TopProductsQuery, YearlyGrowth,
        },
        FeatureState,
    },
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt; // for `oneshot`

/// Repository returning canned rows, or failing every call
#[derive(Default)]
struct StubRepository {
    fail: bool,
    top_products_limits: Mutex<Vec<i64>>,
}

fn failure() -> AnalyticsError {
    AnalyticsError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl AnalyticsRepository for StubRepository {
    async fn top_products(&self, query: TopProductsQuery) -> Result<Vec<TopProduct>, AnalyticsError> {
        self.top_products_limits.lock().unwrap().push(query.limit);
        if self.fail {
            return Err(failure());
        }
        Ok(vec![
            TopProduct {
                product_id: Some("TEC-CO-10004722".into()),
                total_sales: 61599.82,
            },
            TopProduct {
                product_id: Some("OFF-BI-10003527".into()),
                total_sales: 27453.38,
            },
        ])
    }

    async fn monthly_revenue(&self) -> Result<Vec<MonthlyRevenue>, AnalyticsError> {
        if self.fail {
            return Err(failure());
        }
        Ok(vec![MonthlyRevenue {
            year: 2017,
            month: 11,
            revenue: 1250.5,
        }])
    }

    async fn category_avg_sales(&self) -> Result<Vec<CategoryAvgSales>, AnalyticsError> {
        if self.fail {
            return Err(failure());
        }
        Ok(vec![CategoryAvgSales {
            category: Some("Furniture".into()),
            subcategory: Some("Chairs".into()),
            avg_sales: Some(532.33),
        }])
    }

    async fn yearly_growth(&self) -> Result<Vec<YearlyGrowth>, AnalyticsError> {
        if self.fail {
            return Err(failure());
        }
        Ok(vec![
            YearlyGrowth {
                year: 2021,
                total_sales: 100.0,
                growth_percent: None,
            },
            YearlyGrowth {
                year: 2022,
                total_sales: 150.0,
                growth_percent: Some(50.0),
            },
        ])
    }
}

fn app(repo: Arc<StubRepository>) -> Router {
    api::create_router(FeatureState { analytics: repo }, &Config::default())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app(Arc::default()), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_top_products() {
    let repo = Arc::new(StubRepository::default());
    let (status, body) = get(app(repo.clone()), "/api/analytics/top-products").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["data"][0],
        json!({"product_id": "TEC-CO-10004722", "total_sales": 61599.82})
    );
    assert_eq!(*repo.top_products_limits.lock().unwrap(), vec![5]);
}

#[tokio::test]
async fn test_monthly_revenue() {
    let (status, body) = get(app(Arc::default()), "/api/analytics/monthly-revenue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": [{"year": 2017, "month": 11, "revenue": 1250.5}], "status": "success"})
    );
}

#[tokio::test]
async fn test_category_avg_sales() {
    let (status, body) = get(app(Arc::default()), "/api/analytics/category-avg-sales").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"][0],
        json!({"category": "Furniture", "subcategory": "Chairs", "avg_sales": 532.33})
    );
}

#[tokio::test]
async fn test_yearly_growth_first_year_is_null() {
    let (status, body) = get(app(Arc::default()), "/api/analytics/yearly-growth").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([
            {"year": 2021, "total_sales": 100.0, "growth_percent": null},
            {"year": 2022, "total_sales": 150.0, "growth_percent": 50.0},
        ])
    );
}

#[tokio::test]
async fn test_failures_use_error_envelope() {
    let cases = [
        ("/api/analytics/top-products", "Failed to fetch top products"),
        ("/api/analytics/monthly-revenue", "Failed to fetch monthly revenue"),
        (
            "/api/analytics/category-avg-sales",
            "Failed to fetch category average sales",
        ),
        ("/api/analytics/yearly-growth", "Failed to fetch yearly growth"),
    ];

    for (uri, error) in cases {
        let repo = Arc::new(StubRepository {
            fail: true,
            ..Default::default()
        });
        let (status, body) = get(app(repo), uri).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(body["error"], error);
        assert_eq!(body["status"], "error");
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = app(Arc::default())
        .oneshot(
            Request::builder()
                .uri("/api/analytics/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
