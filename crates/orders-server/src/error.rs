//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::features::analytics::AnalyticsError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// An analytics query failed; `context` is the client-facing summary
    #[error("{context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: AnalyticsError,
    },
}

impl AppError {
    /// Wrap a query failure with a client-facing summary
    ///
    /// ```ignore
    /// repo.top_products(5).await.map_err(AppError::query("Failed to fetch top products"))?;
    /// ```
    pub fn query(context: &'static str) -> impl FnOnce(AnalyticsError) -> AppError {
        move |source| AppError::Query { context, source }
    }

    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Query { context, source } => {
                tracing::error!(error = %source, "{}", context);
                ErrorResponse::new(*context, source.to_string())
            }
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_error_body() {
        let err = AppError::query("Failed to fetch monthly revenue")(AnalyticsError::Database(
            sqlx::Error::PoolTimedOut,
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Failed to fetch monthly revenue");
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("pool timed out"));
    }
}
