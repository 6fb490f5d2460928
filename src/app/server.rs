use crate::core::comparator::PriceComparator;
use crate::domain::model::PriceQuery;
use crate::utils::error::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const MISSING_PARAMS: &str = "Domain and extension are required.";
pub const FETCH_FAILED: &str = "Failed to fetch domain prices.";

#[derive(Clone)]
pub struct AppState {
    comparator: Arc<PriceComparator>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareParams {
    pub domain: Option<String>,
    pub extension: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn response(status: StatusCode, message: &str) -> Response {
        (
            status,
            Json(ErrorBody {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(comparator: Arc<PriceComparator>) -> Router {
    Router::new()
        .route("/compare", get(compare_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { comparator })
}

async fn compare_handler(State(state): State<AppState>, Query(params): Query<CompareParams>) -> Response {
    // 缺參數時直接回 400，不啟動任何爬蟲
    let query = match PriceQuery::from_optional(params.domain.as_deref(), params.extension.as_deref()) {
        Ok(query) => query,
        Err(e) => {
            tracing::warn!("Rejected /compare request: {}", e);
            return ErrorBody::response(StatusCode::BAD_REQUEST, MISSING_PARAMS);
        }
    };

    match state.comparator.compare(&query).await {
        Ok(prices) => (StatusCode::OK, Json(prices)).into_response(),
        Err(e) => {
            tracing::error!(
                "❌ Error fetching prices for {}: {} (Category: {:?}, Severity: {:?})",
                query,
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            ErrorBody::response(StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED)
        }
    }
}

pub async fn serve(
    addr: SocketAddr,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 Server is running on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("🛑 Shutdown signal received, finishing in-flight comparisons");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_params_accept_partial_query() {
        let params: CompareParams = serde_json::from_value(serde_json::json!({"domain": "example"})).unwrap();
        assert_eq!(params.domain.as_deref(), Some("example"));
        assert!(params.extension.is_none());
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            error: MISSING_PARAMS.to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"error": "Domain and extension are required."})
        );
    }
}
