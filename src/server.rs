// 🌐 HTTP query boundary for the sales viewer
//
// Serves the region query engine over JSON. State is the immutable
// snapshot, so handlers never lock.

use crate::query::{query_region, RegionSelector, SalesSnapshot, SeriesPoint};
use crate::records::DerivedSalesRecord;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_http::cors::CorsLayer;
use tracing::warn;

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegionParams {
    region: Option<String>,
}

impl RegionParams {
    fn selector(&self) -> &str {
        self.region.as_deref().unwrap_or("all")
    }
}

#[derive(Serialize)]
struct SalesResponse {
    label: String,
    rows: Vec<DerivedSalesRecord>,
}

#[derive(Serialize)]
struct SeriesResponse {
    label: String,
    series: Vec<SeriesPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    by_region: Option<BTreeMap<String, Vec<SeriesPoint>>>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/regions - Selector choices for the UI
async fn get_regions() -> impl IntoResponse {
    let choices: Vec<&str> = RegionSelector::choices().iter().map(|c| c.code()).collect();
    Json(ApiResponse::ok(choices))
}

/// GET /api/sales?region=<selector> - Rows for one selector
async fn get_sales(State(snapshot): State<SalesSnapshot>, Query(params): Query<RegionParams>) -> Response {
    match query_region(&snapshot, params.selector()) {
        Ok(result) => Json(ApiResponse::ok(SalesResponse {
            label: result.label,
            rows: result.rows,
        }))
        .into_response(),
        Err(e) => bad_request(e.to_string()),
    }
}

/// GET /api/series?region=<selector> - Aggregated time series for the chart
async fn get_series(State(snapshot): State<SalesSnapshot>, Query(params): Query<RegionParams>) -> Response {
    match query_region(&snapshot, params.selector()) {
        Ok(result) => {
            let by_region = match result.selector {
                RegionSelector::All => Some(result.series_by_region()),
                RegionSelector::Region(_) => None,
            };
            let series = result.series();

            Json(ApiResponse::ok(SeriesResponse {
                label: result.label,
                series,
                by_region,
            }))
            .into_response()
        }
        Err(e) => bad_request(e.to_string()),
    }
}

fn bad_request(message: String) -> Response {
    warn!("rejected query: {}", message);
    (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(message))).into_response()
}

/// Build the router over a loaded snapshot
pub fn router(snapshot: SalesSnapshot) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/regions", get(get_regions))
        .route("/sales", get(get_sales))
        .route("/series", get(get_series))
        .with_state(snapshot);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::Value;
    use tower::ServiceExt;

    fn snapshot() -> SalesSnapshot {
        let day = NaiveDate::from_ymd_opt(2021, 1, 15).unwrap();
        SalesSnapshot::new(vec![
            DerivedSalesRecord::new(day, "north", Decimal::new(1000, 2)),
            DerivedSalesRecord::new(day, "east", Decimal::new(250, 2)),
        ])
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = router(snapshot())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_sales_defaults_to_all() {
        let (status, body) = get_json("/api/sales").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["label"], "Sales Across All Regions");
        assert_eq!(body["data"]["rows"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sales_for_region() {
        let (status, body) = get_json("/api/sales?region=North").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["label"], "Sales in North Region");
        assert_eq!(body["data"]["rows"][0]["sales"], "10.00");
        assert_eq!(body["data"]["rows"][0]["date"], "2021-01-15");
    }

    #[tokio::test]
    async fn test_invalid_region_is_bad_request() {
        let (status, body) = get_json("/api/sales?region=mars").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("mars"));
    }

    #[tokio::test]
    async fn test_series_groups_by_region_for_all() {
        let (_, all) = get_json("/api/series?region=all").await;
        assert_eq!(all["data"]["series"][0]["sales"], "12.50");
        assert!(all["data"]["by_region"]["north"].is_array());

        let (_, south) = get_json("/api/series?region=south").await;
        assert_eq!(south["data"]["label"], "Sales in South Region");
        assert!(south["data"]["series"].as_array().unwrap().is_empty());
        assert!(south["data"].get("by_region").is_none());
    }
}
