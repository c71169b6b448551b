//! GET /analytics endpoint: computed task analytics plus insights.
//!
//! The handler composes the two facade calls into one response body:
//! `{ "analytics": TaskAnalytics, "insights": [ProductivityInsight] }`.
//! CORS is permissive; preflight requests short-circuit with 204 before
//! reaching any handler, and unmatched paths return a plain 404.

use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use taskpulse_core::types::{ProductivityInsight, TaskAnalytics, TimeRange};

use crate::error::ApiResult;
use crate::state::AppState;

/// Query parameters for the analytics endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    /// Lookback window; `week` when omitted
    #[serde(default)]
    pub time_range: TimeRange,
    /// User whose records are aggregated
    pub user_id: String,
}

/// Full analytics response body.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub analytics: TaskAnalytics,
    pub insights: Vec<ProductivityInsight>,
}

async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<AnalyticsResponse>> {
    // One report call so analytics and insights share an observation time
    let (analytics, insights) = state
        .service
        .analytics_report(&query.user_id, query.time_range)
        .await?;

    Ok(Json(AnalyticsResponse {
        analytics,
        insights,
    }))
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

/// Permissive CORS: preflight answers 204 on any path, every other
/// response carries the CORS headers.
async fn cors(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    response
}

/// Build the application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/analytics", get(get_analytics))
        .fallback(not_found)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use std::time::Duration as StdDuration;
    use taskpulse_core::types::{CognitiveLoad, TaskRecord, TaskStatus};
    use taskpulse_core::Database;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        taskpulse_core::logging::init_test();
        let db = Database::open_in_memory().expect("in-memory db");
        db.migrate().expect("migrate");
        AppState::new(db, StdDuration::from_secs(5))
    }

    fn seeded_state() -> AppState {
        let db = Database::open_in_memory().expect("in-memory db");
        db.migrate().expect("migrate");

        let now = Utc::now();
        for i in 0..4 {
            let created = now - Duration::days(1) - Duration::hours(i);
            let mut task =
                TaskRecord::new("u1", "seeded task", CognitiveLoad::Medium, "work");
            task.created_at = created;
            task.started_at = Some(created);
            if i < 3 {
                task.status = TaskStatus::Completed;
                task.completed_at = Some(created + Duration::minutes(30));
            }
            db.insert_task(&task).expect("insert");
        }

        AppState::new(db, StdDuration::from_secs(5))
    }

    async fn do_request(app: Router, method: Method, uri: &str) -> (StatusCode, HeaderMap, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_analytics_empty_store() {
        let app = create_app(test_state());
        let (status, _, body) =
            do_request(app, Method::GET, "/analytics?userId=u1&timeRange=week").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json.get("analytics").is_some());
        assert!(json["analytics"]["completionRate"].is_null());
        assert_eq!(json["analytics"]["cognitiveLoadDistribution"], serde_json::json!([]));
        assert_eq!(json["insights"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_analytics_with_seeded_data() {
        let app = create_app(seeded_state());
        let (status, _, body) =
            do_request(app, Method::GET, "/analytics?userId=u1&timeRange=week").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        let rate = json["analytics"]["completionRate"].as_f64().unwrap();
        assert_eq!(rate, 0.75);
        // 0.75 weekly completion fires the high-completion insight
        assert!(body.contains("High Task Completion Rate"));
    }

    #[tokio::test]
    async fn test_analytics_defaults_to_week() {
        let app = create_app(seeded_state());
        let (status, _, body) = do_request(app, Method::GET, "/analytics?userId=u1").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        // Same result as the explicit week query above
        assert_eq!(json["analytics"]["completionRate"].as_f64().unwrap(), 0.75);
    }

    #[tokio::test]
    async fn test_unmatched_path_returns_404() {
        let app = create_app(test_state());
        let (status, _, body) = do_request(app, Method::GET, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[tokio::test]
    async fn test_preflight_returns_204_with_cors() {
        let app = create_app(test_state());
        let (status, headers, _) = do_request(app, Method::OPTIONS, "/analytics").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_responses_carry_cors_headers() {
        let app = create_app(test_state());
        let (_, headers, _) =
            do_request(app, Method::GET, "/analytics?userId=u1").await;
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_store_failure_returns_error_envelope() {
        // Unmigrated database: every aggregation query fails
        let db = Database::open_in_memory().expect("in-memory db");
        let app = create_app(AppState::new(db, StdDuration::from_secs(5)));

        let (status, _, body) =
            do_request(app, Method::GET, "/analytics?userId=u1&timeRange=day").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json.get("error").is_some());
    }
}
