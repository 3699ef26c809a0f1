//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/start", post(start_handler))
        .route("/pause", post(pause_handler))
        .route("/reset", post(reset_handler))
        .route("/goal", post(goal_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        create_router(AppState::for_tests(25))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn response_json(
        response: axum::response::Response,
    ) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_router().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_start_then_status_reports_running() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(post_json("/start", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "running");
        assert_eq!(json["timer"]["running"], true);

        let response = app.oneshot(get_request("/status")).await.unwrap();
        let json = response_json(response).await;
        assert_eq!(json["timer"]["running"], true);
        assert_eq!(json["timer"]["can_start"], false);
        assert_eq!(json["timer"]["can_pause"], true);
    }

    #[tokio::test]
    async fn test_start_twice_is_idempotent() {
        let app = test_router();
        app.clone().oneshot(post_json("/start", "{}")).await.unwrap();
        let response = app.oneshot(post_json("/start", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["message"], "Timer already running");
        assert_eq!(json["timer"]["running"], true);
    }

    #[tokio::test]
    async fn test_reset_clears_display() {
        let app = test_router();
        app.clone().oneshot(post_json("/start", "{}")).await.unwrap();
        let response = app.oneshot(post_json("/reset", "{}")).await.unwrap();
        let json = response_json(response).await;
        assert_eq!(json["status"], "idle");
        assert_eq!(json["timer"]["elapsed"], "00:00:00");
        assert_eq!(json["timer"]["progress_percent"], 0.0);
    }

    #[tokio::test]
    async fn test_goal_accepts_numbers_and_strings() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(post_json("/goal", r#"{"minutes": 40}"#))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["timer"]["goal_minutes"], 40);

        let response = app
            .oneshot(post_json("/goal", r#"{"minutes": "15"}"#))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["timer"]["goal_minutes"], 15);
    }

    #[tokio::test]
    async fn test_goal_clamps_and_defaults_bad_input() {
        let app = test_router();

        for (body, expected) in [
            (r#"{"minutes": "0"}"#, 1),
            (r#"{"minutes": ""}"#, 25),
            (r#"{"minutes": "soon"}"#, 25),
            (r#"{}"#, 25),
        ] {
            let response = app.clone().oneshot(post_json("/goal", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = response_json(response).await;
            assert_eq!(json["timer"]["goal_minutes"], expected, "body {}", body);
        }
    }
}
