//! Route handlers for the gateway.

pub mod health;
pub mod transaction;

use std::path::Path;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Build the router with all API routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        .route("/v1/ping", get(health::ping))
        // API endpoints
        .route("/v1/transaction", post(transaction::create_transaction))
        .route("/v1/transaction/:id", get(transaction::get_transaction))
        .route("/v1/stats", get(transaction::stats))
}

/// Build the complete application: API routes, static file fallback and CORS.
pub fn app(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router()
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use database::Database;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app() -> (Router, Database, tempfile::TempDir) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("index.html"), "<h1>relay</h1>").unwrap();

        let app = app(AppState::new(db.clone()), static_dir.path());
        (app, db, static_dir)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn submission() -> Value {
        json!({
            "receiver": "+306912345678",
            "message": "hi",
            "sender": "Test",
            "priority": 1,
            "tactic": "fallback"
        })
    }

    #[tokio::test]
    async fn test_ping_and_health() {
        let (app, _db, _dir) = test_app().await;

        let response = app.clone().oneshot(get("/v1/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"PONG");

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_create_transaction() {
        let (app, _db, _dir) = test_app().await;

        let response = app
            .oneshot(post_json("/v1/transaction", submission()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["transaction"]["status"], "received");
        assert_eq!(body["transaction"]["tactic"], "fallback");
        assert_eq!(body["transaction"]["attempts"], 0);
        assert!(body["transaction"].get("timeout").is_none());
    }

    #[tokio::test]
    async fn test_resubmission_returns_same_transaction() {
        let (app, db, _dir) = test_app().await;

        let first = body_json(
            app.clone()
                .oneshot(post_json("/v1/transaction", submission()))
                .await
                .unwrap(),
        )
        .await;
        let second = body_json(
            app.oneshot(post_json("/v1/transaction", submission()))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(first["transaction"]["id"], second["transaction"]["id"]);
        let stats = database::transaction::get_stats(db.pool()).await.unwrap();
        assert_eq!(stats.total(), 1);
    }

    #[tokio::test]
    async fn test_validation_error() {
        let (app, _db, _dir) = test_app().await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/transaction",
                json!({ "receiver": "069123", "message": "hi", "sender": "Test" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "regex:invalid-format");

        let response = app
            .oneshot(post_json(
                "/v1/transaction",
                json!({ "receiver": "+306912345678", "sender": "Test" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["code"], "required:message");
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_shape() {
        let (app, db, _dir) = test_app().await;

        // Wrong field type
        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/transaction",
                json!({
                    "receiver": "+306912345678",
                    "message": "hi",
                    "sender": "Test",
                    "priority": "high"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "invalid:body");
        assert!(body["message"].as_str().unwrap().starts_with("Malformed request body"));

        // Not JSON at all
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/transaction")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("receiver=+306912345678"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "invalid:body");

        // Missing content type
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/transaction")
                    .body(Body::from(submission().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body_json(response).await["status"], "error");

        let stats = database::transaction::get_stats(db.pool()).await.unwrap();
        assert_eq!(stats.total(), 0);
    }

    #[tokio::test]
    async fn test_get_transaction() {
        let (app, _db, _dir) = test_app().await;

        let created = body_json(
            app.clone()
                .oneshot(post_json("/v1/transaction", submission()))
                .await
                .unwrap(),
        )
        .await;
        let id = created["transaction"]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(get(&format!("/v1/transaction/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["receiver"], "+306912345678");

        let response = app.oneshot(get("/v1/transaction/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "status": "error", "message": "Transaction does not exist" })
        );
    }

    #[tokio::test]
    async fn test_stats() {
        let (app, _db, _dir) = test_app().await;

        app.clone()
            .oneshot(post_json("/v1/transaction", submission()))
            .await
            .unwrap();

        let response = app.oneshot(get("/v1/stats")).await.unwrap();
        assert_eq!(
            body_json(response).await,
            json!({ "received": 1, "queued": 0, "sent": 0, "failed": 0 })
        );
    }

    #[tokio::test]
    async fn test_static_fallback_and_cors() {
        let (app, _db, _dir) = test_app().await;

        let request = Request::builder()
            .uri("/index.html")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert_eq!(body_bytes(response).await, b"<h1>relay</h1>");
    }
}
