pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_resume_bytes = state.config.max_resume_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route("/api/v1/sessions/:id/search", post(handlers::handle_search))
        .route(
            "/api/v1/sessions/:id/resume",
            post(handlers::handle_upload_resume).layer(DefaultBodyLimit::max(max_resume_bytes)),
        )
        .route(
            "/api/v1/sessions/:id/load-more",
            post(handlers::handle_load_more),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{Config, RecommenderBackend};
    use crate::search::PAGE_SIZE;
    use crate::session::store::SessionStore;
    use crate::session::tests::{make_page, FakeRecommender, FakeSearcher};

    const BOUNDARY: &str = "X-TEST-BOUNDARY";

    fn app(searcher: FakeSearcher) -> Router {
        let config = Config {
            anthropic_api_key: "test-key".to_string(),
            recommender: RecommenderBackend::Keyword,
            max_resume_bytes: 1024,
            session_idle_ttl: std::time::Duration::from_secs(3600),
            port: 0,
            rust_log: "info".to_string(),
        };
        let state = AppState {
            sessions: Arc::new(SessionStore::new(
                Arc::new(searcher),
                Arc::new(FakeRecommender::default()),
            )),
            config,
        };
        build_router(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response: Response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn multipart(uri: &str, field: &str, file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn create_session(app: &Router) -> String {
        let (status, body) = send(app, post_empty("/api/v1/sessions")).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(FakeSearcher::default());
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_new_session_snapshot() {
        let app = app(FakeSearcher::default());
        let (status, body) = send(&app, post_empty("/api/v1/sessions")).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "idle");
        assert_eq!(body["jobs"], json!([]));
        assert_eq!(body["can_load_more"], false);
        assert_eq!(body["resume_loaded"], false);
    }

    #[tokio::test]
    async fn test_search_then_load_more_flow() {
        let app = app(
            FakeSearcher::default()
                .with_page("rust", 0, make_page("a", PAGE_SIZE, &["https://s1"]))
                .with_page("rust", 6, make_page("b", 2, &["https://s1", "https://s2"])),
        );
        let id = create_session(&app).await;

        let (status, body) = send(
            &app,
            post_json(
                &format!("/api/v1/sessions/{id}/search"),
                json!({"query": "rust", "location": "Berlin"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jobs"].as_array().unwrap().len(), 6);
        assert_eq!(body["jobs"][0]["fit"]["state"], "not_analyzed");
        assert_eq!(body["search"], json!({"query": "rust", "location": "Berlin"}));
        assert_eq!(body["can_load_more"], true);

        let (status, body) =
            send(&app, post_empty(&format!("/api/v1/sessions/{id}/load-more"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jobs"].as_array().unwrap().len(), 8);
        assert_eq!(body["sources"].as_array().unwrap().len(), 2);
        assert_eq!(body["has_more"], false);
    }

    #[tokio::test]
    async fn test_search_failure_is_reported_in_snapshot() {
        let app = app(FakeSearcher::default().with_error("rust", 0, "backend down"));
        let id = create_session(&app).await;

        let (status, body) = send(
            &app,
            post_json(
                &format!("/api/v1/sessions/{id}/search"),
                json!({"query": "rust"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].as_str().unwrap().contains("backend down"));
        assert_eq!(body["jobs"], json!([]));
    }

    #[tokio::test]
    async fn test_resume_upload_scores_jobs() {
        let app = app(FakeSearcher::default().with_page("rust", 0, make_page("a", 2, &[])));
        let id = create_session(&app).await;
        send(
            &app,
            post_json(
                &format!("/api/v1/sessions/{id}/search"),
                json!({"query": "rust"}),
            ),
        )
        .await;

        let (status, body) = send(
            &app,
            multipart(
                &format!("/api/v1/sessions/{id}/resume"),
                "resume",
                "cv.txt",
                "Rust engineer",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume_loaded"], true);
        assert_eq!(body["jobs"][0]["fit"]["state"], "analyzed");
        assert_eq!(body["jobs"][0]["fit"]["match_score"], 80);
    }

    #[tokio::test]
    async fn test_resume_upload_requires_field() {
        let app = app(FakeSearcher::default());
        let id = create_session(&app).await;

        let (status, body) = send(
            &app,
            multipart(
                &format!("/api/v1/sessions/{id}/resume"),
                "attachment",
                "cv.txt",
                "text",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_oversized_resume_is_rejected() {
        let app = app(FakeSearcher::default());
        let id = create_session(&app).await;
        let content = "x".repeat(4096);

        let (status, _) = send(
            &app,
            multipart(
                &format!("/api/v1/sessions/{id}/resume"),
                "resume",
                "cv.txt",
                &content,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = app(FakeSearcher::default());
        let request = Request::get(format!("/api/v1/sessions/{}", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_session() {
        let app = app(FakeSearcher::default());
        let id = create_session(&app).await;
        let delete = || {
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/v1/sessions/{id}"))
                .body(Body::empty())
                .unwrap()
        };

        let (status, _) = send(&app, delete()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, delete()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
