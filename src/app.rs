use crate::config;
use crate::state;
use crate::store::FileStore;

use axum::Router;
use axum::routing::{get, post};

mod push;
mod time;
mod trigger;

const STORE_FILE: &str = "store.json";

pub fn app(config: config::AppConfig) -> Router {
    let store_path = config.data_dir.join(STORE_FILE);
    let store = FileStore::open(&store_path)
        .unwrap_or_else(|err| panic!("failed to open subscription store: {err}"));
    let state = state::AppState { config, store };
    Router::new()
        .route("/api/time", get(time::server_time))
        .route("/api/push/public-key", get(push::public_key))
        .route("/api/push/subscribe", post(push::subscribe))
        .route("/api/push/unsubscribe", post(push::unsubscribe))
        .route("/api/push/send", post(push::send))
        .route("/api/cron/tick", post(trigger::cron_tick))
        .route("/health", get(health))
        .with_state(state)
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::ports::store::Store;
    use axum::body::{Body, to_bytes};
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
    use axum::http::{Request, StatusCode};
    use serde_json::Value as JsonValue;
    use serde_json::from_slice as json_from_slice;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn create_temp_root(test_name: &str) -> PathBuf {
        let mut root = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        root.push(format!("tminus-{test_name}-{nanos}"));
        std::fs::create_dir_all(&root).expect("create temp dir");
        root
    }

    fn app_config(root: &std::path::Path) -> config::AppConfig {
        config::AppConfig {
            data_dir: root.to_path_buf(),
            ..config::AppConfig::default()
        }
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn app__should_return_ok_on_health_endpoint() {
        // Given
        let root = create_temp_root("health");
        let app = app(app_config(&root));

        // When
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert_eq!(body.as_ref(), b"ok");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn server_time__should_return_current_unix_millis() {
        // Given
        let root = create_temp_root("time");

        // When
        let response = app(app_config(&root))
            .oneshot(
                Request::builder()
                    .uri("/api/time")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let payload: JsonValue = json_from_slice(&body).expect("parse json");
        assert!(payload["now"].as_i64().expect("now field") > 1_700_000_000_000);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn public_key__should_return_configured_key() {
        // Given
        let root = create_temp_root("public-key");

        // When
        let response = app(app_config(&root))
            .oneshot(
                Request::builder()
                    .uri("/api/push/public-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let payload: JsonValue = json_from_slice(&body).expect("parse json");
        assert_eq!(payload["publicKey"], "test-public-key");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn subscribe__should_persist_subscription() {
        // Given
        let root = create_temp_root("subscribe");
        let body = r#"{"endpoint":"https://push.example/123","p256dh":"p256","auth":"auth"}"#;

        // When
        let response = app(app_config(&root))
            .oneshot(json_post("/api/push/subscribe", body))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let store = FileStore::open(&root.join(STORE_FILE)).expect("open store");
        let stored = store.list_subscriptions().expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].endpoint, "https://push.example/123");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn subscribe__should_replace_keys_on_repeat_endpoint() {
        // Given
        let root = create_temp_root("subscribe-rotate");
        let config = app_config(&root);
        let first = r#"{"endpoint":"https://push.example/123","p256dh":"old","auth":"old"}"#;
        let second = r#"{"endpoint":"https://push.example/123","p256dh":"new","auth":"new"}"#;

        // When
        app(config.clone())
            .oneshot(json_post("/api/push/subscribe", first))
            .await
            .expect("first request failed");
        let response = app(config)
            .oneshot(json_post("/api/push/subscribe", second))
            .await
            .expect("second request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let store = FileStore::open(&root.join(STORE_FILE)).expect("open store");
        let stored = store.list_subscriptions().expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].p256dh, "new");
        assert_eq!(stored[0].auth, "new");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn subscribe__should_reject_blank_fields() {
        // Given
        let root = create_temp_root("subscribe-blank");
        let body = r#"{"endpoint":"  ","p256dh":"p256","auth":"auth"}"#;

        // When
        let response = app(app_config(&root))
            .oneshot(json_post("/api/push/subscribe", body))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn unsubscribe__should_remove_stored_subscription() {
        // Given
        let root = create_temp_root("unsubscribe");
        let config = app_config(&root);
        let subscribe = r#"{"endpoint":"https://push.example/123","p256dh":"p256","auth":"auth"}"#;
        app(config.clone())
            .oneshot(json_post("/api/push/subscribe", subscribe))
            .await
            .expect("subscribe failed");

        // When
        let response = app(config)
            .oneshot(json_post(
                "/api/push/unsubscribe",
                r#"{"endpoint":"https://push.example/123"}"#,
            ))
            .await
            .expect("unsubscribe failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let store = FileStore::open(&root.join(STORE_FILE)).expect("open store");
        assert!(store.list_subscriptions().expect("list").is_empty());

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn unsubscribe__should_accept_unknown_endpoint() {
        // Given
        let root = create_temp_root("unsubscribe-unknown");

        // When
        let response = app(app_config(&root))
            .oneshot(json_post(
                "/api/push/unsubscribe",
                r#"{"endpoint":"https://push.example/missing"}"#,
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn cron_tick__should_reject_missing_secret() {
        // Given
        let root = create_temp_root("cron-unauthorized");

        // When
        let response = app(app_config(&root))
            .oneshot(json_post("/api/cron/tick", "{}"))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let payload: JsonValue = json_from_slice(&body).expect("parse json");
        assert_eq!(payload["error"], "unauthorized");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn cron_tick__should_reject_wrong_secret() {
        // Given
        let root = create_temp_root("cron-wrong-secret");

        // When
        let response = app(app_config(&root))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/cron/tick")
                    .header(AUTHORIZATION, "Bearer not-the-secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn cron_tick__should_report_no_milestone_due() {
        // Given: the default test target is 30 days out, between thresholds.
        let root = create_temp_root("cron-idle");

        // When
        let response = app(app_config(&root))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/cron/tick")
                    .header(AUTHORIZATION, "Bearer test-cron-secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let payload: JsonValue = json_from_slice(&body).expect("parse json");
        assert_eq!(payload["status"], "no_milestone_due");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn send__should_reject_empty_message() {
        // Given
        let root = create_temp_root("send-empty");

        // When
        let response = app(app_config(&root))
            .oneshot(json_post("/api/push/send", r#"{"message":"  "}"#))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn send__should_return_empty_summary_without_subscribers() {
        // Given
        let root = create_temp_root("send-no-subscribers");

        // When
        let response = app(app_config(&root))
            .oneshot(json_post("/api/push/send", r#"{"message":"Hello"}"#))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let payload: JsonValue = json_from_slice(&body).expect("parse json");
        assert_eq!(payload["attempted"], 0);
        assert_eq!(payload["delivered"], 0);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }
}
