use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Method, Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::messaging::mock::MockMessaging;
use crate::state::AppState;

pub const TEST_API_KEY: &str = "secret123";

/// Drive one request through the full router backed by `mock`
pub async fn send_request(
    mock: Arc<MockMessaging>,
    method: Method,
    path: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Bytes) {
    let app = crate::app(AppState::new(mock, TEST_API_KEY), false);

    let mut builder = Request::builder().method(method).uri(path);
    if let Some(key) = api_key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes)
}

pub async fn post_json(
    mock: Arc<MockMessaging>,
    path: &str,
    api_key: Option<&str>,
    body: Value,
) -> (StatusCode, Bytes) {
    send_request(mock, Method::POST, path, api_key, Some(body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PATHS: [&str; 4] = ["/publish", "/broadcast", "/subscribe", "/unsubscribe"];

    #[tokio::test]
    async fn every_endpoint_requires_the_api_key() {
        for path in PATHS {
            let mock = Arc::new(MockMessaging::new());
            let (status, body) = post_json(mock.clone(), path, None, json!({})).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body, json!({"error": "Unauthorized: Missing or invalid token"}));
            assert!(mock.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn wrong_key_is_rejected_before_provider() {
        for path in PATHS {
            let mock = Arc::new(MockMessaging::new());
            let (status, body) = post_json(
                mock.clone(),
                path,
                Some("wrong"),
                json!({"to": "tok_abc", "notification": {"title": "Hi", "body": "There"}}),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body, json!({"error": "Unauthorized: Invalid API Key"}));
            assert!(mock.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn unknown_paths_are_authenticated_first() {
        let mock = Arc::new(MockMessaging::new());
        let (status, _) = send_request(mock.clone(), Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            send_request(mock, Method::GET, "/health", Some(TEST_API_KEY), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn missing_body_is_a_bad_request() {
        let mock = Arc::new(MockMessaging::new());
        let (status, _) =
            send_request(mock, Method::POST, "/publish", Some(TEST_API_KEY), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
