#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};

pub const API_KEY: &str = "secret123";
pub const PROJECT_ID: &str = "demo-project";
pub const ACCESS_TOKEN: &str = "test-access-token";

const TEST_KEY: &str = include_str!("test_key.pem");

/// A request received by the fake Google backend
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
    pub access_token_auth: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
struct MockGoogle {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// Fake token, FCM v1 and Instance ID endpoints.
///
/// Behaviour is keyed on the payload: tokens starting with `bad` are unknown
/// devices, tokens starting with `invalid` are malformed, topic `broken` fails
/// the whole batch call.
async fn google_dispatch(
    State(mock): State<MockGoogle>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let json_body = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    if let Ok(mut requests) = mock.requests.lock() {
        requests.push(Recorded {
            path: path.clone(),
            authorization: header("authorization"),
            access_token_auth: header("access_token_auth"),
            body: json_body.clone(),
        });
    }

    if path == "/token" {
        return Json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3600,
            "token_type": "Bearer"
        }))
        .into_response();
    }

    if path == format!("/v1/projects/{}/messages:send", PROJECT_ID) {
        let message = &json_body["message"];
        let token = message["token"].as_str().unwrap_or_default();
        if token.starts_with("bad") {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": {
                        "code": 404,
                        "message": "Requested entity was not found.",
                        "status": "NOT_FOUND",
                        "details": [{
                            "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                            "errorCode": "UNREGISTERED"
                        }]
                    }
                })),
            )
                .into_response();
        }
        return Json(json!({
            "name": format!("projects/{}/messages/msg1", PROJECT_ID)
        }))
        .into_response();
    }

    if path == "/iid/v1:batchAdd" || path == "/iid/v1:batchRemove" {
        if json_body["to"] == "/topics/broken" {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "INVALID_ARGUMENT"})))
                .into_response();
        }
        let results: Vec<Value> = json_body["registration_tokens"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .map(|token| {
                let token = token.as_str().unwrap_or_default();
                if token.starts_with("bad") {
                    json!({"error": "NOT_FOUND"})
                } else if token.starts_with("invalid") {
                    json!({"error": "INVALID_ARGUMENT"})
                } else {
                    json!({})
                }
            })
            .collect();
        return Json(json!({ "results": results })).into_response();
    }

    StatusCode::NOT_FOUND.into_response()
}

/// Write a service account file signed by the test key
pub fn write_service_account(path: &Path, token_uri: &str) -> Result<()> {
    let service_account = json!({
        "type": "service_account",
        "project_id": PROJECT_ID,
        "private_key_id": "test-key",
        "private_key": TEST_KEY,
        "client_email": "gateway@demo-project.iam.gserviceaccount.com",
        "token_uri": token_uri,
    });
    std::fs::write(path, service_account.to_string()).context("failed to write service account file")
}

pub struct TestGateway {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    credentials: PathBuf,
    child: Child,
}

impl TestGateway {
    /// Start a fake Google backend on this runtime and the gateway binary against it
    pub async fn start() -> Result<Self> {
        let mock = MockGoogle::default();
        let requests = mock.requests.clone();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock google server")?;
        let google_url = format!("http://{}", listener.local_addr()?);
        let router = Router::new().fallback(google_dispatch).with_state(mock);
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let credentials = std::env::temp_dir().join(format!(
            "fcm-push-gateway-sa-{}-{}.json",
            std::process::id(),
            port
        ));
        write_service_account(&credentials, &format!("{}/token", google_url))?;

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fcm-push-gateway"));
        cmd.env("API_KEY", API_KEY)
            .env("GOOGLE_APPLICATION_CREDENTIALS", &credentials)
            .env_remove("GOOGLE_CLOUD_PROJECT")
            .env_remove("GCLOUD_PROJECT")
            .env("FCM_ENDPOINT", format!("{}/v1", google_url))
            .env("FCM_IID_ENDPOINT", &google_url)
            .env("PUSH_GATEWAY_HOST", "127.0.0.1")
            .env("PUSH_GATEWAY_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        let gateway = Self {
            base_url,
            requests,
            credentials,
            child,
        };
        gateway.wait_ready(Duration::from_secs(10)).await?;
        Ok(gateway)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            // Every path answers 401 without a key once the server is up
            if let Ok(resp) = client.get(format!("{}/", self.base_url)).send().await {
                if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub async fn post(&self, path: &str, api_key: Option<&str>, body: Value) -> Result<reqwest::Response> {
        let mut request = reqwest::Client::new()
            .post(format!("{}{}", self.base_url, path))
            .json(&body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }
        Ok(request.send().await?)
    }

    /// Requests the fake backend received, excluding token exchanges
    pub fn provider_calls(&self) -> Vec<Recorded> {
        self.requests
            .lock()
            .map(|r| r.iter().filter(|r| r.path != "/token").cloned().collect())
            .unwrap_or_default()
    }

    pub fn token_exchanges(&self) -> usize {
        self.requests
            .lock()
            .map(|r| r.iter().filter(|r| r.path == "/token").count())
            .unwrap_or_default()
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.credentials);
    }
}
