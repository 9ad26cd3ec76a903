use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by a [`Messaging`](super::Messaging) implementation
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The request was rejected locally before reaching the provider
    #[error("{0}")]
    InvalidArgument(String),

    /// The provider answered with a non-success status
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid credentials: {0}")]
    Credentials(String),

    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl MessagingError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        MessagingError::InvalidArgument(message.into())
    }

    /// Provider error code, when the provider supplied one
    pub fn code(&self) -> Option<&str> {
        match self {
            MessagingError::Api { code, .. } => Some(code.as_str()),
            MessagingError::InvalidArgument(_) => Some("invalid-argument"),
            _ => None,
        }
    }

    /// Build an error from a failed FCM v1 `messages:send` call.
    ///
    /// Google wraps errors as `{"error": {"code", "message", "status", "details"}}`;
    /// the FCM specific code lives in a `FcmError` detail entry.
    pub fn from_fcm_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<GoogleErrorBody>(body).ok();
        match parsed {
            Some(GoogleErrorBody { error }) => {
                let code = error
                    .details
                    .iter()
                    .filter(|detail| {
                        detail
                            .get("@type")
                            .and_then(Value::as_str)
                            .map(|t| t.ends_with("google.firebase.fcm.v1.FcmError"))
                            .unwrap_or(false)
                    })
                    .find_map(|detail| detail.get("errorCode").and_then(Value::as_str))
                    .map(fcm_error_code)
                    .or_else(|| error.status.as_deref().map(platform_error_code))
                    .unwrap_or_else(|| status_error_code(status))
                    .to_string();

                MessagingError::Api {
                    status,
                    code,
                    message: error.message.unwrap_or_else(|| unexpected_response(status, body)),
                }
            }
            None => MessagingError::Api {
                status,
                code: status_error_code(status).to_string(),
                message: unexpected_response(status, body),
            },
        }
    }

    /// Build an error from a failed Instance ID batch call, whose body is
    /// `{"error": "<CODE>"}`.
    pub fn from_iid_response(status: u16, body: &str) -> Self {
        let server_code = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string));

        match server_code {
            Some(server_code) => {
                let code = iid_error_code(&server_code);
                MessagingError::Api {
                    status,
                    code: code.to_string(),
                    message: format!("error while calling the iid service: {}", server_code),
                }
            }
            None => MessagingError::Api {
                status,
                code: status_error_code(status).to_string(),
                message: unexpected_response(status, body),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<Value>,
}

fn unexpected_response(status: u16, body: &str) -> String {
    format!("unexpected http response with status: {}; body: {}", status, body)
}

fn fcm_error_code(code: &str) -> &'static str {
    match code {
        "APNS_AUTH_ERROR" | "THIRD_PARTY_AUTH_ERROR" => "third-party-auth-error",
        "INTERNAL" => "internal-error",
        "INVALID_ARGUMENT" => "invalid-argument",
        "QUOTA_EXCEEDED" => "quota-exceeded",
        "SENDER_ID_MISMATCH" => "sender-id-mismatch",
        "UNAVAILABLE" => "unavailable",
        "UNREGISTERED" => "registration-token-not-registered",
        _ => "unknown-error",
    }
}

fn platform_error_code(status: &str) -> &'static str {
    match status {
        "INVALID_ARGUMENT" => "invalid-argument",
        "UNAUTHENTICATED" => "unauthenticated",
        "PERMISSION_DENIED" => "permission-denied",
        "NOT_FOUND" => "not-found",
        "RESOURCE_EXHAUSTED" => "resource-exhausted",
        "INTERNAL" => "internal-error",
        "UNAVAILABLE" => "unavailable",
        _ => "unknown-error",
    }
}

fn status_error_code(status: u16) -> &'static str {
    match status {
        400 => "invalid-argument",
        401 => "unauthenticated",
        403 => "permission-denied",
        404 => "not-found",
        429 => "resource-exhausted",
        500 => "internal-error",
        503 => "unavailable",
        _ => "unknown-error",
    }
}

/// Map an Instance ID server code (batch or per-item) to a client-facing reason
pub fn iid_error_code(code: &str) -> &'static str {
    match code {
        "INVALID_ARGUMENT" => "invalid-registration-token",
        "NOT_FOUND" => "registration-token-not-registered",
        "INTERNAL" => "internal-error",
        "TOO_MANY_TOPICS" => "too-many-topics",
        _ => "unknown-error",
    }
}
