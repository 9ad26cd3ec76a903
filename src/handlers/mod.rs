// handlers/mod.rs - request handlers, one per forwarded operation
//
// Every handler decodes its body with `ValidJson`, calls the provider through
// `AppState::messaging` and answers 202 with an empty body on success.

pub mod broadcast;
pub mod publish;
pub mod topic;

pub use broadcast::broadcast;
pub use publish::publish;
pub use topic::{subscribe, unsubscribe};

use crate::error::ApiError;

/// Fallback for authenticated requests to unknown paths
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}
