// handlers/publish.rs - POST /publish handler

use axum::{extract::State, http::StatusCode};

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::messaging::Message;
use crate::state::AppState;
use crate::types::PublishInput;

/// POST /publish - deliver a notification to a single device token.
///
/// 202 with an empty body once the provider accepts the message, 502 carrying
/// the provider's error text otherwise.
pub async fn publish(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<PublishInput>,
) -> ApiResult {
    let message = Message::to_token(input.to, input.notification.into());
    tracing::info!(notification = ?message.notification, "publishing notification");

    let message_id = state.messaging.send(&message).await.map_err(|e| {
        tracing::error!(error = %e, "error sending message");
        ApiError::bad_gateway(format!("error found while publishing message: {}", e))
    })?;

    tracing::info!(message_id = %message_id, "Successfully sent message");
    Ok(StatusCode::ACCEPTED)
}
