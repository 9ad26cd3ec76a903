// handlers/broadcast.rs - POST /broadcast handler

use axum::{extract::State, http::StatusCode};

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::messaging::Message;
use crate::state::AppState;
use crate::types::BroadcastInput;

/// POST /broadcast - deliver a notification to every device subscribed to a topic
pub async fn broadcast(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<BroadcastInput>,
) -> ApiResult {
    let message = Message::to_topic(input.topic, input.notification.into());

    let message_id = state.messaging.send(&message).await.map_err(|e| {
        tracing::error!(error = %e, "error broadcasting message");
        ApiError::bad_gateway(format!("error found while broadcasting message: {}", e))
    })?;

    tracing::info!(resp = %message_id, "Successfully broadcasted message");
    Ok(StatusCode::ACCEPTED)
}
