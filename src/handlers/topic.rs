// handlers/topic.rs - POST /subscribe and POST /unsubscribe handlers

use axum::{extract::State, http::StatusCode};

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::messaging::{ErrorInfo, MessagingError, TopicManagementResponse};
use crate::state::AppState;
use crate::types::SubscribeInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopicAction {
    Subscribe,
    Unsubscribe,
}

impl TopicAction {
    fn name(self) -> &'static str {
        match self {
            TopicAction::Subscribe => "subscribe",
            TopicAction::Unsubscribe => "unsubscribe",
        }
    }

    /// "subscribing to" / "unsubscribing from", as used in client-facing messages
    fn phrase(self) -> &'static str {
        match self {
            TopicAction::Subscribe => "subscribing to",
            TopicAction::Unsubscribe => "unsubscribing from",
        }
    }
}

/// POST /subscribe - subscribe a batch of device tokens to a topic
pub async fn subscribe(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<SubscribeInput>,
) -> ApiResult {
    let result = state
        .messaging
        .subscribe_to_topic(&input.tokens, &input.topic)
        .await;
    let response = classify(TopicAction::Subscribe, result)?;

    tracing::info!(
        topic = %input.topic,
        success_count = response.success_count,
        "Successfully subbed to topic"
    );
    Ok(StatusCode::ACCEPTED)
}

/// POST /unsubscribe - remove a batch of device tokens from a topic
pub async fn unsubscribe(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<SubscribeInput>,
) -> ApiResult {
    let result = state
        .messaging
        .unsubscribe_from_topic(&input.tokens, &input.topic)
        .await;
    let response = classify(TopicAction::Unsubscribe, result)?;

    tracing::info!(
        topic = %input.topic,
        success_count = response.success_count,
        "Successfully unsubbed from topic"
    );
    Ok(StatusCode::ACCEPTED)
}

/// Turn a provider outcome into success or one of the two 502 failure layers
fn classify(
    action: TopicAction,
    result: Result<TopicManagementResponse, MessagingError>,
) -> ApiResult<TopicManagementResponse> {
    let response = result.map_err(|e| {
        tracing::error!(operation = action.name(), error = %e, "error while {} topic", action.phrase());
        ApiError::bad_gateway(format!("error found while {} topic: {}", action.phrase(), e))
    })?;

    if response.failure_count == 0 {
        return Ok(response);
    }

    let summary = summarize(&response.errors);
    // Log text is shared by both actions; dashboards match on it.
    tracing::error!(operation = action.name(), errors = %summary, "error while subscribing to topic");

    Err(ApiError::partial_failure(
        format!("errors while {} topic: {}", action.phrase(), summary),
        response.errors,
    ))
}

fn summarize(errors: &[ErrorInfo]) -> String {
    errors
        .iter()
        .map(|e| format!("Index: {}, Reason: {}", e.index, e.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
