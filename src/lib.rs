pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod messaging;
pub mod middleware;
pub mod state;
pub mod types;

#[cfg(test)]
pub mod testing;

use axum::{middleware::from_fn_with_state, routing::post, Router};
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use state::AppState;

/// Build the gateway router.
///
/// The API key check wraps every route and the fallback, so unknown paths are
/// also answered with 401 unless the caller is authenticated.
pub fn app(state: AppState, enable_request_logging: bool) -> Router {
    let router = Router::new()
        .route("/publish", post(handlers::publish))
        .route("/broadcast", post(handlers::broadcast))
        .route("/subscribe", post(handlers::subscribe))
        .route("/unsubscribe", post(handlers::unsubscribe))
        .fallback(handlers::not_found)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::api_key_auth_middleware,
        ))
        .with_state(state);

    if enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
