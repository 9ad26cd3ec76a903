use std::sync::Arc;

use crate::messaging::Messaging;

/// Process-wide state shared by every request.
///
/// Built once at startup and handed to the router; handlers receive it through
/// `State<AppState>` and never mutate it.
#[derive(Clone)]
pub struct AppState {
    pub messaging: Arc<dyn Messaging>,
    api_key: Arc<str>,
}

impl AppState {
    pub fn new(messaging: Arc<dyn Messaging>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            messaging,
            api_key: api_key.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}
