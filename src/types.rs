// Request bodies accepted by the gateway
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::messaging;

const REQUIRED: &str = "This field is required";

/// Structural checks run after a body has been decoded
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl From<Notification> for messaging::Notification {
    fn from(n: Notification) -> Self {
        messaging::Notification {
            title: n.title,
            body: n.body,
        }
    }
}

/// POST /publish
#[derive(Debug, Clone, Deserialize)]
pub struct PublishInput {
    /// Device registration token
    pub to: String,
    pub notification: Notification,
}

/// POST /broadcast
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastInput {
    pub topic: String,
    pub notification: Notification,
}

/// POST /subscribe and POST /unsubscribe
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeInput {
    pub tokens: Vec<String>,
    pub topic: String,
}

#[derive(Default)]
struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    fn require(&mut self, field: &str, present: bool) {
        if !present {
            self.0.insert(field.to_string(), REQUIRED.to_string());
        }
    }

    fn notification(&mut self, notification: &Notification) {
        if notification.title.is_empty() && notification.body.is_empty() {
            self.0.insert(
                "notification".to_string(),
                "title or body must be provided".to_string(),
            );
        }
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Missing required fields", self.0))
        }
    }
}

impl Validate for PublishInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::default();
        errors.require("to", !self.to.trim().is_empty());
        errors.notification(&self.notification);
        errors.finish()
    }
}

impl Validate for BroadcastInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::default();
        errors.require("topic", !self.topic.trim().is_empty());
        errors.notification(&self.notification);
        errors.finish()
    }
}

impl Validate for SubscribeInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::default();
        errors.require("tokens", !self.tokens.is_empty());
        errors.require("topic", !self.topic.trim().is_empty());
        errors.finish()
    }
}
