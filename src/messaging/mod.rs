//! Push provider seam.
//!
//! Handlers only see the [`Messaging`] trait; [`FcmClient`] is the production
//! implementation talking to Firebase Cloud Messaging.

pub mod client;
pub mod credentials;
pub mod errors;
pub mod models;


use async_trait::async_trait;

pub use client::FcmClient;
pub use errors::MessagingError;
pub use models::{ErrorInfo, Message, Notification, Target, TopicManagementResponse};

/// Operations the gateway forwards to the push provider
#[async_trait]
pub trait Messaging: Send + Sync {
    /// Deliver one message and return the provider's message id
    async fn send(&self, message: &Message) -> Result<String, MessagingError>;

    async fn subscribe_to_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, MessagingError>;

    async fn unsubscribe_from_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, MessagingError>;
}
