use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::credentials::{ServiceAccount, TokenSource};
use super::errors::MessagingError;
use super::models::{
    qualified_topic, validate_tokens, IidResponse, Message, SendResponse,
    TopicManagementRequest, TopicManagementResponse,
};
use super::Messaging;
use crate::config::ProviderConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopicOperation {
    Subscribe,
    Unsubscribe,
}

impl TopicOperation {
    fn path(self) -> &'static str {
        match self {
            TopicOperation::Subscribe => "iid/v1:batchAdd",
            TopicOperation::Unsubscribe => "iid/v1:batchRemove",
        }
    }
}

/// Firebase Cloud Messaging client speaking the HTTP v1 and Instance ID APIs
pub struct FcmClient {
    http: reqwest::Client,
    tokens: TokenSource,
    project_id: String,
    fcm_endpoint: Url,
    iid_endpoint: Url,
}

impl FcmClient {
    /// Build the client from provider configuration, reading the service account file
    pub fn from_config(config: &ProviderConfig) -> Result<Self, MessagingError> {
        let path = config.credentials_file.as_deref().ok_or_else(|| {
            MessagingError::Credentials("GOOGLE_APPLICATION_CREDENTIALS is not set".into())
        })?;
        let account = ServiceAccount::from_file(path)?;

        Self::new(
            account,
            config.project_id.clone(),
            config.fcm_endpoint.clone(),
            config.iid_endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn new(
        account: ServiceAccount,
        project_id: Option<String>,
        fcm_endpoint: Url,
        iid_endpoint: Url,
        timeout: Duration,
    ) -> Result<Self, MessagingError> {
        let project_id = project_id
            .or_else(|| account.project_id.clone())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                MessagingError::Credentials(
                    "project id is required to access Firebase Cloud Messaging".into(),
                )
            })?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let tokens = TokenSource::new(account, http.clone())?;

        Ok(Self {
            http,
            tokens,
            project_id,
            fcm_endpoint,
            iid_endpoint,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn client_email(&self) -> &str {
        &self.tokens.account().client_email
    }

    fn send_url(&self) -> String {
        format!(
            "{}/projects/{}/messages:send",
            self.fcm_endpoint.as_str().trim_end_matches('/'),
            self.project_id
        )
    }

    fn topic_url(&self, op: TopicOperation) -> String {
        format!("{}/{}", self.iid_endpoint.as_str().trim_end_matches('/'), op.path())
    }

    async fn manage_topic(
        &self,
        tokens: &[String],
        topic: &str,
        op: TopicOperation,
    ) -> Result<TopicManagementResponse, MessagingError> {
        validate_tokens(tokens)?;
        let request = TopicManagementRequest {
            to: qualified_topic(topic)?,
            registration_tokens: tokens,
        };

        let access_token = self.tokens.token().await?;
        let response = self
            .http
            .post(self.topic_url(op))
            .bearer_auth(access_token)
            .header("access_token_auth", "true")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MessagingError::from_iid_response(status.as_u16(), &body));
        }

        let parsed: IidResponse = serde_json::from_str(&body)
            .map_err(|e| MessagingError::InvalidResponse(format!("topic management response: {}", e)))?;
        if parsed.results.len() != tokens.len() {
            tracing::warn!(
                expected = tokens.len(),
                received = parsed.results.len(),
                "topic management result count does not match token count"
            );
        }

        Ok(TopicManagementResponse::from_results(parsed.results))
    }
}

#[async_trait]
impl Messaging for FcmClient {
    async fn send(&self, message: &Message) -> Result<String, MessagingError> {
        let request = message.to_request()?;
        let access_token = self.tokens.token().await?;

        let response = self
            .http
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MessagingError::from_fcm_response(status.as_u16(), &body));
        }

        let parsed: SendResponse = serde_json::from_str(&body)
            .map_err(|e| MessagingError::InvalidResponse(format!("send response: {}", e)))?;
        Ok(parsed.name)
    }

    async fn subscribe_to_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, MessagingError> {
        self.manage_topic(tokens, topic, TopicOperation::Subscribe).await
    }

    async fn unsubscribe_from_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, MessagingError> {
        self.manage_topic(tokens, topic, TopicOperation::Unsubscribe).await
    }
}
