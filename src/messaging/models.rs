use serde::{Deserialize, Serialize};

use super::errors::{iid_error_code, MessagingError};

/// Maximum number of registration tokens accepted by one topic management call
pub const MAX_TOPIC_TOKENS: usize = 1000;

const TOPIC_PREFIX: &str = "/topics/";

/// Notification payload as understood by FCM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub body: String,
}

/// Where a message is delivered. A message has exactly one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Token(String),
    Topic(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub target: Target,
    pub notification: Option<Notification>,
}

impl Message {
    pub fn to_token(token: impl Into<String>, notification: Notification) -> Self {
        Self {
            target: Target::Token(token.into()),
            notification: Some(notification),
        }
    }

    pub fn to_topic(topic: impl Into<String>, notification: Notification) -> Self {
        Self {
            target: Target::Topic(topic.into()),
            notification: Some(notification),
        }
    }

    /// Check the message and produce the FCM v1 wire form
    pub(crate) fn to_request(&self) -> Result<SendRequest<'_>, MessagingError> {
        let (token, topic) = match &self.target {
            Target::Token(token) => {
                if token.is_empty() {
                    return Err(MessagingError::invalid_argument("token must not be empty"));
                }
                (Some(token.as_str()), None)
            }
            Target::Topic(topic) => (None, Some(topic_name(topic)?)),
        };

        Ok(SendRequest {
            message: WireMessage {
                token,
                topic,
                notification: self.notification.as_ref(),
            },
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SendRequest<'a> {
    pub message: WireMessage<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<&'a Notification>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendResponse {
    pub name: String,
}

/// One failed entry of a topic management call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Position of the token in the submitted list
    pub index: usize,
    pub reason: String,
}

/// Outcome of subscribing or unsubscribing a batch of tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicManagementResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<ErrorInfo>,
}

impl TopicManagementResponse {
    pub(crate) fn from_results(results: Vec<IidResult>) -> Self {
        let mut response = Self::default();
        for (index, result) in results.into_iter().enumerate() {
            match result.error {
                None => response.success_count += 1,
                Some(code) => {
                    response.failure_count += 1;
                    response.errors.push(ErrorInfo {
                        index,
                        reason: iid_error_code(&code).to_string(),
                    });
                }
            }
        }
        response
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicManagementRequest<'a> {
    pub to: String,
    pub registration_tokens: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct IidResponse {
    #[serde(default)]
    pub results: Vec<IidResult>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IidResult {
    pub error: Option<String>,
}

/// Strip an optional `/topics/` prefix and check the remaining name
pub fn topic_name(topic: &str) -> Result<&str, MessagingError> {
    let name = topic.strip_prefix(TOPIC_PREFIX).unwrap_or(topic);
    if name.is_empty() {
        return Err(MessagingError::invalid_argument("topic name not specified"));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%'));
    if !valid {
        return Err(MessagingError::invalid_argument(format!(
            "malformed topic name: {}",
            topic
        )));
    }
    Ok(name)
}

/// Topic in the `/topics/<name>` form the Instance ID service expects
pub fn qualified_topic(topic: &str) -> Result<String, MessagingError> {
    topic_name(topic).map(|name| format!("{}{}", TOPIC_PREFIX, name))
}

pub(crate) fn validate_tokens(tokens: &[String]) -> Result<(), MessagingError> {
    if tokens.is_empty() {
        return Err(MessagingError::invalid_argument("no tokens specified"));
    }
    if tokens.len() > MAX_TOPIC_TOKENS {
        return Err(MessagingError::invalid_argument(format!(
            "tokens list must not contain more than {} items",
            MAX_TOPIC_TOKENS
        )));
    }
    if tokens.iter().any(String::is_empty) {
        return Err(MessagingError::invalid_argument(
            "tokens list must not contain empty strings",
        ));
    }
    Ok(())
}
