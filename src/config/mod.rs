use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 42069;
pub const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com/v1";
pub const DEFAULT_IID_ENDPOINT: &str = "https://iid.googleapis.com";

/// Errors raised while reading configuration at startup. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub credentials_file: Option<PathBuf>,
    pub project_id: Option<String>,
    pub fcm_endpoint: Url,
    pub iid_endpoint: Url,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Shared secret compared against the bearer token of every request
    #[serde(skip_serializing)]
    pub api_key: String,
}

impl AppConfig {
    /// Build configuration from the process environment.
    ///
    /// Presets are chosen by `APP_ENV`, then individual variables override them.
    /// A missing `API_KEY` or an unparseable value is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("PUSH_GATEWAY_HOST") {
            self.server.host = v;
        }
        if let Some((name, v)) = ["PUSH_GATEWAY_PORT", "PORT"]
            .into_iter()
            .find_map(|name| env::var(name).ok().map(|v| (name, v)))
        {
            self.server.port = parse_var(name, &v)?;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = parse_var("API_ENABLE_REQUEST_LOGGING", &v)?;
        }

        // Provider overrides
        if let Ok(v) = env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            if !v.is_empty() {
                self.provider.credentials_file = Some(PathBuf::from(v));
            }
        }
        if let Some(project) = ["GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"]
            .iter()
            .filter_map(|name| env::var(name).ok())
            .find(|v| !v.is_empty())
        {
            self.provider.project_id = Some(project);
        }
        if let Ok(v) = env::var("FCM_ENDPOINT") {
            self.provider.fcm_endpoint = parse_url("FCM_ENDPOINT", &v)?;
        }
        if let Ok(v) = env::var("FCM_IID_ENDPOINT") {
            self.provider.iid_endpoint = parse_url("FCM_IID_ENDPOINT", &v)?;
        }
        if let Ok(v) = env::var("PROVIDER_TIMEOUT_SECS") {
            self.provider.timeout_secs = match parse_var::<u64>("PROVIDER_TIMEOUT_SECS", &v)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        name: "PROVIDER_TIMEOUT_SECS",
                        value: v,
                    })
                }
                secs => secs,
            };
        }

        // Security
        if let Ok(v) = env::var("API_KEY") {
            self.security.api_key = v;
        }

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.api_key.is_empty() {
            return Err(ConfigError::Missing("API_KEY"));
        }
        if self.provider.credentials_file.is_none() {
            return Err(ConfigError::Missing("GOOGLE_APPLICATION_CREDENTIALS"));
        }
        Ok(())
    }

    /// Address the listener binds to, e.g. `0.0.0.0:42069`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn base(environment: Environment, timeout_secs: u64, enable_request_logging: bool) -> Self {
        Self {
            environment,
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                enable_request_logging,
            },
            provider: ProviderConfig {
                credentials_file: None,
                project_id: None,
                fcm_endpoint: default_url(DEFAULT_FCM_ENDPOINT),
                iid_endpoint: default_url(DEFAULT_IID_ENDPOINT),
                timeout_secs,
            },
            security: SecurityConfig {
                api_key: String::new(),
            },
        }
    }

    fn development() -> Self {
        Self::base(Environment::Development, 30, true)
    }

    fn staging() -> Self {
        Self::base(Environment::Staging, 15, true)
    }

    fn production() -> Self {
        Self::base(Environment::Production, 10, false)
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn default_url(value: &str) -> Url {
    Url::parse(value).unwrap_or_else(|e| panic!("built-in endpoint {} is invalid: {}", value, e))
}
