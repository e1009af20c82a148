//! Configuration for the platform add-ons API client
//!
//! Supports environment-based configuration, TOML files and builder overrides
//! on top of per-environment defaults.

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default production management API URL
const DEFAULT_API_URL: &str = "https://api.addons.cloud/v2";

/// Default production GraphQL endpoint
const DEFAULT_GRAPHQL_URL: &str = "https://api.addons.cloud/graphql";

/// Default production scheduler API URL
const DEFAULT_SCHEDULER_URL: &str = "https://scheduler.addons.cloud/v2";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (platform emulator on localhost)
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Self::Production
    }
}

impl Environment {
    /// Parse from the `ADDONS_ENV` environment variable
    pub fn from_env() -> Self {
        match env::var("ADDONS_ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" => Self::Staging,
            _ => Self::Production,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the management REST API
    pub api_url: String,
    /// GraphQL endpoint URL
    pub graphql_url: String,
    /// Base URL of the scheduler REST API
    pub scheduler_url: String,
    /// Account email (basic auth user for the management API)
    pub email: Option<String>,
    /// Management API key (basic auth password)
    pub api_key: Option<String>,
    /// Bearer token for the GraphQL API
    pub token: Option<String>,
    /// Bearer token for the scheduler API
    pub scheduler_token: Option<String>,
    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
    /// Request timeout, written as duration text (`"30s"`) in files
    #[serde(with = "duration_text")]
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// Current environment
    pub environment: Environment,
}

mod duration_text {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(u64),
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = duration.as_millis();
        if millis % 1000 == 0 {
            serializer.serialize_str(&format!("{}s", millis / 1000))
        } else {
            serializer.serialize_str(&format!("{millis}ms"))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => addons_core::duration::parse_std_duration(&text)
                .map_err(serde::de::Error::custom),
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            scheduler_url: DEFAULT_SCHEDULER_URL.to_string(),
            email: None,
            api_key: None,
            token: None,
            scheduler_token: None,
            headers: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
            environment: Environment::default(),
        }
    }
}

/// Basic credentials come as a pair; name the half that is missing
fn credential_pair(
    email: Option<String>,
    api_key: Option<String>,
) -> ApiResult<(Option<String>, Option<String>)> {
    match (email, api_key) {
        (Some(_), None) => Err(ApiError::missing_env("ADDONS_API_KEY")),
        (None, Some(_)) => Err(ApiError::missing_env("ADDONS_EMAIL")),
        pair => Ok(pair),
    }
}

fn default_user_agent() -> String {
    format!("addons-api-client/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `ADDONS_ENV`: Environment preset (development/staging/production)
    /// - `ADDONS_API_URL`: Management REST API base URL
    /// - `ADDONS_GRAPHQL_URL`: GraphQL endpoint
    /// - `ADDONS_SCHEDULER_URL`: Scheduler REST API base URL
    /// - `ADDONS_EMAIL` / `ADDONS_API_KEY`: Management API credentials, set both or neither
    /// - `ADDONS_TOKEN`: GraphQL bearer token
    /// - `ADDONS_SCHEDULER_TOKEN`: Scheduler bearer token
    /// - `ADDONS_TIMEOUT`: Request timeout as duration text, e.g. `45s`
    pub fn from_env() -> ApiResult<Self> {
        let mut config = Self::for_environment(Environment::from_env());

        if let Ok(url) = env::var("ADDONS_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = env::var("ADDONS_GRAPHQL_URL") {
            config.graphql_url = url;
        }
        if let Ok(url) = env::var("ADDONS_SCHEDULER_URL") {
            config.scheduler_url = url;
        }

        let (email, api_key) =
            credential_pair(env::var("ADDONS_EMAIL").ok(), env::var("ADDONS_API_KEY").ok())?;
        config.email = email;
        config.api_key = api_key;
        config.token = env::var("ADDONS_TOKEN").ok();
        config.scheduler_token = env::var("ADDONS_SCHEDULER_TOKEN").ok();

        if let Ok(text) = env::var("ADDONS_TIMEOUT") {
            config.timeout = addons_core::duration::parse_std_duration(&text)
                .map_err(|e| ApiError::config(format!("ADDONS_TIMEOUT: {e}")))?;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// Keys missing from the file keep their production defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ApiError::Config(msg) => ApiError::config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> ApiResult<Self> {
        toml::from_str(content).map_err(|e| ApiError::config(format!("Failed to parse config: {e}")))
    }

    /// Defaults for an environment
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Staging => Self::staging(),
            Environment::Production => Self::production(),
        }
    }

    /// Create development configuration (local platform emulator)
    #[must_use]
    pub fn development() -> Self {
        Self {
            api_url: "http://localhost:8787/v2".to_string(),
            graphql_url: "http://localhost:8787/graphql".to_string(),
            scheduler_url: "http://localhost:8788/v2".to_string(),
            timeout: Duration::from_secs(10),
            environment: Environment::Development,
            ..Self::default()
        }
    }

    /// Create staging configuration
    #[must_use]
    pub fn staging() -> Self {
        Self {
            api_url: "https://api.staging.addons.cloud/v2".to_string(),
            graphql_url: "https://api.staging.addons.cloud/graphql".to_string(),
            scheduler_url: "https://scheduler.staging.addons.cloud/v2".to_string(),
            environment: Environment::Staging,
            ..Self::default()
        }
    }

    /// Create production configuration
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Builder-style method to set the management API URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Builder-style method to set the GraphQL endpoint
    #[must_use]
    pub fn with_graphql_url(mut self, url: impl Into<String>) -> Self {
        self.graphql_url = url.into();
        self
    }

    /// Builder-style method to set the scheduler API URL
    #[must_use]
    pub fn with_scheduler_url(mut self, url: impl Into<String>) -> Self {
        self.scheduler_url = url.into();
        self
    }

    /// Builder-style method to set management API credentials
    #[must_use]
    pub fn with_credentials(mut self, email: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.api_key = Some(api_key.into());
        self
    }

    /// Builder-style method to set the GraphQL token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builder-style method to set the scheduler token
    #[must_use]
    pub fn with_scheduler_token(mut self, token: impl Into<String>) -> Self {
        self.scheduler_token = Some(token.into());
        self
    }

    /// Builder-style method to add a header sent with every request
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        for (name, url) in [
            ("api_url", &self.api_url),
            ("graphql_url", &self.graphql_url),
            ("scheduler_url", &self.scheduler_url),
        ] {
            if url.is_empty() {
                return Err(ApiError::config(format!("{name} cannot be empty")));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ApiError::config(format!(
                    "{name} must start with http:// or https://"
                )));
            }
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        if self.email.is_some() != self.api_key.is_some() {
            return Err(ApiError::config(
                "email and api_key must be configured together",
            ));
        }

        Ok(())
    }
}
