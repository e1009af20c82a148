//! Main API client implementation
//!
//! Every facade goes through the same typed endpoint caller: an [`Endpoint`]
//! names the verb and path template, a [`Transport`] binds one base URL to one
//! authentication scheme and performs exactly one HTTP request per call.

use crate::config::ClientConfig;
use crate::endpoints::{
    ConnectorsApi, DatabasesApi, KafkaApi, RedisApi, RegistriesApi, SchedulesApi, TeamsApi,
};
use crate::error::{ApiError, ApiResult, ErrorContext};
use crate::graphql::GraphqlClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Authentication scheme attached to every request of a [`Transport`]
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// No credentials
    None,
    /// HTTP basic auth (account email and API key)
    Basic {
        /// User name
        username: String,
        /// Password or API key
        password: String,
    },
    /// Bearer token
    Bearer(String),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

impl Auth {
    /// Basic auth when both parts are present
    pub fn basic(username: Option<&str>, password: Option<&str>) -> Self {
        match (username, password) {
            (Some(username), Some(password)) => Self::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            _ => Self::None,
        }
    }

    /// Bearer auth when a token is present
    pub fn bearer(token: Option<&str>) -> Self {
        token.map_or(Self::None, |t| Self::Bearer(t.to_string()))
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::None => request,
            Self::Basic { username, password } => request.basic_auth(username, Some(password)),
            Self::Bearer(token) => request.bearer_auth(token),
        }
    }
}

/// One upstream operation: HTTP verb, path template and bound parameters
///
/// Templates use `{name}` placeholders, e.g. `/kafka/cluster/{cluster_id}`.
#[derive(Debug, Clone)]
pub struct Endpoint {
    method: Method,
    template: &'static str,
    params: Vec<(&'static str, String)>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Create an endpoint for a verb and path template
    pub fn new(method: Method, template: &'static str) -> Self {
        Self {
            method,
            template,
            params: Vec::new(),
            query: Vec::new(),
        }
    }

    /// GET endpoint
    pub fn get(template: &'static str) -> Self {
        Self::new(Method::GET, template)
    }

    /// POST endpoint
    pub fn post(template: &'static str) -> Self {
        Self::new(Method::POST, template)
    }

    /// DELETE endpoint
    pub fn delete(template: &'static str) -> Self {
        Self::new(Method::DELETE, template)
    }

    /// Bind a path parameter
    #[must_use]
    pub fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    /// Append a query pair
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// HTTP verb
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Unrendered path template
    pub fn template(&self) -> &'static str {
        self.template
    }

    /// Path segments with parameters substituted
    pub fn segments(&self) -> ApiResult<Vec<&str>> {
        self.template
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let Some(name) = segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                else {
                    return Ok(segment);
                };

                match self.params.iter().find(|(n, _)| *n == name) {
                    Some((_, value)) if !value.is_empty() => Ok(value.as_str()),
                    Some(_) => Err(ApiError::InvalidUrl(format!(
                        "empty path parameter `{name}` in {}",
                        self.template
                    ))),
                    None => Err(ApiError::InvalidUrl(format!(
                        "missing path parameter `{name}` in {}",
                        self.template
                    ))),
                }
            })
            .collect()
    }

    /// Rendered path, unencoded, for logging and tests
    pub fn path(&self) -> ApiResult<String> {
        Ok(format!("/{}", self.segments()?.join("/")))
    }
}

/// Raw response details returned alongside a decoded value
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    /// HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Correlation ID sent with the request
    pub request_id: String,
    /// Wall time of the request
    pub elapsed: Duration,
}

/// HTTP client bound to one base URL and one authentication scheme
#[derive(Clone)]
pub struct Transport {
    inner: Client,
    base_url: Arc<Url>,
    auth: Arc<Auth>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Bind a shared HTTP client to a base URL and auth scheme
    pub fn new(inner: Client, base_url: &str, auth: Auth) -> ApiResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            inner,
            base_url: Arc::new(base_url),
            auth: Arc::new(auth),
        })
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the authentication scheme
    #[must_use]
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Absolute URL for an endpoint; path segments are percent-encoded
    pub fn url(&self, endpoint: &Endpoint) -> ApiResult<Url> {
        let segments = endpoint.segments()?;
        let mut url = Url::clone(&self.base_url);

        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        if !endpoint.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&endpoint.query);
        }

        Ok(url)
    }

    /// Call an endpoint without a body and decode the JSON response
    pub async fn call<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> ApiResult<T> {
        let (value, _) = self.call_with_meta(endpoint, Option::<&()>::None).await?;
        Ok(value)
    }

    /// Call an endpoint with a JSON body and decode the JSON response
    pub async fn call_with<B, T>(&self, endpoint: &Endpoint, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (value, _) = self.call_with_meta(endpoint, Some(body)).await?;
        Ok(value)
    }

    /// Call an endpoint and ignore the response body
    pub async fn call_empty(&self, endpoint: &Endpoint) -> ApiResult<()> {
        self.send(endpoint, Option::<&()>::None).await.map(|_| ())
    }

    /// Call an endpoint with a JSON body and ignore the response body
    pub async fn call_empty_with<B>(&self, endpoint: &Endpoint, body: &B) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(endpoint, Some(body)).await.map(|_| ())
    }

    /// Call an endpoint and return the decoded value with the raw response details
    pub async fn call_with_meta<B, T>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> ApiResult<(T, ResponseMeta)>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (response, request_id, start) = self.send(endpoint, body).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let value = serde_json::from_slice(&bytes)?;

        Ok((
            value,
            ResponseMeta {
                status,
                headers,
                request_id,
                elapsed: start.elapsed(),
            },
        ))
    }

    /// Execute a single request; non-2xx statuses become [`ApiError::ApiResponse`]
    #[instrument(skip_all, fields(method = %endpoint.method, template = endpoint.template, request_id = tracing::field::Empty))]
    async fn send<B>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> ApiResult<(Response, String, Instant)>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(endpoint)?;
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut request = self
            .inner
            .request(endpoint.method.clone(), url.clone())
            .header(X_REQUEST_ID, &request_id);
        request = self.auth.apply(request);

        if let Some(b) = body {
            request = request.json(b);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();

        debug!(
            request_id = %request_id,
            url = %url,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis(),
            "Request completed"
        );

        if status.is_success() {
            return Ok((response, request_id, start));
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text);
        let context = ErrorContext {
            request_id: Some(request_id),
            endpoint: url.path().to_string(),
            method: endpoint.method.to_string(),
        };
        warn!(context = %context, status = status.as_u16(), message = %message, "API error response");

        Err(ApiError::api_response(status.as_u16(), message))
    }
}

/// Pull a human-readable message out of an upstream error body
fn error_message(body: &str) -> String {
    let body = body.trim();

    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            if let Some(s) = value.as_str() {
                return Some(s.to_string());
            }
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(key).and_then(|m| m.as_str()).map(String::from))
        });

    match from_json {
        Some(message) => message,
        None if body.is_empty() => "Unknown error".to_string(),
        None => body.to_string(),
    }
}

/// Platform add-ons API client
///
/// Holds one transport per upstream surface:
/// - management REST API (basic auth with account email and API key)
/// - scheduler REST API (bearer token)
/// - GraphQL API (bearer token)
#[derive(Clone)]
pub struct AddonsClient {
    config: Arc<ClientConfig>,
    management: Transport,
    scheduler: Transport,
    graphql: GraphqlClient,
}

impl AddonsClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ApiError::config(format!("invalid user_agent: {e}")))?,
        );

        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::config(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::config(format!("invalid value for header {name}: {e}")))?;
            default_headers.insert(name, value);
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        let management = Transport::new(
            inner.clone(),
            &config.api_url,
            Auth::basic(config.email.as_deref(), config.api_key.as_deref()),
        )?;
        let scheduler = Transport::new(
            inner.clone(),
            &config.scheduler_url,
            Auth::bearer(config.scheduler_token.as_deref()),
        )?;
        let graphql = GraphqlClient::new(Transport::new(
            inner,
            &config.graphql_url,
            Auth::bearer(config.token.as_deref()),
        )?);

        debug!(
            environment = ?config.environment,
            api_url = %config.api_url,
            graphql_url = %config.graphql_url,
            scheduler_url = %config.scheduler_url,
            "Client configured"
        );

        Ok(Self {
            config: Arc::new(config),
            management,
            scheduler,
            graphql,
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Management REST transport
    #[must_use]
    pub fn management(&self) -> &Transport {
        &self.management
    }

    /// Scheduler REST transport
    #[must_use]
    pub fn scheduler(&self) -> &Transport {
        &self.scheduler
    }

    /// GraphQL client
    #[must_use]
    pub fn graphql(&self) -> &GraphqlClient {
        &self.graphql
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access Kafka clusters, topics and credentials
    #[must_use]
    pub fn kafka(&self) -> KafkaApi {
        KafkaApi::new(self.management.clone())
    }

    /// Access change-data-capture connectors
    #[must_use]
    pub fn connectors(&self) -> ConnectorsApi {
        ConnectorsApi::new(self.management.clone())
    }

    /// Access Redis databases
    #[must_use]
    pub fn redis(&self) -> RedisApi {
        RedisApi::new(self.management.clone())
    }

    /// Access teams and team members
    #[must_use]
    pub fn teams(&self) -> TeamsApi {
        TeamsApi::new(self.management.clone())
    }

    /// Access job schedules
    #[must_use]
    pub fn schedules(&self) -> SchedulesApi {
        SchedulesApi::new(self.scheduler.clone())
    }

    /// Access relational database instances
    #[must_use]
    pub fn databases(&self) -> DatabasesApi {
        DatabasesApi::new(self.graphql.clone())
    }

    /// Access container registries
    #[must_use]
    pub fn registries(&self) -> RegistriesApi {
        RegistriesApi::new(self.graphql.clone())
    }
}
