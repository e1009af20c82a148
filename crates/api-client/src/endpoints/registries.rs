//! Container registry endpoints
//!
//! Served by the GraphQL API.

use crate::endpoints::{duration_millis, find_named};
use crate::error::{ApiError, ApiResult};
use crate::graphql::GraphqlClient;
use addons_core::FlexibleTimestamp;
use serde::{Deserialize, Serialize};
use serde_json::json;

const LIST_REGISTRIES: &str =
    "query ListRegistries { registries { id name region visibility endpoint createdAt } }";
const GET_REGISTRY: &str = "query GetRegistry($id: ID!) \
                            { registry(id: $id) { id name region visibility endpoint createdAt } }";
const CREATE_REGISTRY: &str = "mutation CreateRegistry($input: CreateRegistryInput!) \
                               { createRegistry(input: $input) { id name region visibility endpoint createdAt } }";
const DELETE_REGISTRY: &str = "mutation DeleteRegistry($id: ID!) { deleteRegistry(id: $id) }";
const LIST_REPOSITORIES: &str = "query ListRepositories($id: ID!) \
                                 { registry(id: $id) { repositories { name tagCount sizeBytes updatedAt } } }";
const CREATE_TOKEN: &str = "mutation CreateRegistryToken($registryId: ID!, $input: CreateRegistryTokenInput!) \
                            { createRegistryToken(registryId: $registryId, input: $input) \
                            { id name scope token expiresAt createdAt } }";
const REVOKE_TOKEN: &str = "mutation RevokeRegistryToken($id: ID!) { revokeRegistryToken(id: $id) }";

/// Registries API interface
#[derive(Debug, Clone)]
pub struct RegistriesApi {
    graphql: GraphqlClient,
}

impl RegistriesApi {
    /// Create a new registries API interface
    pub(crate) fn new(graphql: GraphqlClient) -> Self {
        Self { graphql }
    }

    /// List registries
    pub async fn list(&self) -> ApiResult<Vec<Registry>> {
        let data: ListData = self.graphql.execute(LIST_REGISTRIES, json!({})).await?;
        Ok(data.registries)
    }

    /// Get a registry by ID
    pub async fn get(&self, id: &str) -> ApiResult<Registry> {
        let data: GetData<Registry> = self
            .graphql
            .execute(GET_REGISTRY, json!({ "id": id }))
            .await?;
        data.registry
            .ok_or_else(|| ApiError::not_found("registry", id))
    }

    /// Create a registry
    pub async fn create(&self, request: &CreateRegistryRequest) -> ApiResult<Registry> {
        let data: CreateData = self
            .graphql
            .execute(CREATE_REGISTRY, json!({ "input": request }))
            .await?;
        Ok(data.create_registry)
    }

    /// Delete a registry and all its images
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let data: DeleteData = self
            .graphql
            .execute(DELETE_REGISTRY, json!({ "id": id }))
            .await?;
        if data.delete_registry {
            Ok(())
        } else {
            Err(ApiError::not_found("registry", id))
        }
    }

    /// List repositories stored in a registry
    pub async fn repositories(&self, id: &str) -> ApiResult<Vec<Repository>> {
        let data: GetData<RepositoryList> = self
            .graphql
            .execute(LIST_REPOSITORIES, json!({ "id": id }))
            .await?;
        data.registry
            .map(|r| r.repositories)
            .ok_or_else(|| ApiError::not_found("registry", id))
    }

    /// Issue an access token for a registry
    ///
    /// The secret is only returned by this call.
    pub async fn create_token(
        &self,
        registry_id: &str,
        request: &CreateTokenRequest,
    ) -> ApiResult<RegistryToken> {
        let input = request.to_input()?;
        let data: CreateTokenData = self
            .graphql
            .execute(
                CREATE_TOKEN,
                json!({ "registryId": registry_id, "input": input }),
            )
            .await?;
        Ok(data.create_registry_token)
    }

    /// Revoke an access token
    pub async fn revoke_token(&self, token_id: &str) -> ApiResult<()> {
        let data: RevokeTokenData = self
            .graphql
            .execute(REVOKE_TOKEN, json!({ "id": token_id }))
            .await?;
        if data.revoke_registry_token {
            Ok(())
        } else {
            Err(ApiError::not_found("registry token", token_id))
        }
    }

    /// Find a registry by its name
    pub async fn find_by_name(&self, name: &str) -> ApiResult<Registry> {
        let registries = self.list().await?;
        find_named(registries, "registry", name, |r| r.name.as_str())
    }
}

#[derive(Deserialize)]
struct ListData {
    registries: Vec<Registry>,
}

#[derive(Deserialize)]
struct GetData<T> {
    registry: Option<T>,
}

#[derive(Deserialize)]
struct RepositoryList {
    #[serde(default)]
    repositories: Vec<Repository>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateData {
    create_registry: Registry,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteData {
    delete_registry: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTokenData {
    create_registry_token: RegistryToken,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevokeTokenData {
    revoke_registry_token: bool,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registry visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Pull requires a token
    #[default]
    Private,
    /// Anonymous pull allowed
    Public,
}

/// Container registry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    /// Registry ID
    pub id: String,
    /// Registry name
    pub name: String,
    /// Hosting region
    pub region: String,
    /// Pull visibility
    pub visibility: Visibility,
    /// Hostname to push and pull against
    pub endpoint: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<FlexibleTimestamp>,
}

/// Create registry request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegistryRequest {
    /// Registry name
    pub name: String,
    /// Hosting region
    pub region: String,
    /// Pull visibility
    #[serde(default)]
    pub visibility: Visibility,
}

/// Image repository inside a registry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Number of tags
    #[serde(default)]
    pub tag_count: u32,
    /// Stored size in bytes
    pub size_bytes: Option<u64>,
    /// Last push time
    #[serde(default)]
    pub updated_at: Option<FlexibleTimestamp>,
}

/// Access scope of a registry token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenScope {
    /// Pull only
    Pull,
    /// Push only
    Push,
    /// Push and pull
    PushPull,
}

/// Registry access token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryToken {
    /// Token ID
    pub id: String,
    /// Token name
    pub name: String,
    /// Access scope
    pub scope: TokenScope,
    /// Secret, present only on creation
    pub token: Option<String>,
    /// Expiry, unset when the token never expires
    #[serde(default)]
    pub expires_at: Option<FlexibleTimestamp>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<FlexibleTimestamp>,
}

impl RegistryToken {
    /// Whether the token carries a set expiry
    #[must_use]
    pub fn expires(&self) -> bool {
        self.expires_at.is_some_and(|t| t.is_set())
    }
}

/// Create token request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    /// Token name
    pub name: String,
    /// Access scope
    pub scope: TokenScope,
    /// Lifetime as duration text such as `"90d"`; `None` never expires
    pub expires_in: Option<String>,
}

impl CreateTokenRequest {
    /// Token that never expires
    pub fn new(name: impl Into<String>, scope: TokenScope) -> Self {
        Self {
            name: name.into(),
            scope,
            expires_in: None,
        }
    }

    /// Token lifetime as duration text
    #[must_use]
    pub fn expires_in(mut self, text: impl Into<String>) -> Self {
        self.expires_in = Some(text.into());
        self
    }

    fn to_input(&self) -> ApiResult<TokenInput<'_>> {
        Ok(TokenInput {
            name: &self.name,
            scope: self.scope,
            expires_in: duration_millis(self.expires_in.as_deref(), "expires_in")?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenInput<'a> {
    name: &'a str,
    scope: TokenScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_client;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_token_input_converts_lifetime() {
        let request = CreateTokenRequest::new("ci", TokenScope::PushPull).expires_in("90d");
        let input = request.to_input().unwrap();

        assert_eq!(
            serde_json::to_value(input).unwrap(),
            json!({"name": "ci", "scope": "PUSH_PULL", "expiresIn": 7_776_000_000_i64})
        );
    }

    #[test]
    fn test_token_input_rejects_month() {
        let err = CreateTokenRequest::new("ci", TokenScope::Pull)
            .expires_in("3 months")
            .to_input()
            .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_token_expiry() {
        let token: RegistryToken = serde_json::from_value(json!({
            "id": "t1",
            "name": "ci",
            "scope": "PULL",
            "expiresAt": "2024-10-29 01:16:17 JST"
        }))
        .unwrap();
        assert!(token.expires());
        assert_eq!(
            token.expires_at.unwrap().canonical().as_deref(),
            Some("2024-10-29 01:16:17 +0900")
        );

        let token: RegistryToken = serde_json::from_value(json!({
            "id": "t2",
            "name": "forever",
            "scope": "PULL",
            "expiresAt": null
        }))
        .unwrap();
        assert!(!token.expires());
    }

    #[tokio::test]
    async fn test_create_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({
                "variables": {"registryId": "reg-1", "input": {"expiresIn": 3_600_000}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"createRegistryToken": {
                    "id": "t1",
                    "name": "deploy",
                    "scope": "PUSH",
                    "token": "secret",
                    "expiresAt": "2024-07-31T02:16:17+00:00"
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registries = mock_client(&server.uri(), |c| c).registries();
        let token = registries
            .create_token("reg-1", &CreateTokenRequest::new("deploy", TokenScope::Push).expires_in("1h"))
            .await
            .unwrap();

        assert_eq!(token.token.as_deref(), Some("secret"));
        assert!(token.expires());
    }

    #[tokio::test]
    async fn test_repositories_and_missing_registry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({"variables": {"id": "reg-1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"registry": {"repositories": [
                    {"name": "api", "tagCount": 4, "sizeBytes": 1024},
                    {"name": "worker"}
                ]}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({"variables": {"id": "reg-x"}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"registry": null}})),
            )
            .mount(&server)
            .await;

        let registries = mock_client(&server.uri(), |c| c).registries();
        let repos = registries.repositories("reg-1").await.unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[1].tag_count, 0);

        assert!(registries.repositories("reg-x").await.unwrap_err().is_not_found());
    }
}
