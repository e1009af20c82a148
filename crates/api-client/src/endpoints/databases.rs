//! Relational database endpoints
//!
//! Served by the GraphQL API. Every operation is a single document with
//! variables; the interesting part of `data` is unwrapped before returning.

use crate::endpoints::{duration_millis, find_named};
use crate::error::{ApiError, ApiResult};
use crate::graphql::GraphqlClient;
use addons_core::FlexibleTimestamp;
use serde::{Deserialize, Serialize};
use serde_json::json;

const DATABASE_FIELDS: &str = "id name engine version region plan status host port username \
                               backupRetention createdAt updatedAt";

const LIST_DATABASES: &str = "query ListDatabases { databases { ...DatabaseFields } }";
const GET_DATABASE: &str =
    "query GetDatabase($id: ID!) { database(id: $id) { ...DatabaseFields } }";
const CREATE_DATABASE: &str = "mutation CreateDatabase($input: CreateDatabaseInput!) \
                               { createDatabase(input: $input) { ...DatabaseFields } }";
const UPDATE_DATABASE: &str = "mutation UpdateDatabase($id: ID!, $input: UpdateDatabaseInput!) \
                               { updateDatabase(id: $id, input: $input) { ...DatabaseFields } }";
const DELETE_DATABASE: &str = "mutation DeleteDatabase($id: ID!) { deleteDatabase(id: $id) }";

/// Databases API interface
#[derive(Debug, Clone)]
pub struct DatabasesApi {
    graphql: GraphqlClient,
}

impl DatabasesApi {
    /// Create a new databases API interface
    pub(crate) fn new(graphql: GraphqlClient) -> Self {
        Self { graphql }
    }

    /// List database instances
    pub async fn list(&self) -> ApiResult<Vec<DatabaseInstance>> {
        let data: ListData = self.graphql.execute(&document(LIST_DATABASES), json!({})).await?;
        Ok(data.databases)
    }

    /// Get a database instance by ID
    pub async fn get(&self, id: &str) -> ApiResult<DatabaseInstance> {
        let data: GetData = self
            .graphql
            .execute(&document(GET_DATABASE), json!({ "id": id }))
            .await?;
        data.database
            .ok_or_else(|| ApiError::not_found("database", id))
    }

    /// Create a database instance
    pub async fn create(&self, request: &CreateInstanceRequest) -> ApiResult<DatabaseInstance> {
        let input = request.to_input()?;
        let data: CreateData = self
            .graphql
            .execute(&document(CREATE_DATABASE), json!({ "input": input }))
            .await?;
        Ok(data.create_database)
    }

    /// Update a database instance; unset fields are left unchanged
    pub async fn update(
        &self,
        id: &str,
        request: &UpdateInstanceRequest,
    ) -> ApiResult<DatabaseInstance> {
        let input = request.to_input()?;
        let data: UpdateData = self
            .graphql
            .execute(&document(UPDATE_DATABASE), json!({ "id": id, "input": input }))
            .await?;
        Ok(data.update_database)
    }

    /// Delete a database instance
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let data: DeleteData = self
            .graphql
            .execute(DELETE_DATABASE, json!({ "id": id }))
            .await?;
        if data.delete_database {
            Ok(())
        } else {
            Err(ApiError::not_found("database", id))
        }
    }

    /// Find a database instance by its name
    pub async fn find_by_name(&self, name: &str) -> ApiResult<DatabaseInstance> {
        let databases = self.list().await?;
        find_named(databases, "database", name, |d| d.name.as_str())
    }
}

/// Append the shared field fragment to an operation
fn document(operation: &str) -> String {
    format!("{operation} fragment DatabaseFields on Database {{ {DATABASE_FIELDS} }}")
}

#[derive(Deserialize)]
struct ListData {
    databases: Vec<DatabaseInstance>,
}

#[derive(Deserialize)]
struct GetData {
    database: Option<DatabaseInstance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateData {
    create_database: DatabaseInstance,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateData {
    update_database: DatabaseInstance,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteData {
    delete_database: bool,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Database engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatabaseEngine {
    /// PostgreSQL
    Postgres,
    /// MySQL
    Mysql,
}

/// Relational database instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInstance {
    /// Instance ID
    pub id: String,
    /// Instance name
    pub name: String,
    /// Database engine
    pub engine: DatabaseEngine,
    /// Engine version
    pub version: Option<String>,
    /// Hosting region
    pub region: String,
    /// Plan name
    pub plan: Option<String>,
    /// Provisioning status
    pub status: Option<String>,
    /// Connection host
    pub host: Option<String>,
    /// Connection port
    pub port: Option<u16>,
    /// Admin user name
    pub username: Option<String>,
    /// Milliseconds
    pub backup_retention: Option<i64>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<FlexibleTimestamp>,
    /// Last modification time
    #[serde(default)]
    pub updated_at: Option<FlexibleTimestamp>,
}

/// Create database request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstanceRequest {
    /// Instance name
    pub name: String,
    /// Database engine
    pub engine: DatabaseEngine,
    /// Hosting region
    pub region: String,
    /// Engine version, latest when unset
    pub version: Option<String>,
    /// Plan name, default plan when unset
    pub plan: Option<String>,
    /// Duration text such as `"7d"`
    pub backup_retention: Option<String>,
}

impl CreateInstanceRequest {
    /// Instance of `engine` in `region` with the default plan
    pub fn new(name: impl Into<String>, engine: DatabaseEngine, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine,
            region: region.into(),
            version: None,
            plan: None,
            backup_retention: None,
        }
    }

    /// Engine version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Plan name
    #[must_use]
    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    /// Backup retention as duration text
    #[must_use]
    pub fn with_backup_retention(mut self, text: impl Into<String>) -> Self {
        self.backup_retention = Some(text.into());
        self
    }

    fn to_input(&self) -> ApiResult<InstanceInput<'_>> {
        Ok(InstanceInput {
            name: Some(&self.name),
            engine: Some(self.engine),
            region: Some(&self.region),
            version: self.version.as_deref(),
            plan: self.plan.as_deref(),
            backup_retention: duration_millis(self.backup_retention.as_deref(), "backup_retention")?,
        })
    }
}

/// Update database request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInstanceRequest {
    /// New instance name
    pub name: Option<String>,
    /// New plan name
    pub plan: Option<String>,
    /// Duration text such as `"30d"`
    pub backup_retention: Option<String>,
}

impl UpdateInstanceRequest {
    fn to_input(&self) -> ApiResult<InstanceInput<'_>> {
        Ok(InstanceInput {
            name: self.name.as_deref(),
            engine: None,
            region: None,
            version: None,
            plan: self.plan.as_deref(),
            backup_retention: duration_millis(self.backup_retention.as_deref(), "backup_retention")?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    engine: Option<DatabaseEngine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup_retention: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_client;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn instance_json(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "engine": "POSTGRES",
            "version": "16",
            "region": "eu-central-1",
            "port": 5432,
            "backupRetention": 604_800_000,
            "createdAt": "2024-07-31T01:16:17Z",
            "updatedAt": null
        })
    }

    #[test]
    fn test_document_includes_fragment() {
        let doc = document(LIST_DATABASES);
        assert!(doc.starts_with("query ListDatabases"));
        assert!(doc.contains("fragment DatabaseFields on Database"));
        assert!(doc.contains("backupRetention"));
    }

    #[test]
    fn test_instance_deserialize() {
        let instance: DatabaseInstance =
            serde_json::from_value(instance_json("db-1", "orders")).unwrap();

        assert_eq!(instance.engine, DatabaseEngine::Postgres);
        assert_eq!(instance.backup_retention, Some(604_800_000));
        assert!(instance.created_at.unwrap().is_set());
        assert!(!instance.updated_at.unwrap_or_default().is_set());
    }

    #[test]
    fn test_update_input_skips_unset_fields() {
        let request = UpdateInstanceRequest {
            backup_retention: Some("30 days".to_string()),
            ..UpdateInstanceRequest::default()
        };

        let input = serde_json::to_value(request.to_input().unwrap()).unwrap();
        assert_eq!(input, json!({"backupRetention": 2_592_000_000_i64}));
    }

    #[tokio::test]
    async fn test_create_sends_retention_in_millis() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({
                "variables": {"input": {
                    "name": "orders",
                    "engine": "POSTGRES",
                    "region": "eu-central-1",
                    "backupRetention": 604_800_000
                }}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"createDatabase": instance_json("db-1", "orders")}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let databases = mock_client(&server.uri(), |c| c).databases();
        let created = databases
            .create(
                &CreateInstanceRequest::new("orders", DatabaseEngine::Postgres, "eu-central-1")
                    .with_backup_retention("1w"),
            )
            .await
            .unwrap();

        assert_eq!(created.id, "db-1");
    }

    #[tokio::test]
    async fn test_get_missing_and_graphql_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({"variables": {"id": "gone"}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"database": null}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({"variables": {"id": "locked"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{"message": "database is protected"}]
            })))
            .mount(&server)
            .await;

        let databases = mock_client(&server.uri(), |c| c).databases();
        assert!(databases.get("gone").await.unwrap_err().is_not_found());

        let err = databases.delete("locked").await.unwrap_err();
        assert!(matches!(err, ApiError::GraphQl(_)));
        assert!(err.to_string().contains("database is protected"));
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"databases": [instance_json("db-1", "orders"), instance_json("db-2", "users")]}
            })))
            .mount(&server)
            .await;

        let databases = mock_client(&server.uri(), |c| c).databases();
        assert_eq!(databases.find_by_name("users").await.unwrap().id, "db-2");
    }
}
