//! Redis database endpoints
//!
//! Maps to the `/redis/*` routes of the management API.

use crate::client::{Endpoint, Transport};
use crate::endpoints::find_named;
use crate::error::ApiResult;
use addons_core::FlexibleTimestamp;
use serde::{Deserialize, Serialize};

/// Redis API interface
#[derive(Debug, Clone)]
pub struct RedisApi {
    transport: Transport,
}

impl RedisApi {
    /// Create a new Redis API interface
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List databases
    ///
    /// GET /redis/databases
    pub async fn list(&self) -> ApiResult<Vec<RedisDatabase>> {
        self.transport.call(&Endpoint::get("/redis/databases")).await
    }

    /// Get a database by ID
    ///
    /// GET /redis/database/{database_id}
    pub async fn get(&self, database_id: &str) -> ApiResult<RedisDatabase> {
        self.transport
            .call(&database_endpoint(Endpoint::get("/redis/database/{database_id}"), database_id))
            .await
    }

    /// Create a database
    ///
    /// POST /redis/database
    pub async fn create(&self, request: &CreateDatabaseRequest) -> ApiResult<RedisDatabase> {
        self.transport
            .call_with(&Endpoint::post("/redis/database"), request)
            .await
    }

    /// Rename a database
    ///
    /// POST /redis/rename/{database_id}
    pub async fn rename(&self, database_id: &str, name: &str) -> ApiResult<RedisDatabase> {
        let endpoint = database_endpoint(Endpoint::post("/redis/rename/{database_id}"), database_id);
        self.transport
            .call_with(&endpoint, &serde_json::json!({ "name": name }))
            .await
    }

    /// Rotate the database password
    ///
    /// POST /redis/reset-password/{database_id}
    pub async fn reset_password(&self, database_id: &str) -> ApiResult<RedisDatabase> {
        let endpoint =
            database_endpoint(Endpoint::post("/redis/reset-password/{database_id}"), database_id);
        self.transport.call(&endpoint).await
    }

    /// Require TLS for client connections
    ///
    /// POST /redis/enable-tls/{database_id}
    pub async fn enable_tls(&self, database_id: &str) -> ApiResult<()> {
        let endpoint =
            database_endpoint(Endpoint::post("/redis/enable-tls/{database_id}"), database_id);
        self.transport.call_empty(&endpoint).await
    }

    /// Turn key eviction on or off
    ///
    /// POST /redis/enable-eviction/{database_id} or /redis/disable-eviction/{database_id}
    pub async fn set_eviction(&self, database_id: &str, enabled: bool) -> ApiResult<()> {
        let endpoint = if enabled {
            Endpoint::post("/redis/enable-eviction/{database_id}")
        } else {
            Endpoint::post("/redis/disable-eviction/{database_id}")
        };
        self.transport
            .call_empty(&database_endpoint(endpoint, database_id))
            .await
    }

    /// Replace the read regions of a global database
    ///
    /// POST /redis/update-regions/{database_id}
    pub async fn update_regions(&self, database_id: &str, read_regions: &[String]) -> ApiResult<()> {
        let endpoint =
            database_endpoint(Endpoint::post("/redis/update-regions/{database_id}"), database_id);
        self.transport
            .call_empty_with(&endpoint, &serde_json::json!({ "read_regions": read_regions }))
            .await
    }

    /// Delete a database
    ///
    /// DELETE /redis/database/{database_id}
    pub async fn delete(&self, database_id: &str) -> ApiResult<()> {
        let endpoint = database_endpoint(Endpoint::delete("/redis/database/{database_id}"), database_id);
        self.transport.call_empty(&endpoint).await
    }

    /// Find a database by its name
    pub async fn find_by_name(&self, name: &str) -> ApiResult<RedisDatabase> {
        let databases = self.list().await?;
        find_named(databases, "redis database", name, |d| d.database_name.as_str())
    }
}

fn database_endpoint(endpoint: Endpoint, database_id: &str) -> Endpoint {
    endpoint.param("database_id", database_id)
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Redis database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisDatabase {
    /// Database ID
    pub database_id: String,
    /// Database name
    pub database_name: String,
    /// Region, `global` for multi-region
    pub region: String,
    /// Primary region of a global database
    pub primary_region: Option<String>,
    /// Read replica regions
    #[serde(default)]
    pub read_regions: Vec<String>,
    /// Connection port
    pub port: Option<u16>,
    /// Connection host
    pub endpoint: Option<String>,
    /// Connection password
    pub password: Option<String>,
    /// REST API token
    pub rest_token: Option<String>,
    /// Read-only REST API token
    pub read_only_rest_token: Option<String>,
    /// Provisioning state
    pub state: Option<String>,
    /// Pricing plan, sent as `type`
    #[serde(rename = "type")]
    pub plan: Option<String>,
    /// TLS required
    pub tls: Option<bool>,
    /// Key eviction enabled
    pub eviction: Option<bool>,
    /// Automatic plan upgrade enabled
    pub auto_upgrade: Option<bool>,
    /// Plan limit on concurrent clients
    pub db_max_clients: Option<i64>,
    /// Plan limit on request size in bytes
    pub db_max_request_size: Option<i64>,
    /// Plan limit on disk in bytes
    pub db_disk_threshold: Option<i64>,
    /// Plan limit on memory in bytes
    pub db_memory_threshold: Option<i64>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<FlexibleTimestamp>,
}

/// Create database request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDatabaseRequest {
    /// Database name
    pub name: String,
    /// `global` for multi-region databases, otherwise a single region
    pub region: String,
    /// Primary region of a global database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_region: Option<String>,
    /// Read replica regions of a global database
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub read_regions: Vec<String>,
    /// Require TLS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    /// Enable key eviction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eviction: Option<bool>,
}

impl CreateDatabaseRequest {
    /// Single-region database
    pub fn regional(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            ..Self::default()
        }
    }

    /// Global database with a primary and optional read regions
    pub fn global(
        name: impl Into<String>,
        primary_region: impl Into<String>,
        read_regions: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region: "global".to_string(),
            primary_region: Some(primary_region.into()),
            read_regions,
            ..Self::default()
        }
    }
}
