//! Change-data-capture connector endpoints
//!
//! Connectors run inside a Kafka cluster and stream changes from an external
//! database into topics (source) or from topics into a sink.

use crate::client::{Endpoint, Transport};
use crate::endpoints::find_named;
use crate::error::ApiResult;
use addons_core::FlexibleTimestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Connectors API interface
#[derive(Debug, Clone)]
pub struct ConnectorsApi {
    transport: Transport,
}

impl ConnectorsApi {
    /// Create a new connectors API interface
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List connectors of a cluster
    ///
    /// GET /kafka/connectors/{cluster_id}
    pub async fn list(&self, cluster_id: &str) -> ApiResult<Vec<Connector>> {
        let endpoint =
            Endpoint::get("/kafka/connectors/{cluster_id}").param("cluster_id", cluster_id);
        self.transport.call(&endpoint).await
    }

    /// Get a connector by ID
    ///
    /// GET /kafka/connector/{connector_id}
    pub async fn get(&self, connector_id: &str) -> ApiResult<Connector> {
        let endpoint =
            Endpoint::get("/kafka/connector/{connector_id}").param("connector_id", connector_id);
        self.transport.call(&endpoint).await
    }

    /// Create a connector in a cluster
    ///
    /// POST /kafka/connector/{cluster_id}
    pub async fn create(
        &self,
        cluster_id: &str,
        request: &CreateConnectorRequest,
    ) -> ApiResult<Connector> {
        let endpoint =
            Endpoint::post("/kafka/connector/{cluster_id}").param("cluster_id", cluster_id);
        self.transport.call_with(&endpoint, request).await
    }

    /// Replace connector properties
    ///
    /// POST /kafka/update-connector/{connector_id}
    pub async fn reconfigure(
        &self,
        connector_id: &str,
        properties: &Map<String, Value>,
    ) -> ApiResult<Connector> {
        let endpoint = Endpoint::post("/kafka/update-connector/{connector_id}")
            .param("connector_id", connector_id);
        self.transport.call_with(&endpoint, properties).await
    }

    /// Pause a running connector
    ///
    /// POST /kafka/connector/{connector_id}/pause
    pub async fn pause(&self, connector_id: &str) -> ApiResult<()> {
        self.action(connector_id, ConnectorAction::Pause).await
    }

    /// Resume a paused connector
    ///
    /// POST /kafka/connector/{connector_id}/resume
    pub async fn resume(&self, connector_id: &str) -> ApiResult<()> {
        self.action(connector_id, ConnectorAction::Resume).await
    }

    /// Restart a connector and its tasks
    ///
    /// POST /kafka/connector/{connector_id}/restart
    pub async fn restart(&self, connector_id: &str) -> ApiResult<()> {
        self.action(connector_id, ConnectorAction::Restart).await
    }

    /// Delete a connector
    ///
    /// DELETE /kafka/connector/{connector_id}
    pub async fn delete(&self, connector_id: &str) -> ApiResult<()> {
        let endpoint =
            Endpoint::delete("/kafka/connector/{connector_id}").param("connector_id", connector_id);
        self.transport.call_empty(&endpoint).await
    }

    /// Find a connector of a cluster by its name
    pub async fn find_by_name(&self, cluster_id: &str, name: &str) -> ApiResult<Connector> {
        let connectors = self.list(cluster_id).await?;
        find_named(connectors, "connector", name, |c| c.name.as_str())
    }

    async fn action(&self, connector_id: &str, action: ConnectorAction) -> ApiResult<()> {
        let endpoint = Endpoint::post("/kafka/connector/{connector_id}/{action}")
            .param("connector_id", connector_id)
            .param("action", action.as_str());
        self.transport.call_empty(&endpoint).await
    }
}

#[derive(Debug, Clone, Copy)]
enum ConnectorAction {
    Pause,
    Resume,
    Restart,
}

impl ConnectorAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Restart => "restart",
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Connector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    /// Connector ID
    pub connector_id: String,
    /// Connector name
    pub name: String,
    /// Kafka cluster the connector runs in
    pub cluster_id: String,
    /// Fully qualified connector class
    pub connector_class: Option<String>,
    /// Running, paused, failed, ...
    pub state: Option<String>,
    /// Error reported with a failed state
    pub state_error_message: Option<String>,
    /// State reported by the connect worker
    pub connector_state: Option<String>,
    /// Runtime tasks
    #[serde(default)]
    pub tasks: Vec<ConnectorTask>,
    /// Topics read or written
    pub topics: Option<Vec<String>>,
    /// Connector properties as configured
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<FlexibleTimestamp>,
}

/// Runtime task of a connector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorTask {
    /// Task index
    pub id: i64,
    /// Task state, e.g. `RUNNING`
    pub state: String,
    /// Stack trace of a failed task
    pub trace: Option<String>,
}

/// Create connector request
///
/// `properties` is passed through verbatim, including `connector.class`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConnectorRequest {
    /// Connector name
    pub name: String,
    /// Connector properties
    pub properties: Map<String, Value>,
}

impl CreateConnectorRequest {
    /// Connector with an empty property set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Map::new(),
        }
    }

    /// Set one connector property
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
