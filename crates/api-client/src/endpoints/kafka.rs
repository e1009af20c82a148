//! Kafka endpoints
//!
//! Maps to the `/kafka/*` routes of the management API:
//! - Clusters: list, get, create, rename, reset password, delete
//! - Topics: list, get, create, reconfigure, delete
//! - Credentials: list, create, delete
//!
//! Topic retention is given as duration text (`"14d"`) and sent in milliseconds.

use crate::client::{Endpoint, Transport};
use crate::endpoints::{duration_millis, find_named};
use crate::error::ApiResult;
use addons_core::FlexibleTimestamp;
use serde::{Deserialize, Serialize};

/// Kafka API interface
#[derive(Debug, Clone)]
pub struct KafkaApi {
    transport: Transport,
}

impl KafkaApi {
    /// Create a new Kafka API interface
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    // -------------------------------------------------------------------------
    // Clusters
    // -------------------------------------------------------------------------

    /// List clusters
    ///
    /// GET /kafka/clusters
    pub async fn list_clusters(&self) -> ApiResult<Vec<KafkaCluster>> {
        self.transport.call(&Endpoint::get("/kafka/clusters")).await
    }

    /// Get a cluster by ID
    ///
    /// GET /kafka/cluster/{cluster_id}
    pub async fn get_cluster(&self, cluster_id: &str) -> ApiResult<KafkaCluster> {
        let endpoint = Endpoint::get("/kafka/cluster/{cluster_id}").param("cluster_id", cluster_id);
        self.transport.call(&endpoint).await
    }

    /// Create a cluster
    ///
    /// POST /kafka/cluster
    pub async fn create_cluster(&self, request: &CreateClusterRequest) -> ApiResult<KafkaCluster> {
        self.transport
            .call_with(&Endpoint::post("/kafka/cluster"), request)
            .await
    }

    /// Rename a cluster
    ///
    /// POST /kafka/rename-cluster/{cluster_id}
    pub async fn rename_cluster(&self, cluster_id: &str, name: &str) -> ApiResult<KafkaCluster> {
        let endpoint =
            Endpoint::post("/kafka/rename-cluster/{cluster_id}").param("cluster_id", cluster_id);
        self.transport
            .call_with(&endpoint, &serde_json::json!({ "name": name }))
            .await
    }

    /// Rotate the cluster password
    ///
    /// POST /kafka/reset-password/{cluster_id}
    pub async fn reset_password(&self, cluster_id: &str) -> ApiResult<KafkaCluster> {
        let endpoint =
            Endpoint::post("/kafka/reset-password/{cluster_id}").param("cluster_id", cluster_id);
        self.transport.call(&endpoint).await
    }

    /// Delete a cluster
    ///
    /// DELETE /kafka/cluster/{cluster_id}
    pub async fn delete_cluster(&self, cluster_id: &str) -> ApiResult<()> {
        let endpoint =
            Endpoint::delete("/kafka/cluster/{cluster_id}").param("cluster_id", cluster_id);
        self.transport.call_empty(&endpoint).await
    }

    /// Find a cluster by its name
    pub async fn find_cluster_by_name(&self, name: &str) -> ApiResult<KafkaCluster> {
        let clusters = self.list_clusters().await?;
        find_named(clusters, "kafka cluster", name, |c| c.name.as_str())
    }

    // -------------------------------------------------------------------------
    // Topics
    // -------------------------------------------------------------------------

    /// List topics of a cluster
    ///
    /// GET /kafka/topics/{cluster_id}
    pub async fn list_topics(&self, cluster_id: &str) -> ApiResult<Vec<KafkaTopic>> {
        let endpoint = Endpoint::get("/kafka/topics/{cluster_id}").param("cluster_id", cluster_id);
        self.transport.call(&endpoint).await
    }

    /// Get a topic by ID
    ///
    /// GET /kafka/topic/{topic_id}
    pub async fn get_topic(&self, topic_id: &str) -> ApiResult<KafkaTopic> {
        let endpoint = Endpoint::get("/kafka/topic/{topic_id}").param("topic_id", topic_id);
        self.transport.call(&endpoint).await
    }

    /// Create a topic
    ///
    /// POST /kafka/topic
    pub async fn create_topic(&self, request: &CreateTopicRequest) -> ApiResult<KafkaTopic> {
        let body = request.to_body()?;
        self.transport
            .call_with(&Endpoint::post("/kafka/topic"), &body)
            .await
    }

    /// Change retention and size limits of a topic
    ///
    /// POST /kafka/update-topic/{topic_id}
    pub async fn reconfigure_topic(
        &self,
        topic_id: &str,
        request: &ReconfigureTopicRequest,
    ) -> ApiResult<KafkaTopic> {
        let body = request.to_body()?;
        let endpoint = Endpoint::post("/kafka/update-topic/{topic_id}").param("topic_id", topic_id);
        self.transport.call_with(&endpoint, &body).await
    }

    /// Delete a topic
    ///
    /// DELETE /kafka/topic/{topic_id}
    pub async fn delete_topic(&self, topic_id: &str) -> ApiResult<()> {
        let endpoint = Endpoint::delete("/kafka/topic/{topic_id}").param("topic_id", topic_id);
        self.transport.call_empty(&endpoint).await
    }

    /// Find a topic of a cluster by its name
    pub async fn find_topic_by_name(&self, cluster_id: &str, name: &str) -> ApiResult<KafkaTopic> {
        let topics = self.list_topics(cluster_id).await?;
        find_named(topics, "kafka topic", name, |t| t.topic_name.as_str())
    }

    // -------------------------------------------------------------------------
    // Credentials
    // -------------------------------------------------------------------------

    /// List credentials across all clusters
    ///
    /// GET /kafka/credentials
    pub async fn list_credentials(&self) -> ApiResult<Vec<KafkaCredential>> {
        self.transport.call(&Endpoint::get("/kafka/credentials")).await
    }

    /// Create a credential scoped to a topic
    ///
    /// POST /kafka/credential
    pub async fn create_credential(
        &self,
        request: &CreateCredentialRequest,
    ) -> ApiResult<KafkaCredential> {
        self.transport
            .call_with(&Endpoint::post("/kafka/credential"), request)
            .await
    }

    /// Delete a credential
    ///
    /// DELETE /kafka/credential/{credential_id}
    pub async fn delete_credential(&self, credential_id: &str) -> ApiResult<()> {
        let endpoint = Endpoint::delete("/kafka/credential/{credential_id}")
            .param("credential_id", credential_id);
        self.transport.call_empty(&endpoint).await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Kafka cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaCluster {
    /// Cluster ID
    pub cluster_id: String,
    /// Cluster name
    pub name: String,
    /// Hosting region
    pub region: String,
    /// Pricing plan, sent as `type`
    #[serde(rename = "type")]
    pub plan: Option<String>,
    /// Replicated across availability zones
    pub multizone: Option<bool>,
    /// Broker bootstrap endpoint
    pub tcp_endpoint: Option<String>,
    /// REST proxy endpoint
    pub rest_endpoint: Option<String>,
    /// Provisioning state
    pub state: Option<String>,
    /// SASL user name
    pub username: Option<String>,
    /// SASL password
    pub password: Option<String>,
    /// Plan limit on retention in bytes
    pub max_retention_size: Option<i64>,
    /// Plan limit on retention in milliseconds
    pub max_retention_time: Option<i64>,
    /// Plan limit on throughput
    pub max_messages_per_second: Option<i64>,
    /// Plan limit on message size in bytes
    pub max_message_size: Option<i64>,
    /// Plan limit on partitions
    pub max_partitions: Option<i64>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<FlexibleTimestamp>,
}

/// Create cluster request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClusterRequest {
    /// Cluster name
    pub name: String,
    /// Hosting region
    pub region: String,
    /// Replicate across availability zones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multizone: Option<bool>,
}

impl CreateClusterRequest {
    /// Single-zone cluster in a region
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            multizone: None,
        }
    }

    /// Replicate across availability zones
    #[must_use]
    pub fn multizone(mut self, multizone: bool) -> Self {
        self.multizone = Some(multizone);
        self
    }
}

/// Log cleanup policy of a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupPolicy {
    /// Drop segments older than the retention limits
    Delete,
    /// Keep the latest record per key
    Compact,
}

/// Kafka topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaTopic {
    /// Topic ID
    pub topic_id: String,
    /// Topic name
    pub topic_name: String,
    /// Owning cluster
    pub cluster_id: String,
    /// Hosting region
    pub region: Option<String>,
    /// Partition count
    pub partitions: Option<u32>,
    /// Retention in milliseconds
    pub retention_time: Option<i64>,
    /// Retention in bytes
    pub retention_size: Option<i64>,
    /// Largest accepted message in bytes
    pub max_message_size: Option<i64>,
    /// Log cleanup policy
    pub cleanup_policy: Option<CleanupPolicy>,
    /// Provisioning state
    pub state: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<FlexibleTimestamp>,
}

/// Create topic request
///
/// `retention_time` is duration text such as `"7d"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTopicRequest {
    /// Topic name
    pub name: String,
    /// Owning cluster
    pub cluster_id: String,
    /// Partition count
    pub partitions: u32,
    /// Retention as duration text
    pub retention_time: Option<String>,
    /// Retention in bytes
    pub retention_size: Option<i64>,
    /// Largest accepted message in bytes
    pub max_message_size: Option<i64>,
    /// Log cleanup policy
    pub cleanup_policy: Option<CleanupPolicy>,
}

/// Wire body of topic create/update calls
#[derive(Debug, Serialize)]
struct TopicBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cluster_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partitions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retention_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retention_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_message_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cleanup_policy: Option<CleanupPolicy>,
}

impl CreateTopicRequest {
    /// Topic with a partition count and cluster defaults for everything else
    pub fn new(name: impl Into<String>, cluster_id: impl Into<String>, partitions: u32) -> Self {
        Self {
            name: name.into(),
            cluster_id: cluster_id.into(),
            partitions,
            ..Self::default()
        }
    }

    /// Retention as duration text, e.g. `"14d"`
    #[must_use]
    pub fn with_retention_time(mut self, text: impl Into<String>) -> Self {
        self.retention_time = Some(text.into());
        self
    }

    /// Retention in bytes
    #[must_use]
    pub fn with_retention_size(mut self, bytes: i64) -> Self {
        self.retention_size = Some(bytes);
        self
    }

    /// Largest accepted message in bytes
    #[must_use]
    pub fn with_max_message_size(mut self, bytes: i64) -> Self {
        self.max_message_size = Some(bytes);
        self
    }

    /// Cleanup policy
    #[must_use]
    pub fn with_cleanup_policy(mut self, policy: CleanupPolicy) -> Self {
        self.cleanup_policy = Some(policy);
        self
    }

    fn to_body(&self) -> ApiResult<TopicBody<'_>> {
        Ok(TopicBody {
            name: Some(&self.name),
            cluster_id: Some(&self.cluster_id),
            partitions: Some(self.partitions),
            retention_time: duration_millis(self.retention_time.as_deref(), "retention_time")?,
            retention_size: self.retention_size,
            max_message_size: self.max_message_size,
            cleanup_policy: self.cleanup_policy,
        })
    }
}

/// Reconfigure topic request; unset fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconfigureTopicRequest {
    /// Duration text such as `"3d"`
    pub retention_time: Option<String>,
    /// Retention in bytes
    pub retention_size: Option<i64>,
    /// Largest accepted message in bytes
    pub max_message_size: Option<i64>,
}

impl ReconfigureTopicRequest {
    fn to_body(&self) -> ApiResult<TopicBody<'_>> {
        Ok(TopicBody {
            name: None,
            cluster_id: None,
            partitions: None,
            retention_time: duration_millis(self.retention_time.as_deref(), "retention_time")?,
            retention_size: self.retention_size,
            max_message_size: self.max_message_size,
            cleanup_policy: None,
        })
    }
}

/// Topic permission of a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Produce and consume
    All,
    /// Produce only
    Produce,
    /// Consume only
    Consume,
}

/// Kafka credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaCredential {
    /// Credential ID
    pub credential_id: String,
    /// Credential name
    pub credential_name: String,
    /// Owning cluster
    pub cluster_id: String,
    /// Topic the credential is scoped to
    pub topic: String,
    /// Granted permission
    pub permissions: Permission,
    /// SASL user name
    pub username: Option<String>,
    /// SASL password
    pub password: Option<String>,
    /// Provisioning state
    pub state: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<FlexibleTimestamp>,
}

/// Create credential request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCredentialRequest {
    /// Credential name
    pub credential_name: String,
    /// Owning cluster
    pub cluster_id: String,
    /// Topic to scope to, `*` for all
    pub topic: String,
    /// Permission to grant
    pub permissions: Permission,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support::{mock_client, BASIC_AUTH};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cluster_json(id: &str, name: &str) -> serde_json::Value {
        json!({
            "cluster_id": id,
            "name": name,
            "region": "eu-west-1",
            "type": "payg",
            "multizone": false,
            "state": "active",
            "created_at": "2024-07-31 01:16:17 +0000"
        })
    }

    #[test]
    fn test_cluster_deserialize() {
        let cluster: KafkaCluster = serde_json::from_value(cluster_json("c1", "events")).unwrap();
        assert_eq!(cluster.cluster_id, "c1");
        assert_eq!(cluster.plan.as_deref(), Some("payg"));
        assert!(cluster.created_at.unwrap().is_set());
        assert!(cluster.tcp_endpoint.is_none());
    }

    #[test]
    fn test_topic_body_converts_retention() {
        let request = CreateTopicRequest::new("orders", "c1", 3)
            .with_retention_time("14d")
            .with_cleanup_policy(CleanupPolicy::Compact);

        let body = serde_json::to_value(request.to_body().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "orders",
                "cluster_id": "c1",
                "partitions": 3,
                "retention_time": 1_209_600_000_i64,
                "cleanup_policy": "compact"
            })
        );
    }

    #[tokio::test]
    async fn test_find_cluster_by_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/kafka/clusters"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                cluster_json("c1", "events"),
                cluster_json("c2", "audit"),
            ])))
            .mount(&server)
            .await;

        let kafka = mock_client(&server.uri(), |c| c).kafka();

        let cluster = kafka.find_cluster_by_name("audit").await.unwrap();
        assert_eq!(cluster.cluster_id, "c2");

        let err = kafka.find_cluster_by_name("billing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { kind: "kafka cluster", .. }));
    }

    #[tokio::test]
    async fn test_create_topic_sends_milliseconds() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/kafka/topic"))
            .and(body_json(json!({
                "name": "orders",
                "cluster_id": "c1",
                "partitions": 2,
                "retention_time": 604_800_000_i64
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "topic_id": "t1",
                "topic_name": "orders",
                "cluster_id": "c1",
                "partitions": 2,
                "retention_time": 604_800_000_i64,
                "created_at": "2024-07-31T01:16:17Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let kafka = mock_client(&server.uri(), |c| c).kafka();
        let topic = kafka
            .create_topic(&CreateTopicRequest::new("orders", "c1", 2).with_retention_time("1 week"))
            .await
            .unwrap();

        assert_eq!(topic.topic_id, "t1");
        assert_eq!(topic.retention_time, Some(604_800_000));
    }

    #[tokio::test]
    async fn test_invalid_retention_never_reaches_the_api() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let kafka = mock_client(&server.uri(), |c| c).kafka();
        let err = kafka
            .reconfigure_topic(
                "t1",
                &ReconfigureTopicRequest {
                    retention_time: Some("1month".to_string()),
                    ..ReconfigureTopicRequest::default()
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_validation_error());
    }

    #[tokio::test]
    async fn test_reconfigure_topic_sends_only_changes() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/kafka/update-topic/t1"))
            .and(body_json(json!({"retention_time": 3_600_000, "max_message_size": 1_048_576})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "topic_id": "t1",
                "topic_name": "orders",
                "cluster_id": "c1",
                "retention_time": 3_600_000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let kafka = mock_client(&server.uri(), |c| c).kafka();
        let topic = kafka
            .reconfigure_topic(
                "t1",
                &ReconfigureTopicRequest {
                    retention_time: Some("60m".to_string()),
                    max_message_size: Some(1_048_576),
                    ..ReconfigureTopicRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(topic.retention_time, Some(3_600_000));
    }

    #[tokio::test]
    async fn test_cluster_lifecycle_paths() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/kafka/rename-cluster/c1"))
            .and(body_json(json!({"name": "events-v2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(cluster_json("c1", "events-v2")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/kafka/cluster/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("OK")))
            .expect(1)
            .mount(&server)
            .await;

        let kafka = mock_client(&server.uri(), |c| c).kafka();
        let renamed = kafka.rename_cluster("c1", "events-v2").await.unwrap();
        assert_eq!(renamed.name, "events-v2");
        kafka.delete_cluster("c1").await.unwrap();
    }

    #[tokio::test]
    async fn test_create_credential() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/kafka/credential"))
            .and(body_json(json!({
                "credential_name": "reader",
                "cluster_id": "c1",
                "topic": "orders",
                "permissions": "CONSUME"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "credential_id": "cr1",
                "credential_name": "reader",
                "cluster_id": "c1",
                "topic": "orders",
                "permissions": "CONSUME",
                "username": "u",
                "password": "p"
            })))
            .mount(&server)
            .await;

        let kafka = mock_client(&server.uri(), |c| c).kafka();
        let credential = kafka
            .create_credential(&CreateCredentialRequest {
                credential_name: "reader".to_string(),
                cluster_id: "c1".to_string(),
                topic: "orders".to_string(),
                permissions: Permission::Consume,
            })
            .await
            .unwrap();

        assert_eq!(credential.permissions, Permission::Consume);
        assert!(credential.created_at.is_none());
    }
}
