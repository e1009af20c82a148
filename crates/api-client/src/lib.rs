//! Typed client for the platform add-ons management APIs
//!
//! This crate wraps the platform's management REST API, scheduler REST API and
//! GraphQL API behind one client with a facade per resource family.
//!
//! # Features
//!
//! - **Environment-based configuration**: Load URLs and credentials from environment variables or TOML
//! - **One transport per API surface**: Each bound to its own base URL and auth scheme
//! - **Typed endpoints**: Request and response structs mirror the upstream JSON
//! - **Request correlation**: Every request carries a unique `X-Request-ID`
//! - **Flexible values**: Duration text such as `"14d"` and multi-layout timestamps
//!
//! # Example
//!
//! ```rust,no_run
//! use addons_api_client::{AddonsClient, ClientConfig};
//! use addons_api_client::endpoints::kafka::CreateTopicRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AddonsClient::with_config(
//!         ClientConfig::default().with_credentials("ops@example.com", "api-key"),
//!     )?;
//!
//!     let cluster = client.kafka().find_cluster_by_name("events").await?;
//!     let topic = client
//!         .kafka()
//!         .create_topic(
//!             &CreateTopicRequest::new("orders", &cluster.cluster_id, 3).with_retention_time("14d"),
//!         )
//!         .await?;
//!     println!("Created topic {}", topic.topic_id);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod graphql;

pub use addons_core::{DurationUnit, FlexibleTimestamp};
pub use client::{AddonsClient, Auth, Endpoint, ResponseMeta, Transport};
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ApiResult};
pub use graphql::GraphqlClient;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::AddonsClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::{
        ConnectorsApi, DatabasesApi, KafkaApi, RedisApi, RegistriesApi, SchedulesApi, TeamsApi,
    };
    pub use crate::error::{ApiError, ApiResult};
    pub use addons_core::FlexibleTimestamp;
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{AddonsClient, ClientConfig};

    pub const EMAIL: &str = "ops@example.com";
    pub const API_KEY: &str = "test-key";
    /// `Basic base64("ops@example.com:test-key")`
    pub const BASIC_AUTH: &str = "Basic b3BzQGV4YW1wbGUuY29tOnRlc3Qta2V5";
    pub const GRAPHQL_TOKEN: &str = "gql-token";
    pub const SCHEDULER_TOKEN: &str = "sched-token";

    /// Client with every surface pointed at a mock server
    ///
    /// Management and scheduler APIs live at the server root, GraphQL at `/graphql`.
    pub fn mock_client(
        uri: &str,
        customize: impl FnOnce(ClientConfig) -> ClientConfig,
    ) -> AddonsClient {
        let config = ClientConfig::development()
            .with_api_url(uri)
            .with_scheduler_url(uri)
            .with_graphql_url(format!("{uri}/graphql"))
            .with_credentials(EMAIL, API_KEY)
            .with_token(GRAPHQL_TOKEN)
            .with_scheduler_token(SCHEDULER_TOKEN);

        AddonsClient::with_config(customize(config)).unwrap()
    }
}
