//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one resource family.
//!
//! | Module | Transport | Resources |
//! |--------|-----------|-----------|
//! | `kafka` | management REST | clusters, topics, credentials |
//! | `connectors` | management REST | change-data-capture connectors |
//! | `redis` | management REST | key-value databases |
//! | `teams` | management REST | teams and members |
//! | `schedules` | scheduler REST | recurring jobs |
//! | `databases` | GraphQL | relational database instances |
//! | `registries` | GraphQL | container registries and access tokens |

pub mod connectors;
pub mod databases;
pub mod kafka;
pub mod redis;
pub mod registries;
pub mod schedules;
pub mod teams;

pub use connectors::ConnectorsApi;
pub use databases::DatabasesApi;
pub use kafka::KafkaApi;
pub use redis::RedisApi;
pub use registries::RegistriesApi;
pub use schedules::SchedulesApi;
pub use teams::TeamsApi;

use crate::error::{ApiError, ApiResult};
use addons_core::ResultExt;

/// Pick the first item whose key equals `name`
pub(crate) fn find_named<T>(
    items: Vec<T>,
    kind: &'static str,
    name: &str,
    key: impl Fn(&T) -> &str,
) -> ApiResult<T> {
    items
        .into_iter()
        .find(|item| key(item) == name)
        .ok_or_else(|| ApiError::not_found(kind, name))
}

/// Convert optional duration text into milliseconds for a request body field
pub(crate) fn duration_millis(text: Option<&str>, field: &str) -> ApiResult<Option<i64>> {
    text.map(|t| addons_core::parse_duration(t).context(field))
        .transpose()
        .map_err(ApiError::from)
}
