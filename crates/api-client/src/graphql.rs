//! GraphQL request envelope on top of a [`Transport`]

use crate::client::{Endpoint, Transport};
use crate::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Request body sent to the GraphQL endpoint
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a, V> {
    /// Query or mutation document
    pub query: &'a str,
    /// Variables referenced by the document
    pub variables: V,
}

/// Response envelope returned by the GraphQL endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    /// Payload, absent when the operation failed as a whole
    pub data: Option<T>,
    /// Errors reported by the server
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// A single GraphQL error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// Error message
    pub message: String,
    /// Source locations in the document
    #[serde(default)]
    pub locations: Vec<GraphQlLocation>,
    /// Response path of the failing field
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

impl GraphQlError {
    /// Error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }
    }
}

/// Line and column of a GraphQL error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlLocation {
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl<T> GraphQlResponse<T> {
    /// Data when no errors were reported
    pub fn into_result(self, endpoint: &str) -> ApiResult<T> {
        if !self.errors.is_empty() {
            return Err(ApiError::GraphQl(self.errors));
        }
        self.data
            .ok_or_else(|| ApiError::EmptyResponse(endpoint.to_string()))
    }
}

/// GraphQL client posting documents to a single endpoint URL
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    transport: Transport,
}

impl GraphqlClient {
    /// Wrap a transport whose base URL is the GraphQL endpoint
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Underlying transport
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Execute a query or mutation and decode `data`
    pub async fn execute<V, T>(&self, query: &str, variables: V) -> ApiResult<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let operation = operation_name(query);
        debug!(operation = %operation, "Executing GraphQL operation");

        let response: GraphQlResponse<T> = self
            .transport
            .call_with(&Endpoint::post(""), &GraphQlRequest { query, variables })
            .await?;

        response.into_result(self.transport.base_url().as_str())
    }
}

/// Name of the first operation in a document, for logging
fn operation_name(query: &str) -> &str {
    query
        .split_whitespace()
        .skip_while(|word| !matches!(*word, "query" | "mutation"))
        .nth(1)
        .and_then(|name| name.split(['(', '{']).next())
        .filter(|name| !name.is_empty())
        .unwrap_or("anonymous")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_client, GRAPHQL_TOKEN};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_operation_name() {
        assert_eq!(operation_name("query ListDatabases { databases { id } }"), "ListDatabases");
        assert_eq!(
            operation_name("mutation DeleteRegistry($id: ID!) { deleteRegistry(id: $id) }"),
            "DeleteRegistry"
        );
        assert_eq!(operation_name("{ viewer { id } }"), "anonymous");
    }

    #[test]
    fn test_response_with_errors() {
        let response: GraphQlResponse<serde_json::Value> = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "not authorized", "locations": [{"line": 1, "column": 3}], "path": ["database"]}]
        }))
        .unwrap();

        let err = response.into_result("graphql").unwrap_err();
        match err {
            ApiError::GraphQl(errors) => {
                assert_eq!(errors[0].message, "not authorized");
                assert_eq!(errors[0].locations[0], GraphQlLocation { line: 1, column: 3 });
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_response_without_data() {
        let response: GraphQlResponse<serde_json::Value> =
            serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            response.into_result("graphql"),
            Err(ApiError::EmptyResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_posts_document_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", format!("Bearer {GRAPHQL_TOKEN}").as_str()))
            .and(body_partial_json(json!({"variables": {"id": "db-1"}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"answer": 42}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server.uri(), |c| c);
        let data: serde_json::Value = client
            .graphql()
            .execute("query Answer($id: ID!) { answer(id: $id) }", json!({"id": "db-1"}))
            .await
            .unwrap();

        assert_eq!(data["answer"], 42);
    }
}
