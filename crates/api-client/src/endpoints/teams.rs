//! Team endpoints

use crate::client::{Endpoint, Transport};
use crate::endpoints::find_named;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

/// Teams API interface
#[derive(Debug, Clone)]
pub struct TeamsApi {
    transport: Transport,
}

impl TeamsApi {
    /// Create a new teams API interface
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List teams the account belongs to
    ///
    /// GET /teams
    pub async fn list(&self) -> ApiResult<Vec<Team>> {
        self.transport.call(&Endpoint::get("/teams")).await
    }

    /// Create a team
    ///
    /// POST /team
    pub async fn create(&self, request: &CreateTeamRequest) -> ApiResult<Team> {
        self.transport
            .call_with(&Endpoint::post("/team"), request)
            .await
    }

    /// Delete a team
    ///
    /// DELETE /team/{team_id}
    pub async fn delete(&self, team_id: &str) -> ApiResult<()> {
        let endpoint = Endpoint::delete("/team/{team_id}").param("team_id", team_id);
        self.transport.call_empty(&endpoint).await
    }

    /// List members of a team
    ///
    /// GET /teams/{team_id}
    pub async fn members(&self, team_id: &str) -> ApiResult<Vec<TeamMember>> {
        let endpoint = Endpoint::get("/teams/{team_id}").param("team_id", team_id);
        self.transport.call(&endpoint).await
    }

    /// Add a member to a team
    ///
    /// POST /teams/member
    pub async fn add_member(&self, request: &TeamMemberRequest) -> ApiResult<TeamMember> {
        self.transport
            .call_with(&Endpoint::post("/teams/member"), request)
            .await
    }

    /// Remove a member from a team
    ///
    /// DELETE /teams/member
    pub async fn remove_member(&self, team_id: &str, member_email: &str) -> ApiResult<()> {
        let body = serde_json::json!({ "team_id": team_id, "member_email": member_email });
        self.transport
            .call_empty_with(&Endpoint::delete("/teams/member"), &body)
            .await
    }

    /// Find a team by its name
    pub async fn find_by_name(&self, name: &str) -> ApiResult<Team> {
        let teams = self.list().await?;
        find_named(teams, "team", name, |t| t.team_name.as_str())
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Team ID
    pub team_id: String,
    /// Team name
    pub team_name: String,
    /// Role of the calling account
    pub member_role: Option<MemberRole>,
    /// Payment method copied from the creator
    pub copy_cc: Option<bool>,
}

/// Create team request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamRequest {
    /// Team name
    pub team_name: String,
    /// Copy the creator's payment method to the team
    pub copy_cc: bool,
}

/// Role of a team member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Full control, including billing
    Owner,
    /// Manage resources and members
    Admin,
    /// Manage resources
    Dev,
    /// Billing only
    Finance,
}

/// Team member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Team ID
    pub team_id: String,
    /// Team name
    pub team_name: Option<String>,
    /// Member account email
    pub member_email: String,
    /// Member role
    pub member_role: MemberRole,
}

/// Add member request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberRequest {
    /// Team to add to
    pub team_id: String,
    /// Account email to add
    pub member_email: String,
    /// Role to grant
    pub member_role: MemberRole,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_team_deserialize() {
        let team: Team = serde_json::from_value(json!({
            "team_id": "tm1",
            "team_name": "platform",
            "member_role": "owner",
            "copy_cc": true
        }))
        .unwrap();

        assert_eq!(team.member_role, Some(MemberRole::Owner));
    }

    #[tokio::test]
    async fn test_member_management() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/teams/member"))
            .and(body_json(json!({
                "team_id": "tm1",
                "member_email": "dev@example.com",
                "member_role": "dev"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "team_id": "tm1",
                "team_name": "platform",
                "member_email": "dev@example.com",
                "member_role": "dev"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/teams/member"))
            .and(body_json(json!({"team_id": "tm1", "member_email": "dev@example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("OK")))
            .expect(1)
            .mount(&server)
            .await;

        let teams = mock_client(&server.uri(), |c| c).teams();
        let member = teams
            .add_member(&TeamMemberRequest {
                team_id: "tm1".to_string(),
                member_email: "dev@example.com".to_string(),
                member_role: MemberRole::Dev,
            })
            .await
            .unwrap();
        assert_eq!(member.member_role, MemberRole::Dev);

        teams.remove_member("tm1", "dev@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_upstream_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/team"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "team name taken"})),
            )
            .mount(&server)
            .await;

        let teams = mock_client(&server.uri(), |c| c).teams();
        let err = teams
            .create(&CreateTeamRequest {
                team_name: "platform".to_string(),
                copy_cc: false,
            })
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert!(err.to_string().contains("team name taken"));
    }
}
