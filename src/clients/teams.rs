use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::json;

use super::{ServiceEndpoint, TeamClient};
use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct Membership {
    #[serde(default)]
    role: String,
}

/// Équipes médicales: GET /teams/{team}/members/{user}, POST /teams/{team}/members
pub struct HttpTeamClient {
    endpoint: ServiceEndpoint,
}

impl HttpTeamClient {
    pub fn new(client: Client, base_url: &str, server_token: &str) -> Self {
        Self { endpoint: ServiceEndpoint::new("teams", client, base_url, server_token) }
    }

    async fn membership(&self, user_id: &str, team_id: &str) -> Result<Option<Membership>, ClientError> {
        self.endpoint
            .get_json(&format!("teams/{}/members/{}", team_id, user_id))
            .await
    }
}

#[async_trait]
impl TeamClient for HttpTeamClient {
    async fn is_team_member(&self, user_id: &str, team_id: &str) -> Result<bool, ClientError> {
        Ok(self.membership(user_id, team_id).await?.is_some())
    }

    async fn is_team_admin(&self, user_id: &str, team_id: &str) -> Result<bool, ClientError> {
        Ok(self
            .membership(user_id, team_id)
            .await?
            .is_some_and(|m| m.role == "admin"))
    }

    async fn add_member(&self, user_id: &str, team_id: &str, is_admin: bool) -> Result<(), ClientError> {
        let role = if is_admin { "admin" } else { "member" };
        self.endpoint
            .send_json(
                Method::POST,
                &format!("teams/{}/members", team_id),
                &json!({ "userId": user_id, "role": role }),
            )
            .await
    }
}
