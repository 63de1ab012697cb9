use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::json;
use tracing::info;

use super::{IdentityClient, ServiceEndpoint};
use crate::error::ClientError;
use crate::models::profile::UserIdentity;

/// Service d'identité: GET /user/{id|email}, PUT /user/{id}
pub struct HttpIdentityClient {
    endpoint: ServiceEndpoint,
}

impl HttpIdentityClient {
    pub fn new(client: Client, base_url: &str, server_token: &str) -> Self {
        Self { endpoint: ServiceEndpoint::new("identity", client, base_url, server_token) }
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn find_user(&self, id_or_email: &str) -> Result<Option<UserIdentity>, ClientError> {
        self.endpoint.get_json(&format!("user/{}", id_or_email)).await
    }

    async fn update_password(&self, user_id: &str, password: &str) -> Result<(), ClientError> {
        self.endpoint
            .send_json(
                Method::PUT,
                &format!("user/{}", user_id),
                &json!({ "updates": { "password": password } }),
            )
            .await?;
        info!("🔑 Password updated for user {}", user_id);
        Ok(())
    }
}
