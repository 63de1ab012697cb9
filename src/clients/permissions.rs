use async_trait::async_trait;
use reqwest::{Client, Method};
use std::collections::BTreeMap;

use super::{PermissionClient, ServiceEndpoint};
use crate::error::ClientError;
use crate::models::context::Permissions;

/// Partage de données: POST /access/{granter}/{grantee}, GET /access/{sharer}
pub struct HttpPermissionClient {
    endpoint: ServiceEndpoint,
}

impl HttpPermissionClient {
    pub fn new(client: Client, base_url: &str, server_token: &str) -> Self {
        Self { endpoint: ServiceEndpoint::new("permissions", client, base_url, server_token) }
    }
}

#[async_trait]
impl PermissionClient for HttpPermissionClient {
    async fn set_permissions(
        &self,
        granter_id: &str,
        grantee_id: &str,
        permissions: &Permissions,
    ) -> Result<(), ClientError> {
        self.endpoint
            .send_json(
                Method::POST,
                &format!("access/{}/{}", granter_id, grantee_id),
                permissions,
            )
            .await
    }

    async fn get_direct_shares(&self, sharer_id: &str) -> Result<Vec<String>, ClientError> {
        // { "<viewerId>": { ...permissions } }
        let shares: Option<BTreeMap<String, Permissions>> =
            self.endpoint.get_json(&format!("access/{}", sharer_id)).await?;

        Ok(shares
            .unwrap_or_default()
            .into_keys()
            .filter(|viewer| viewer != sharer_id)
            .collect())
    }
}
