use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{ProfileClient, ServiceEndpoint};
use crate::error::ClientError;
use crate::models::profile::{Preferences, Profile};

#[derive(Debug, Default, Deserialize)]
struct PatientSettings {
    #[serde(default)]
    device: Option<Device>,
}

#[derive(Debug, Deserialize)]
struct Device {
    #[serde(default)]
    imei: String,
}

/// Collections par utilisateur: GET /{user}/preferences|profile|settings
pub struct HttpProfileClient {
    endpoint: ServiceEndpoint,
}

impl HttpProfileClient {
    pub fn new(client: Client, base_url: &str, server_token: &str) -> Self {
        Self { endpoint: ServiceEndpoint::new("profiles", client, base_url, server_token) }
    }
}

#[async_trait]
impl ProfileClient for HttpProfileClient {
    async fn get_preferences(&self, user_id: &str) -> Result<Preferences, ClientError> {
        Ok(self
            .endpoint
            .get_json(&format!("{}/preferences", user_id))
            .await?
            .unwrap_or_default())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, ClientError> {
        self.endpoint.get_json(&format!("{}/profile", user_id)).await
    }

    async fn get_device_id(&self, user_id: &str) -> Result<Option<String>, ClientError> {
        let settings: Option<PatientSettings> =
            self.endpoint.get_json(&format!("{}/settings", user_id)).await?;

        Ok(settings
            .and_then(|s| s.device)
            .map(|d| d.imei)
            .filter(|imei| !imei.is_empty()))
    }
}
