// ============================================================================
// CLIENTS - SERVICES EXTERNES
// ============================================================================
//
// Description:
//   Contrats des collaborateurs externes, injectés dans ConfirmationService.
//
// Liste des modules:
//   - identity    : comptes utilisateurs (recherche, mot de passe)
//   - permissions : partage de données (accès patient -> équipe de soin)
//   - teams       : équipes médicales (membre, admin, ajout)
//   - profiles    : profils, préférences, terminal du patient
//   - notifier    : envoi des emails (null, relais HTTP)
//
// Points d'attention:
//   - Toutes les implémentations HTTP utilisent le jeton serveur (Bearer)
//   - 404 côté service externe = "absent" (Ok(None)), pas une erreur
//
// ============================================================================

pub mod identity;
pub mod notifier;
pub mod permissions;
pub mod profiles;
pub mod teams;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::ClientError;
use crate::models::context::Permissions;
use crate::models::profile::{Preferences, Profile, UserIdentity};

pub use identity::HttpIdentityClient;
pub use notifier::{HttpMailNotifier, Notifier, NullNotifier, SendOutcome};
pub use permissions::HttpPermissionClient;
pub use profiles::HttpProfileClient;
pub use teams::HttpTeamClient;

#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Recherche par identifiant ou par email
    async fn find_user(&self, id_or_email: &str) -> Result<Option<UserIdentity>, ClientError>;

    async fn update_password(&self, user_id: &str, password: &str) -> Result<(), ClientError>;
}

#[async_trait]
pub trait PermissionClient: Send + Sync {
    /// `granter_id` partage ses données avec `grantee_id`
    async fn set_permissions(
        &self,
        granter_id: &str,
        grantee_id: &str,
        permissions: &Permissions,
    ) -> Result<(), ClientError>;

    /// Utilisateurs avec qui `sharer_id` partage déjà ses données
    async fn get_direct_shares(&self, sharer_id: &str) -> Result<Vec<String>, ClientError>;
}

#[async_trait]
pub trait TeamClient: Send + Sync {
    async fn is_team_member(&self, user_id: &str, team_id: &str) -> Result<bool, ClientError>;

    async fn is_team_admin(&self, user_id: &str, team_id: &str) -> Result<bool, ClientError>;

    async fn add_member(&self, user_id: &str, team_id: &str, is_admin: bool)
        -> Result<(), ClientError>;
}

#[async_trait]
pub trait ProfileClient: Send + Sync {
    /// Préférences vides si l'utilisateur n'en a pas
    async fn get_preferences(&self, user_id: &str) -> Result<Preferences, ClientError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, ClientError>;

    /// Identifiant du terminal du patient (secret du PIN reset)
    async fn get_device_id(&self, user_id: &str) -> Result<Option<String>, ClientError>;
}

/// Base commune des clients HTTP: URL de base + jeton serveur
#[derive(Clone)]
pub(crate) struct ServiceEndpoint {
    service: &'static str,
    client: Client,
    base_url: String,
    token: String,
}

impl ServiceEndpoint {
    pub(crate) fn new(service: &'static str, client: Client, base_url: &str, token: &str) -> Self {
        Self {
            service,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn unexpected(&self, status: StatusCode) -> ClientError {
        warn!("⚠️  {} answered {}", self.service, status);
        ClientError::UnexpectedStatus { service: self.service, status: status.as_u16() }
    }

    /// GET JSON; 404 -> Ok(None)
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ClientError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<T>().await?)),
            status => Err(self.unexpected(status)),
        }
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.unexpected(status))
        }
    }
}
