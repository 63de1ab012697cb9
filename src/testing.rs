// Doublures des collaborateurs externes pour les tests des workflows
use actix_web::web;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::clients::{
    IdentityClient, Notifier, PermissionClient, ProfileClient, SendOutcome, TeamClient,
};
use crate::config::ServiceSettings;
use crate::error::ClientError;
use crate::models::context::Permissions;
use crate::models::profile::{Preferences, Profile, UserIdentity};
use crate::services::ConfirmationService;
use crate::store::MemoryStore;
use crate::utils::jwt::{self, JwtVerifier, TEST_SECRET};

pub fn patient(user_id: &str, email: &str) -> UserIdentity {
    UserIdentity {
        user_id: user_id.to_string(),
        emails: vec![email.to_string()],
        roles: vec!["patient".to_string()],
    }
}

/// En-tête Authorization signé avec le secret de test
pub fn bearer(user_id: &str, server: bool) -> (&'static str, String) {
    let token = jwt::generate_token(TEST_SECRET, user_id, None, server).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

pub fn clinician(user_id: &str, email: &str) -> UserIdentity {
    UserIdentity {
        user_id: user_id.to_string(),
        emails: vec![email.to_string()],
        roles: vec!["hcp".to_string()],
    }
}

// ============================================================================
// IDENTITÉ
// ============================================================================

#[derive(Default)]
pub struct FakeIdentity {
    users: Mutex<Vec<UserIdentity>>,
    password_updates: Mutex<Vec<(String, String)>>,
    fail_updates: Mutex<bool>,
}

impl FakeIdentity {
    pub fn add(&self, user: UserIdentity) {
        self.users.lock().unwrap().push(user);
    }

    pub fn password_updates(&self) -> Vec<(String, String)> {
        self.password_updates.lock().unwrap().clone()
    }

    pub fn fail_updates(&self) {
        *self.fail_updates.lock().unwrap() = true;
    }
}

#[async_trait]
impl IdentityClient for FakeIdentity {
    async fn find_user(&self, id_or_email: &str) -> Result<Option<UserIdentity>, ClientError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user_id == id_or_email || u.has_email(id_or_email))
            .cloned())
    }

    async fn update_password(&self, user_id: &str, password: &str) -> Result<(), ClientError> {
        if *self.fail_updates.lock().unwrap() {
            return Err(ClientError::UnexpectedStatus { service: "identity", status: 500 });
        }
        self.password_updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), password.to_string()));
        Ok(())
    }
}

// ============================================================================
// PERMISSIONS
// ============================================================================

#[derive(Default)]
pub struct FakePermissions {
    shares: Mutex<HashMap<String, Vec<String>>>,
    granted: Mutex<Vec<(String, String, Permissions)>>,
}

impl FakePermissions {
    pub fn share(&self, sharer_id: &str, viewer_id: &str) {
        self.shares
            .lock()
            .unwrap()
            .entry(sharer_id.to_string())
            .or_default()
            .push(viewer_id.to_string());
    }

    pub fn granted(&self) -> Vec<(String, String, Permissions)> {
        self.granted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PermissionClient for FakePermissions {
    async fn set_permissions(
        &self,
        granter_id: &str,
        grantee_id: &str,
        permissions: &Permissions,
    ) -> Result<(), ClientError> {
        self.granted.lock().unwrap().push((
            granter_id.to_string(),
            grantee_id.to_string(),
            permissions.clone(),
        ));
        Ok(())
    }

    async fn get_direct_shares(&self, sharer_id: &str) -> Result<Vec<String>, ClientError> {
        Ok(self.shares.lock().unwrap().get(sharer_id).cloned().unwrap_or_default())
    }
}

// ============================================================================
// ÉQUIPES
// ============================================================================

#[derive(Default)]
pub struct FakeTeams {
    members: Mutex<HashSet<(String, String)>>,
    admins: Mutex<HashSet<(String, String)>>,
    added: Mutex<Vec<(String, String, bool)>>,
}

impl FakeTeams {
    pub fn make_member(&self, user_id: &str, team_id: &str) {
        self.members
            .lock()
            .unwrap()
            .insert((user_id.to_string(), team_id.to_string()));
    }

    pub fn make_admin(&self, user_id: &str, team_id: &str) {
        self.make_member(user_id, team_id);
        self.admins
            .lock()
            .unwrap()
            .insert((user_id.to_string(), team_id.to_string()));
    }

    pub fn added(&self) -> Vec<(String, String, bool)> {
        self.added.lock().unwrap().clone()
    }
}

#[async_trait]
impl TeamClient for FakeTeams {
    async fn is_team_member(&self, user_id: &str, team_id: &str) -> Result<bool, ClientError> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .contains(&(user_id.to_string(), team_id.to_string())))
    }

    async fn is_team_admin(&self, user_id: &str, team_id: &str) -> Result<bool, ClientError> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .contains(&(user_id.to_string(), team_id.to_string())))
    }

    async fn add_member(&self, user_id: &str, team_id: &str, is_admin: bool) -> Result<(), ClientError> {
        self.added
            .lock()
            .unwrap()
            .push((user_id.to_string(), team_id.to_string(), is_admin));
        Ok(())
    }
}

// ============================================================================
// PROFILS
// ============================================================================

#[derive(Default)]
pub struct FakeProfiles {
    languages: Mutex<HashMap<String, String>>,
    devices: Mutex<HashMap<String, String>>,
    profiles: Mutex<HashMap<String, Profile>>,
}

impl FakeProfiles {
    pub fn set_language(&self, user_id: &str, language: &str) {
        self.languages
            .lock()
            .unwrap()
            .insert(user_id.to_string(), language.to_string());
    }

    pub fn set_device(&self, user_id: &str, device_id: &str) {
        self.devices
            .lock()
            .unwrap()
            .insert(user_id.to_string(), device_id.to_string());
    }

    pub fn set_profile(&self, user_id: &str, full_name: &str) {
        let profile = Profile { full_name: full_name.to_string(), patient: None };
        self.profiles.lock().unwrap().insert(user_id.to_string(), profile);
    }
}

#[async_trait]
impl ProfileClient for FakeProfiles {
    async fn get_preferences(&self, user_id: &str) -> Result<Preferences, ClientError> {
        Ok(Preferences {
            display_language: self.languages.lock().unwrap().get(user_id).cloned(),
        })
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, ClientError> {
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn get_device_id(&self, user_id: &str) -> Result<Option<String>, ClientError> {
        Ok(self.devices.lock().unwrap().get(user_id).cloned())
    }
}

// ============================================================================
// NOTIFIER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMail>>,
    failure: Mutex<Option<u16>>,
}

impl RecordingNotifier {
    /// Mails acceptés (les envois en échec ne sont pas enregistrés)
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_with(&self, status: u16) {
        *self.failure.lock().unwrap() = Some(status);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> SendOutcome {
        if let Some(status) = *self.failure.lock().unwrap() {
            return SendOutcome::failed(status, "relay refused the message");
        }
        self.sent.lock().unwrap().push(SentMail {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        SendOutcome::ok()
    }
}

// ============================================================================
// FIXTURE
// ============================================================================

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub identity: Arc<FakeIdentity>,
    pub permissions: Arc<FakePermissions>,
    pub teams: Arc<FakeTeams>,
    pub profiles: Arc<FakeProfiles>,
    pub settings: ServiceSettings,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            notifier: Arc::new(RecordingNotifier::default()),
            identity: Arc::new(FakeIdentity::default()),
            permissions: Arc::new(FakePermissions::default()),
            teams: Arc::new(FakeTeams::default()),
            profiles: Arc::new(FakeProfiles::default()),
            settings: ServiceSettings::default(),
        }
    }

    /// Service branché sur les doublures (partagées avec la fixture)
    pub fn service(&self) -> ConfirmationService {
        ConfirmationService::new(
            self.store.clone(),
            self.notifier.clone(),
            self.identity.clone(),
            self.permissions.clone(),
            self.teams.clone(),
            self.profiles.clone(),
            self.settings.clone(),
        )
    }

    pub fn app_data(&self) -> web::Data<ConfirmationService> {
        web::Data::new(self.service())
    }

    /// Clé de vérification des jetons produits par `bearer`
    pub fn jwt(&self) -> web::Data<JwtVerifier> {
        web::Data::new(JwtVerifier::new(TEST_SECRET))
    }
}
