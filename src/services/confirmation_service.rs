// ============================================================================
// SERVICE : CONFIRMATIONS
// ============================================================================
//
// Description:
//   Porte les dépendances (store, notifier, clients externes) et les
//   étapes communes à tous les workflows:
//     1. créer la confirmation (clé longue / courte)
//     2. retrouver + contrôler (expiration, chaîne de validation)
//     3. persister (upsert)
//     4. notifier dans la langue du destinataire
//
// Les workflows sont répartis par domaine:
//   - password_reset.rs   : mot de passe oublié, reset, PIN reset
//   - invitations.rs      : invitations équipe de soin
//   - team_invitations.rs : équipes médicales
//
// Points d'attention:
//   - Un échec d'envoi n'annule pas la persistance: NotificationFailed
//     est renvoyé mais la confirmation reste acceptable par sa clé
//   - Violation de la chaîne = Forbidden (jamais le détail), sauf si seul
//     l'état diffère: action répétée sur un état terminal = Conflict
//
// ============================================================================

use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::{IdentityClient, Notifier, PermissionClient, ProfileClient, TeamClient};
use crate::config::ServiceSettings;
use crate::error::ServiceError;
use crate::models::confirmation::{Confirmation, ConfirmationType, Status};
use crate::models::context::ConfirmationContext;
use crate::models::profile::Creator;
use crate::models::validation::{Expectations, Violation};
use crate::services::templates::{self, EmailContent};
use crate::store::{ConfirmationQuery, ConfirmationStore};

pub struct ConfirmationService {
    pub(crate) store: Arc<dyn ConfirmationStore>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) identity: Arc<dyn IdentityClient>,
    pub(crate) permissions: Arc<dyn PermissionClient>,
    pub(crate) teams: Arc<dyn TeamClient>,
    pub(crate) profiles: Arc<dyn ProfileClient>,
    pub(crate) settings: ServiceSettings,
}

impl ConfirmationService {
    pub fn new(
        store: Arc<dyn ConfirmationStore>,
        notifier: Arc<dyn Notifier>,
        identity: Arc<dyn IdentityClient>,
        permissions: Arc<dyn PermissionClient>,
        teams: Arc<dyn TeamClient>,
        profiles: Arc<dyn ProfileClient>,
        settings: ServiceSettings,
    ) -> Self {
        Self { store, notifier, identity, permissions, teams, profiles, settings }
    }

    pub fn store(&self) -> &dyn ConfirmationStore {
        self.store.as_ref()
    }

    pub(crate) fn new_confirmation(
        &self,
        confirmation_type: ConfirmationType,
        creator_id: Option<&str>,
        context: Option<ConfirmationContext>,
    ) -> Result<Confirmation, ServiceError> {
        let mut confirmation = Confirmation::with_short_key_length(
            confirmation_type,
            creator_id,
            self.settings.short_key_length,
        )?;
        if let Some(context) = context {
            confirmation.add_context(context)?;
        }
        Ok(confirmation)
    }

    /// Recherche par clé; absente -> NotFound avec le message fourni
    pub(crate) async fn load_by_key(
        &self,
        key: &str,
        not_found: &str,
    ) -> Result<Confirmation, ServiceError> {
        if key.is_empty() {
            return Err(ServiceError::bad_request("Confirmation key is missing"));
        }
        self.store
            .find_confirmation(&ConfirmationQuery::by_key(key))
            .await?
            .ok_or_else(|| ServiceError::not_found(not_found))
    }

    /// Le plus récent d'abord: seul le premier résultat compte
    pub(crate) async fn newest(
        &self,
        query: &ConfirmationQuery,
        statuses: &[Status],
        types: &[ConfirmationType],
    ) -> Result<Option<Confirmation>, ServiceError> {
        Ok(self
            .store
            .find_confirmations(query, statuses, types)
            .await?
            .into_iter()
            .next())
    }

    /// Applique la chaîne de validation.
    /// Seul l'état ne correspond pas -> Conflict (action répétée),
    /// sinon toute violation -> Forbidden
    pub(crate) fn authorize(
        &self,
        expectations: &Expectations,
        confirmation: &Confirmation,
    ) -> Result<(), ServiceError> {
        let violations = expectations.check(confirmation);
        if violations.is_empty() {
            return Ok(());
        }

        for violation in &violations {
            warn!(
                "🚫 Confirmation {} rejected: {} ({})",
                confirmation.key(),
                violation,
                violation.code()
            );
        }

        if violations.iter().all(|v| matches!(v, Violation::Status { .. })) {
            return Err(ServiceError::conflict(format!(
                "Confirmation is already {}",
                confirmation.status
            )));
        }
        Err(ServiceError::Forbidden)
    }

    /// Renseigne user_id quand l'invité n'était pas encore identifié:
    /// seulement si l'utilisateur possède l'email de l'invitation
    pub(crate) async fn resolve_invitee(
        &self,
        confirmation: &mut Confirmation,
        user_id: &str,
    ) -> Result<(), ServiceError> {
        if confirmation.user_id.is_some() {
            return Ok(());
        }
        let Some(email) = confirmation.email.clone() else {
            return Ok(());
        };
        if let Some(user) = self.identity.find_user(user_id).await? {
            if user.has_email(&email) {
                info!("🔗 Invitee {} resolved for confirmation {}", user.user_id, confirmation.key());
                confirmation.user_id = Some(user.user_id);
            }
        }
        Ok(())
    }

    /// Langue: préférences du destinataire, puis langue du navigateur, puis défaut
    pub(crate) async fn recipient_language(
        &self,
        user_id: Option<&str>,
        browser_language: Option<&str>,
    ) -> Result<String, ServiceError> {
        if let Some(user_id) = user_id {
            let preferences = self.profiles.get_preferences(user_id).await?;
            if let Some(language) = preferences.display_language.filter(|l| !l.is_empty()) {
                return Ok(language);
            }
        }

        Ok(browser_language
            .and_then(templates::normalize_language)
            .map(str::to_string)
            .unwrap_or_else(|| self.settings.default_language.clone()))
    }

    /// Instantané du profil de l'auteur; un échec ne bloque pas le workflow
    pub(crate) async fn attach_creator(&self, confirmation: &mut Confirmation) {
        let Some(creator_id) = confirmation.creator_id.clone() else {
            return;
        };
        match self.profiles.get_profile(&creator_id).await {
            Ok(profile) => {
                confirmation.creator = Creator { user_id: Some(creator_id), profile };
            }
            Err(e) => warn!("⚠️  Could not load profile of {}: {}", creator_id, e),
        }
    }

    pub(crate) fn creator_name(confirmation: &Confirmation) -> String {
        confirmation
            .creator
            .profile
            .as_ref()
            .map(|p| p.display_name().to_string())
            .unwrap_or_default()
    }

    pub(crate) async fn save(&self, confirmation: &Confirmation) -> Result<(), ServiceError> {
        self.store.upsert_confirmation(confirmation).await?;
        Ok(())
    }

    /// Rend et envoie l'email lié à la confirmation
    pub(crate) async fn notify(
        &self,
        confirmation: &Confirmation,
        mut content: EmailContent,
        language: &str,
    ) -> Result<(), ServiceError> {
        let Some(email) = confirmation.email.clone() else {
            return Err(ServiceError::bad_request("Confirmation has no recipient"));
        };

        content.entry("SupportUrl").or_insert_with(|| self.settings.support_url.clone());
        let rendered = templates::render(confirmation.template_name(), language, &content);

        let outcome = self.notifier.send(&[email], &rendered.subject, &rendered.body).await;
        if !outcome.is_success() {
            warn!(
                "📧 Notification for {} ({}) failed: {} {}",
                confirmation.key(),
                confirmation.confirmation_type(),
                outcome.status,
                outcome.message
            );
            return Err(ServiceError::NotificationFailed(outcome.message));
        }

        info!(
            "📧 Notification sent for {} ({}, {})",
            confirmation.key(),
            confirmation.confirmation_type(),
            language
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn test_language_fallback_order() {
        let fixture = Fixture::new();
        fixture.profiles.set_language("UID-FR", "fr");
        let service = fixture.service();

        assert_eq!(service.recipient_language(Some("UID-FR"), Some("de")).await.unwrap(), "fr");
        assert_eq!(service.recipient_language(Some("UID-X"), Some("fr-CA")).await.unwrap(), "fr");
        assert_eq!(service.recipient_language(None, Some("de")).await.unwrap(), "en");
        assert_eq!(service.recipient_language(None, None).await.unwrap(), "en");
    }

    #[tokio::test]
    async fn test_authorize_distinguishes_repeat_from_forbidden() {
        let service = Fixture::new().service();
        let mut invite = Confirmation::new(ConfirmationType::CareteamInvite, Some("UID-A")).unwrap();
        invite.user_id = Some("UID-B".into());
        invite.update_status(Status::Completed);

        let repeat = Expectations::new().status(Status::Pending).creator_id("UID-A");
        assert!(matches!(service.authorize(&repeat, &invite), Err(ServiceError::Conflict(_))));

        let stranger = Expectations::new().status(Status::Pending).creator_id("UID-Z");
        assert!(matches!(service.authorize(&stranger, &invite), Err(ServiceError::Forbidden)));
    }

    #[tokio::test]
    async fn test_notification_failure_is_reported() {
        let fixture = Fixture::new();
        fixture.notifier.fail_with(502);
        let service = fixture.service();

        let mut reset = Confirmation::new(ConfirmationType::PasswordReset, None).unwrap();
        reset.email = Some("user@x.com".into());

        let err = service.notify(&reset, EmailContent::new(), "en").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotificationFailed(_)));
    }
}
