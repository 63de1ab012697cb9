// Équipes médicales: invitation, passage admin, retrait d'un membre.
// Le nom d'équipe affiché est son identifiant (pas d'annuaire des équipes).
use tracing::{info, warn};

use super::ConfirmationService;
use crate::error::ServiceError;
use crate::middleware::AuthUser;
use crate::models::confirmation::{Confirmation, ConfirmationType, Status};
use crate::models::dto::TeamInviteRequest;
use crate::models::validation::Expectations;
use crate::services::invitations::{
    STATUS_EXISTING_INVITE, STATUS_EXISTING_MEMBER, STATUS_INVITE_EXPIRED, STATUS_INVITE_NOT_FOUND,
};
use crate::services::templates::EmailContent;
use crate::store::ConfirmationQuery;

const STATUS_NOT_ADMIN: &str = "Only team administrators can perform this operation";
const STATUS_ALREADY_ADMIN: &str = "The user is already an admin";
const STATUS_NOT_MEMBER: &str = "The user is not a member";
const STATUS_INVITE_NOT_ACTIVE: &str = "Invite already canceled";

impl ConfirmationService {
    /// Le jeton serveur est admin de toutes les équipes
    async fn ensure_team_admin(&self, caller: &AuthUser, team_id: &str) -> Result<(), ServiceError> {
        if caller.is_server {
            return Ok(());
        }
        if !self.teams.is_team_admin(&caller.user_id, team_id).await? {
            warn!("🔒 {} is not admin of team {}", caller.user_id, team_id);
            return Err(ServiceError::unauthorized(STATUS_NOT_ADMIN));
        }
        Ok(())
    }

    /// Notice d'équipe (admin / retrait) adressée à `request.email`
    fn team_notice(
        &self,
        caller: &AuthUser,
        confirmation_type: ConfirmationType,
        request: &TeamInviteRequest,
        user_id: Option<String>,
    ) -> Result<Confirmation, ServiceError> {
        let mut notice = self.new_confirmation(
            confirmation_type,
            Some(&caller.user_id),
            Some(request.permissions.clone().into()),
        )?;
        notice.team_id = Some(request.team_id.clone());
        notice.email = Some(request.email.clone());
        notice.is_admin = Some(request.is_admin);
        notice.user_id = user_id;
        Ok(notice)
    }

    /// Invite un soignant dans l'équipe `request.team_id`
    pub async fn send_team_invite(
        &self,
        caller: &AuthUser,
        request: &TeamInviteRequest,
    ) -> Result<Confirmation, ServiceError> {
        self.ensure_team_admin(caller, &request.team_id).await?;

        // 1. Invitation en cours de cet admin pour cette équipe
        let query = ConfirmationQuery::new()
            .creator_id(&caller.user_id)
            .email(&request.email)
            .team_id(&request.team_id)
            .confirmation_type(ConfirmationType::MedicalTeamInvite);
        if let Some(existing) = self.newest(&query, &[Status::Pending], &[]).await? {
            if !existing.is_expired() {
                info!("✋ Team invite {} not yet expired", existing.key());
                return Err(ServiceError::conflict(STATUS_EXISTING_INVITE));
            }
        }

        // 2. Déjà membre ?
        let invited = self.identity.find_user(&request.email).await?;
        if let Some(user) = &invited {
            if self.teams.is_team_member(&user.user_id, &request.team_id).await? {
                info!("✋ {} already member of {}", user.user_id, request.team_id);
                return Err(ServiceError::conflict(STATUS_EXISTING_MEMBER));
            }
        }

        // 3. Nouvelle invitation
        let mut invite = self.team_notice(
            caller,
            ConfirmationType::MedicalTeamInvite,
            request,
            invited.map(|u| u.user_id),
        )?;
        self.attach_creator(&mut invite).await;

        let language = self.recipient_language(invite.user_id.as_deref(), None).await?;

        self.save(&invite).await?;
        info!("📝 Team invite {} created for team {}", invite.key(), request.team_id);

        let web_path = if invite.user_id.is_some() { "" } else { "hcp/signup" };
        let content = EmailContent::from([
            ("MedicalteamName", request.team_id.clone()),
            ("CreatorName", Self::creator_name(&invite)),
            ("Email", request.email.clone()),
            ("WebPath", web_path.to_string()),
            ("Key", invite.key().to_string()),
        ]);
        self.notify(&invite, content, &language).await?;

        Ok(invite)
    }

    /// L'invité rejoint l'équipe
    pub async fn accept_team_invite(
        &self,
        caller: &AuthUser,
        key: &str,
    ) -> Result<Confirmation, ServiceError> {
        let mut invite = self.load_by_key(key, STATUS_INVITE_NOT_FOUND).await?;

        if invite.is_expired() {
            info!("⌛ Team invite {} has expired", invite.key());
            return Err(ServiceError::Expired(STATUS_INVITE_EXPIRED.to_string()));
        }

        self.resolve_invitee(&mut invite, &caller.user_id).await?;
        self.authorize(
            &Expectations::new()
                .status(Status::Pending)
                .confirmation_type(ConfirmationType::MedicalTeamInvite)
                .user_id(&caller.user_id),
            &invite,
        )?;

        let Some(team_id) = invite.team_id.clone() else {
            return Err(ServiceError::bad_request("Invite has no team"));
        };
        self.teams
            .add_member(&caller.user_id, &team_id, invite.is_admin.unwrap_or(false))
            .await?;
        info!("🤝 {} joined team {}", caller.user_id, team_id);

        invite.update_status(Status::Completed);
        self.save(&invite).await?;

        Ok(invite)
    }

    /// Décline une invitation d'équipe. Un admin de l'équipe agit pour
    /// n'importe quelle invitation de l'équipe, un utilisateur pour les siennes.
    pub async fn dismiss_team_invite(
        &self,
        caller: &AuthUser,
        team_id: &str,
        key: &str,
    ) -> Result<Confirmation, ServiceError> {
        if team_id.is_empty() {
            return Err(ServiceError::bad_request("Team id is missing"));
        }
        let mut invite = self.load_by_key(key, STATUS_INVITE_NOT_FOUND).await?;

        let is_admin = self.teams.is_team_admin(&caller.user_id, team_id).await.unwrap_or_else(|e| {
            warn!("⚠️  Could not check admin rights of {}: {}", caller.user_id, e);
            false
        });

        let same_team = invite.team_id.as_deref() == Some(team_id);
        let visible = if is_admin {
            same_team
        } else if caller.is_server {
            true
        } else {
            self.resolve_invitee(&mut invite, &caller.user_id).await?;
            same_team && invite.user_id.as_deref() == Some(caller.user_id.as_str())
        };
        if !visible || invite.confirmation_type() != ConfirmationType::MedicalTeamInvite {
            return Err(ServiceError::not_found(STATUS_INVITE_NOT_FOUND));
        }

        match invite.status {
            Status::Declined | Status::Canceled => {
                info!("↩️  Team invite {} already {}", invite.key(), invite.status);
                Err(ServiceError::NotModified(STATUS_INVITE_NOT_ACTIVE.to_string()))
            }
            Status::Completed => Err(ServiceError::conflict("Invite is already completed")),
            Status::Pending => {
                invite.update_status(Status::Declined);
                self.save(&invite).await?;
                info!("👋 Team invite {} dismissed for team {}", invite.key(), team_id);
                Ok(invite)
            }
        }
    }

    /// Notice "vous êtes admin": enregistrée directement Completed
    pub async fn grant_team_admin(
        &self,
        caller: &AuthUser,
        request: &TeamInviteRequest,
    ) -> Result<Confirmation, ServiceError> {
        self.ensure_team_admin(caller, &request.team_id).await?;
        if !request.is_admin {
            return Err(ServiceError::bad_request("isAdmin must be true to grant admin rights"));
        }

        let invited = self.identity.find_user(&request.email).await?;
        if let Some(user) = &invited {
            if self.teams.is_team_admin(&user.user_id, &request.team_id).await? {
                return Err(ServiceError::conflict(STATUS_ALREADY_ADMIN));
            }
        }

        let mut notice = self.team_notice(
            caller,
            ConfirmationType::MedicalTeamDoAdmin,
            request,
            invited.map(|u| u.user_id),
        )?;
        notice.update_status(Status::Completed);
        self.attach_creator(&mut notice).await;

        let language = self.recipient_language(notice.user_id.as_deref(), None).await?;
        self.save(&notice).await?;
        info!("⭐ Admin notice {} for team {}", notice.key(), request.team_id);

        let content = EmailContent::from([
            ("MedicalteamName", request.team_id.clone()),
            ("Email", request.email.clone()),
        ]);
        self.notify(&notice, content, &language).await?;

        Ok(notice)
    }

    /// Notice de retrait d'un membre de l'équipe
    pub async fn remove_team_member(
        &self,
        caller: &AuthUser,
        request: &TeamInviteRequest,
    ) -> Result<Confirmation, ServiceError> {
        self.ensure_team_admin(caller, &request.team_id).await?;

        let invited = self.identity.find_user(&request.email).await?;
        if let Some(user) = &invited {
            if !self.teams.is_team_member(&user.user_id, &request.team_id).await? {
                return Err(ServiceError::conflict(STATUS_NOT_MEMBER));
            }
        }

        let mut notice = self.team_notice(
            caller,
            ConfirmationType::MedicalTeamRemove,
            request,
            invited.map(|u| u.user_id),
        )?;
        self.attach_creator(&mut notice).await;

        let language = self.recipient_language(notice.user_id.as_deref(), None).await?;
        self.save(&notice).await?;
        info!("🚪 Removal notice {} for team {}", notice.key(), request.team_id);

        let content = EmailContent::from([
            ("MedicalteamName", request.team_id.clone()),
            ("Email", request.email.clone()),
        ]);
        self.notify(&notice, content, &language).await?;

        Ok(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::context::Permissions;
    use crate::store::ConfirmationStore;
    use crate::testing::{clinician, Fixture};

    fn user(id: &str) -> AuthUser {
        AuthUser { user_id: id.into(), role: Some("hcp".into()), is_server: false }
    }

    fn team_request(email: &str, is_admin: bool) -> TeamInviteRequest {
        TeamInviteRequest {
            email: email.into(),
            team_id: "TEAM-1".into(),
            is_admin,
            permissions: Permissions::new(),
        }
    }

    fn fixture_with_admin() -> Fixture {
        let fixture = Fixture::new();
        fixture.identity.add(clinician("UID-ADMIN", "admin@example.org"));
        fixture.teams.make_admin("UID-ADMIN", "TEAM-1");
        fixture
    }

    #[tokio::test]
    async fn test_send_team_invite_requires_admin() {
        let fixture = Fixture::new();
        let service = fixture.service();

        let err = service
            .send_team_invite(&user("UID-X"), &team_request("hcp@example.org", false))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert!(fixture.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_team_invite_and_accept() {
        let fixture = fixture_with_admin();
        let service = fixture.service();

        let invite = service
            .send_team_invite(&user("UID-ADMIN"), &team_request("hcp@example.org", true))
            .await
            .unwrap();
        assert_eq!(invite.team_id.as_deref(), Some("TEAM-1"));
        assert_eq!(invite.is_admin, Some(true));
        assert!(fixture.notifier.sent()[0].body.contains("hcp/signup"));

        // Doublon tant que l'invitation court
        let err = service
            .send_team_invite(&user("UID-ADMIN"), &team_request("hcp@example.org", true))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(msg) if msg == STATUS_EXISTING_INVITE));

        fixture.identity.add(clinician("UID-HCP", "hcp@example.org"));
        let accepted = service.accept_team_invite(&user("UID-HCP"), invite.key()).await.unwrap();
        assert_eq!(accepted.status, Status::Completed);
        assert_eq!(fixture.teams.added(), vec![("UID-HCP".to_string(), "TEAM-1".to_string(), true)]);
    }

    #[tokio::test]
    async fn test_send_team_invite_existing_member_conflicts() {
        let fixture = fixture_with_admin();
        fixture.identity.add(clinician("UID-HCP", "hcp@example.org"));
        fixture.teams.make_member("UID-HCP", "TEAM-1");
        let service = fixture.service();

        let err = service
            .send_team_invite(&user("UID-ADMIN"), &team_request("hcp@example.org", false))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(msg) if msg == STATUS_EXISTING_MEMBER));
    }

    #[tokio::test]
    async fn test_accept_team_invite_by_someone_else_is_forbidden() {
        let fixture = fixture_with_admin();
        fixture.identity.add(clinician("UID-HCP", "hcp@example.org"));
        fixture.identity.add(clinician("UID-OTHER", "other@example.org"));
        let service = fixture.service();

        let invite = service
            .send_team_invite(&user("UID-ADMIN"), &team_request("hcp@example.org", false))
            .await
            .unwrap();

        let err = service.accept_team_invite(&user("UID-OTHER"), invite.key()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));
        assert!(fixture.teams.added().is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_team_invite() {
        let fixture = fixture_with_admin();
        fixture.identity.add(clinician("UID-HCP", "hcp@example.org"));
        let service = fixture.service();
        let invite = service
            .send_team_invite(&user("UID-ADMIN"), &team_request("hcp@example.org", false))
            .await
            .unwrap();

        // Mauvaise équipe: introuvable
        let err = service
            .dismiss_team_invite(&user("UID-HCP"), "TEAM-2", invite.key())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let dismissed = service
            .dismiss_team_invite(&user("UID-HCP"), "TEAM-1", invite.key())
            .await
            .unwrap();
        assert_eq!(dismissed.status, Status::Declined);

        let err = service
            .dismiss_team_invite(&user("UID-HCP"), "TEAM-1", invite.key())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotModified(_)));
    }

    #[tokio::test]
    async fn test_admin_dismisses_any_team_invite() {
        let fixture = fixture_with_admin();
        let service = fixture.service();
        let invite = service
            .send_team_invite(&user("UID-ADMIN"), &team_request("unknown@example.org", false))
            .await
            .unwrap();

        let dismissed = service
            .dismiss_team_invite(&user("UID-ADMIN"), "TEAM-1", invite.key())
            .await
            .unwrap();
        assert_eq!(dismissed.status, Status::Declined);
    }

    #[tokio::test]
    async fn test_grant_team_admin() {
        let fixture = fixture_with_admin();
        fixture.identity.add(clinician("UID-HCP", "hcp@example.org"));
        let service = fixture.service();

        let notice = service
            .grant_team_admin(&user("UID-ADMIN"), &team_request("hcp@example.org", true))
            .await
            .unwrap();
        assert_eq!(notice.status, Status::Completed);
        assert_eq!(notice.confirmation_type(), ConfirmationType::MedicalTeamDoAdmin);

        let stored = fixture
            .store
            .find_confirmation(&ConfirmationQuery::by_key(notice.key()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, Status::Completed);

        fixture.teams.make_admin("UID-HCP", "TEAM-1");
        let err = service
            .grant_team_admin(&user("UID-ADMIN"), &team_request("hcp@example.org", true))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(msg) if msg == STATUS_ALREADY_ADMIN));

        let err = service
            .grant_team_admin(&user("UID-ADMIN"), &team_request("hcp@example.org", false))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_remove_team_member() {
        let fixture = fixture_with_admin();
        fixture.identity.add(clinician("UID-HCP", "hcp@example.org"));
        let service = fixture.service();

        let err = service
            .remove_team_member(&user("UID-ADMIN"), &team_request("hcp@example.org", false))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(msg) if msg == STATUS_NOT_MEMBER));

        fixture.teams.make_member("UID-HCP", "TEAM-1");
        let notice = service
            .remove_team_member(&user("UID-ADMIN"), &team_request("hcp@example.org", false))
            .await
            .unwrap();
        assert_eq!(notice.status, Status::Pending);
        assert_eq!(notice.user_id.as_deref(), Some("UID-HCP"));
        assert!(fixture.notifier.sent()[0].body.contains("TEAM-1"));
    }
}
