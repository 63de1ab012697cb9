// Invitations équipe de soin: un patient partage ses données avec un soignant
use tracing::{info, warn};

use super::ConfirmationService;
use crate::error::ServiceError;
use crate::middleware::AuthUser;
use crate::models::confirmation::{Confirmation, ConfirmationType, Status};
use crate::models::context::Permissions;
use crate::models::dto::InviteRequest;
use crate::models::validation::Expectations;
use crate::services::templates::EmailContent;
use crate::store::ConfirmationQuery;

pub(crate) const STATUS_EXISTING_INVITE: &str = "There is already an existing invite";
pub(crate) const STATUS_EXISTING_MEMBER: &str = "The user is already an existing member";
pub(crate) const STATUS_INVITE_NOT_FOUND: &str = "No matching invite was found";
pub(crate) const STATUS_INVITE_EXPIRED: &str = "Invite has expired";

/// Types affichés dans "invitations envoyées"
const SENT_INVITE_TYPES: [ConfirmationType; 4] = [
    ConfirmationType::CareteamInvite,
    ConfirmationType::MedicalTeamInvite,
    ConfirmationType::MedicalTeamDoAdmin,
    ConfirmationType::MedicalTeamRemove,
];

fn ensure_caller(caller: &AuthUser, user_id: &str) -> Result<(), ServiceError> {
    if user_id.is_empty() {
        return Err(ServiceError::bad_request("User id is missing"));
    }
    if !caller.can_act_for(user_id) {
        warn!("🔒 {} cannot act for {}", caller.user_id, user_id);
        return Err(ServiceError::unauthorized("Unauthorized"));
    }
    Ok(())
}

impl ConfirmationService {
    /// Invite `request.email` dans l'équipe de soin de `invitor_id`
    pub async fn send_invite(
        &self,
        caller: &AuthUser,
        invitor_id: &str,
        request: &InviteRequest,
    ) -> Result<Confirmation, ServiceError> {
        ensure_caller(caller, invitor_id)?;

        // 1. Invitation déjà en cours (la plus récente fait foi)
        let query = ConfirmationQuery::new()
            .creator_id(invitor_id)
            .email(&request.email)
            .confirmation_type(ConfirmationType::CareteamInvite);
        if let Some(existing) = self.newest(&query, &[Status::Pending], &[]).await? {
            if !existing.is_expired() {
                info!("✋ Invite {} from {} not yet expired", existing.key(), invitor_id);
                return Err(ServiceError::conflict(STATUS_EXISTING_INVITE));
            }
        }

        // 2. Déjà en partage avec cet utilisateur ?
        let invited = self.identity.find_user(&request.email).await?;
        if let Some(user) = &invited {
            match self.permissions.get_direct_shares(invitor_id).await {
                Ok(shares) if shares.contains(&user.user_id) => {
                    info!("✋ {} already shares with {}", invitor_id, user.user_id);
                    return Err(ServiceError::conflict(STATUS_EXISTING_MEMBER));
                }
                Ok(_) => {}
                Err(e) => warn!("⚠️  Error checking if user is in group: {}", e),
            }
        }

        // 3. Nouvelle invitation
        let mut invite = self.new_confirmation(
            ConfirmationType::CareteamInvite,
            Some(invitor_id),
            Some(request.permissions.clone().into()),
        )?;
        invite.email = Some(request.email.clone());
        invite.user_id = invited.map(|u| u.user_id);
        self.attach_creator(&mut invite).await;

        let language = self.recipient_language(invite.user_id.as_deref(), None).await?;

        self.save(&invite).await?;
        info!("📝 Invite {} created by {}", invite.key(), invitor_id);

        // Compte existant: connexion plutôt qu'inscription
        let web_path = if invite.user_id.is_some() { "login" } else { "signup/clinician" };
        let content = EmailContent::from([
            ("PatientName", Self::creator_name(&invite)),
            ("Email", request.email.clone()),
            ("WebPath", web_path.to_string()),
            ("Key", invite.key().to_string()),
        ]);
        self.notify(&invite, content, &language).await?;

        Ok(invite)
    }

    /// L'invité accepte: le partage est créé puis l'invitation est terminée
    pub async fn accept_invite(
        &self,
        caller: &AuthUser,
        invitee_id: &str,
        invitor_id: &str,
        key: &str,
    ) -> Result<Confirmation, ServiceError> {
        if invitor_id.is_empty() {
            return Err(ServiceError::bad_request("Invitor id is missing"));
        }
        ensure_caller(caller, invitee_id)?;

        let mut invite = self.load_by_key(key, STATUS_INVITE_NOT_FOUND).await?;

        if invite.is_expired() {
            info!("⌛ Invite {} has expired", invite.key());
            return Err(ServiceError::Expired(STATUS_INVITE_EXPIRED.to_string()));
        }

        self.resolve_invitee(&mut invite, invitee_id).await?;
        self.authorize(
            &Expectations::new()
                .status(Status::Pending)
                .confirmation_type(ConfirmationType::CareteamInvite)
                .user_id(invitee_id)
                .creator_id(invitor_id),
            &invite,
        )?;

        let permissions: Permissions = invite.decode_context()?;
        self.permissions
            .set_permissions(invitor_id, invitee_id, &permissions)
            .await?;
        info!("🤝 Permissions set for [{} -> {}] after invite {}", invitor_id, invitee_id, invite.key());

        invite.update_status(Status::Completed);
        self.save(&invite).await?;

        Ok(invite)
    }

    /// L'invitant annule son invitation en cours vers `email`
    pub async fn cancel_invite(
        &self,
        caller: &AuthUser,
        invitor_id: &str,
        email: &str,
    ) -> Result<Confirmation, ServiceError> {
        ensure_caller(caller, invitor_id)?;
        if email.is_empty() {
            return Err(ServiceError::bad_request("Invited address is missing"));
        }

        let query = ConfirmationQuery::new()
            .creator_id(invitor_id)
            .email(email)
            .confirmation_type(ConfirmationType::CareteamInvite);

        let Some(mut invite) = self.newest(&query, &[Status::Pending], &[]).await? else {
            // Déjà traitée -> conflit, jamais vue -> non trouvée
            return match self.newest(&query, &[], &[]).await? {
                Some(done) => Err(ServiceError::conflict(format!("Invite is already {}", done.status))),
                None => Err(ServiceError::not_found(STATUS_INVITE_NOT_FOUND)),
            };
        };

        invite.update_status(Status::Canceled);
        self.save(&invite).await?;
        info!("🗑️  Invite {} canceled by {}", invite.key(), invitor_id);

        Ok(invite)
    }

    /// L'invité décline l'invitation
    pub async fn dismiss_invite(
        &self,
        caller: &AuthUser,
        invitee_id: &str,
        invitor_id: &str,
        key: &str,
    ) -> Result<Confirmation, ServiceError> {
        if invitor_id.is_empty() {
            return Err(ServiceError::bad_request("Invitor id is missing"));
        }
        ensure_caller(caller, invitee_id)?;

        let mut invite = self.load_by_key(key, STATUS_INVITE_NOT_FOUND).await?;

        self.resolve_invitee(&mut invite, invitee_id).await?;
        self.authorize(
            &Expectations::new()
                .status(Status::Pending)
                .confirmation_type(ConfirmationType::CareteamInvite)
                .user_id(invitee_id)
                .creator_id(invitor_id),
            &invite,
        )?;

        invite.update_status(Status::Declined);
        self.save(&invite).await?;
        info!("👋 Invite {} dismissed by {}", invite.key(), invitee_id);

        Ok(invite)
    }

    /// Invitations en attente reçues par l'utilisateur (non expirées)
    pub async fn received_invitations(
        &self,
        caller: &AuthUser,
        invitee_id: &str,
    ) -> Result<Vec<Confirmation>, ServiceError> {
        ensure_caller(caller, invitee_id)?;

        let user = self
            .identity
            .find_user(invitee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        let Some(email) = user.primary_email() else {
            return Ok(Vec::new());
        };

        let found = self
            .store
            .find_confirmations(
                &ConfirmationQuery::new().email(email),
                &[Status::Pending],
                &[ConfirmationType::CareteamInvite, ConfirmationType::MedicalTeamInvite],
            )
            .await?;

        let mut invitations = Vec::with_capacity(found.len());
        for mut invite in found.into_iter().filter(|c| !c.is_expired()) {
            // L'invité est maintenant connu
            if invite.user_id.is_none() {
                invite.user_id = Some(invitee_id.to_string());
                self.save(&invite).await?;
            }
            self.attach_creator(&mut invite).await;
            invitations.push(invite);
        }

        info!("📬 {} pending invite(s) for {}", invitations.len(), invitee_id);
        Ok(invitations)
    }

    /// Invitations envoyées encore en attente ou déclinées
    pub async fn sent_invitations(
        &self,
        caller: &AuthUser,
        invitor_id: &str,
    ) -> Result<Vec<Confirmation>, ServiceError> {
        ensure_caller(caller, invitor_id)?;

        let invitations = self
            .store
            .find_confirmations(
                &ConfirmationQuery::new().creator_id(invitor_id),
                &[Status::Pending, Status::Declined],
                &SENT_INVITE_TYPES,
            )
            .await?;

        Ok(invitations)
    }
}
