// ============================================================================
// MODÈLE : CONFIRMATION
// ============================================================================
//
// Description:
//   Jeton à durée de vie limitée qui autorise UNE transition sensible:
//   reset de mot de passe, reset de PIN (OTP), invitation équipe de soin /
//   équipe médicale, notifications admin et retrait d'équipe.
//
// Cycle de vie:
//   Pending ──accept──────────► Completed
//   Pending ──decline/dismiss─► Declined
//   Pending ──cancel──────────► Canceled
//   Les trois états de droite sont terminaux. Aucun retour à Pending.
//
// Invariants:
//   - key, created, type et template_name sont fixés à la construction
//     (champs privés, accesseurs en lecture seule)
//   - modified est vide jusqu'au premier update_status
//   - l'expiration est calculée (created + fenêtre fixe), jamais stockée:
//     une confirmation Pending peut être expirée
//   - update_status ne contrôle pas la transition: c'est le rôle de la
//     chaîne de validation côté appelant
//
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfirmationError;
use crate::models::context::{ConfirmationContext, ContextKind};
use crate::models::profile::Creator;
use crate::utils::keys;

/// Fenêtre d'expiration, identique pour tous les types
pub const EXPIRATION_WINDOW_HOURS: i64 = 7 * 24;

/// Longueur par défaut des clés courtes (reset mot de passe patient)
pub const DEFAULT_SHORT_KEY_LENGTH: usize = 8;
pub const MIN_SHORT_KEY_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationType {
    #[sea_orm(string_value = "password_reset")]
    PasswordReset,
    #[sea_orm(string_value = "patient_password_reset")]
    PatientPasswordReset,
    #[sea_orm(string_value = "pin_reset")]
    PinReset,
    #[sea_orm(string_value = "no_account")]
    NoAccount,
    #[serde(rename = "careteam_invitation")]
    #[sea_orm(string_value = "careteam_invitation")]
    CareteamInvite,
    #[serde(rename = "medicalteam_invitation")]
    #[sea_orm(string_value = "medicalteam_invitation")]
    MedicalTeamInvite,
    #[serde(rename = "medicalteam_do_admin")]
    #[sea_orm(string_value = "medicalteam_do_admin")]
    MedicalTeamDoAdmin,
    #[serde(rename = "medicalteam_remove")]
    #[sea_orm(string_value = "medicalteam_remove")]
    MedicalTeamRemove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TemplateName {
    #[sea_orm(string_value = "password_reset")]
    PasswordReset,
    #[sea_orm(string_value = "patient_password_reset")]
    PatientPasswordReset,
    #[sea_orm(string_value = "patient_pin_reset")]
    PatientPinReset,
    #[sea_orm(string_value = "no_account")]
    NoAccount,
    #[sea_orm(string_value = "careteam_invitation")]
    #[serde(rename = "careteam_invitation")]
    CareteamInvite,
    #[sea_orm(string_value = "medicalteam_invitation")]
    #[serde(rename = "medicalteam_invitation")]
    MedicalteamInvite,
    #[sea_orm(string_value = "medicalteam_do_admin")]
    #[serde(rename = "medicalteam_do_admin")]
    MedicalteamDoAdmin,
    #[sea_orm(string_value = "medicalteam_remove")]
    #[serde(rename = "medicalteam_remove")]
    MedicalteamRemove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "declined")]
    Declined,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl ConfirmationType {
    /// Template email associé (1 pour 1)
    pub fn template_name(self) -> TemplateName {
        match self {
            ConfirmationType::PasswordReset => TemplateName::PasswordReset,
            ConfirmationType::PatientPasswordReset => TemplateName::PatientPasswordReset,
            ConfirmationType::PinReset => TemplateName::PatientPinReset,
            ConfirmationType::NoAccount => TemplateName::NoAccount,
            ConfirmationType::CareteamInvite => TemplateName::CareteamInvite,
            ConfirmationType::MedicalTeamInvite => TemplateName::MedicalteamInvite,
            ConfirmationType::MedicalTeamDoAdmin => TemplateName::MedicalteamDoAdmin,
            ConfirmationType::MedicalTeamRemove => TemplateName::MedicalteamRemove,
        }
    }

    /// Seul le reset patient est saisi sur le terminal: clé courte
    pub fn needs_short_key(self) -> bool {
        matches!(self, ConfirmationType::PatientPasswordReset)
    }

    /// Forme de contexte acceptée (None = pas de contexte)
    pub fn context_kind(self) -> Option<ContextKind> {
        match self {
            ConfirmationType::PinReset => Some(ContextKind::OneTimePassword),
            ConfirmationType::CareteamInvite
            | ConfirmationType::MedicalTeamInvite
            | ConfirmationType::MedicalTeamDoAdmin
            | ConfirmationType::MedicalTeamRemove => Some(ContextKind::Permissions),
            ConfirmationType::PasswordReset
            | ConfirmationType::PatientPasswordReset
            | ConfirmationType::NoAccount => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmationType::PasswordReset => "password_reset",
            ConfirmationType::PatientPasswordReset => "patient_password_reset",
            ConfirmationType::PinReset => "pin_reset",
            ConfirmationType::NoAccount => "no_account",
            ConfirmationType::CareteamInvite => "careteam_invitation",
            ConfirmationType::MedicalTeamInvite => "medicalteam_invitation",
            ConfirmationType::MedicalTeamDoAdmin => "medicalteam_do_admin",
            ConfirmationType::MedicalTeamRemove => "medicalteam_remove",
        }
    }
}

impl fmt::Display for ConfirmationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Declined => "declined",
            Status::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    short_key: Option<String>,
    #[serde(rename = "type")]
    confirmation_type: ConfirmationType,
    template_name: TemplateName,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub creator: Creator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<ConfirmationContext>,
    created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified: Option<DateTime<Utc>>,
}

impl Confirmation {
    /// Nouvelle confirmation Pending, clé longue (+ clé courte si le type en demande une)
    pub fn new(
        confirmation_type: ConfirmationType,
        creator_id: Option<&str>,
    ) -> Result<Self, ConfirmationError> {
        Self::with_short_key_length(confirmation_type, creator_id, DEFAULT_SHORT_KEY_LENGTH)
    }

    pub fn with_short_key_length(
        confirmation_type: ConfirmationType,
        creator_id: Option<&str>,
        short_key_length: usize,
    ) -> Result<Self, ConfirmationError> {
        let key = keys::generate_key()?;
        let short_key = confirmation_type
            .needs_short_key()
            .then(|| keys::generate_short_key(short_key_length));

        Ok(Self {
            key,
            short_key,
            confirmation_type,
            template_name: confirmation_type.template_name(),
            status: Status::Pending,
            user_id: None,
            creator_id: creator_id.filter(|id| !id.is_empty()).map(str::to_string),
            creator: Creator::default(),
            email: None,
            team_id: None,
            is_admin: None,
            context: None,
            created: Utc::now(),
            modified: None,
        })
    }

    /// Comme `new`, avec un contexte attaché dès la création
    pub fn new_with_context(
        confirmation_type: ConfirmationType,
        creator_id: Option<&str>,
        context: impl Into<ConfirmationContext>,
    ) -> Result<Self, ConfirmationError> {
        let mut confirmation = Self::new(confirmation_type, creator_id)?;
        confirmation.add_context(context)?;
        Ok(confirmation)
    }

    /// Reconstruit une confirmation persistée (utilisé par les stores)
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        key: String,
        short_key: Option<String>,
        confirmation_type: ConfirmationType,
        template_name: TemplateName,
        status: Status,
        context: Option<ConfirmationContext>,
        created: DateTime<Utc>,
        modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            key,
            short_key,
            confirmation_type,
            template_name,
            status,
            user_id: None,
            creator_id: None,
            creator: Creator::default(),
            email: None,
            team_id: None,
            is_admin: None,
            context,
            created,
            modified,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn short_key(&self) -> Option<&str> {
        self.short_key.as_deref()
    }

    pub fn confirmation_type(&self) -> ConfirmationType {
        self.confirmation_type
    }

    pub fn template_name(&self) -> TemplateName {
        self.template_name
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    pub fn context(&self) -> Option<&ConfirmationContext> {
        self.context.as_ref()
    }

    /// Attache (ou remplace) le contexte; refusé si la forme ne correspond pas au type
    pub fn add_context(
        &mut self,
        context: impl Into<ConfirmationContext>,
    ) -> Result<(), ConfirmationError> {
        let context = context.into();
        if self.confirmation_type.context_kind() != Some(context.kind()) {
            return Err(ConfirmationError::ContextMismatch {
                confirmation_type: self.confirmation_type.to_string(),
                context: context.kind().to_string(),
            });
        }
        self.context = Some(context);
        Ok(())
    }

    /// Décode le contexte dans la forme demandée
    pub fn decode_context<T>(&self) -> Result<T, ConfirmationError>
    where
        T: TryFrom<ConfirmationContext, Error = ConfirmationContext>,
    {
        let context = self.context.clone().ok_or(ConfirmationError::MissingContext)?;
        T::try_from(context).map_err(|other| ConfirmationError::ContextMismatch {
            confirmation_type: self.confirmation_type.to_string(),
            context: other.kind().to_string(),
        })
    }

    /// Change le statut et horodate la modification. Aucun contrôle de transition ici.
    pub fn update_status(&mut self, status: Status) {
        self.status = status;
        self.modified = Some(Utc::now());
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created + Duration::hours(EXPIRATION_WINDOW_HOURS)
    }

    /// Expirée à partir de created + fenêtre (borne incluse)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// L'email est comparé sans tenir compte de la casse
    pub fn email_matches(&self, email: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(email))
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, by: Duration) {
        self.created -= by;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::context::Permissions;
    use crate::utils::otp::Totp;

    const USERID: &str = "1234-555";

    #[test]
    fn test_new_confirmation() {
        let confirmation = Confirmation::new(ConfirmationType::PasswordReset, Some(USERID)).unwrap();

        assert_eq!(confirmation.status, Status::Pending);
        assert_eq!(confirmation.key().len(), keys::KEY_LENGTH);
        assert!(confirmation.short_key().is_none());
        assert!(confirmation.modified().is_none());
        assert_eq!(confirmation.confirmation_type(), ConfirmationType::PasswordReset);
        assert_eq!(confirmation.template_name(), TemplateName::PasswordReset);
        assert_eq!(confirmation.user_id, None);
        assert_eq!(confirmation.creator_id.as_deref(), Some(USERID));
        assert_eq!(confirmation.creator, Creator::default());
    }

    #[test]
    fn test_empty_creator_is_none() {
        let confirmation = Confirmation::new(ConfirmationType::NoAccount, Some("")).unwrap();
        assert_eq!(confirmation.creator_id, None);
    }

    #[test]
    fn test_patient_password_reset_has_short_key() {
        let confirmation =
            Confirmation::new(ConfirmationType::PatientPasswordReset, Some(USERID)).unwrap();

        let short_key = confirmation.short_key().unwrap();
        assert_eq!(short_key.len(), DEFAULT_SHORT_KEY_LENGTH);
        assert_eq!(confirmation.template_name(), TemplateName::PatientPasswordReset);
    }

    #[test]
    fn test_update_status_sets_modified() {
        let mut confirmation = Confirmation::new(ConfirmationType::PasswordReset, None).unwrap();
        assert!(confirmation.modified().is_none());

        confirmation.update_status(Status::Completed);
        assert_eq!(confirmation.status, Status::Completed);
        let first = confirmation.modified().unwrap();
        assert!(first >= confirmation.created());

        confirmation.update_status(Status::Canceled);
        assert!(confirmation.modified().unwrap() >= first);
    }

    #[test]
    fn test_password_reset_scenario() {
        let mut confirmation = Confirmation::new(ConfirmationType::PasswordReset, None).unwrap();
        confirmation.email = Some("user@x.com".into());
        assert_eq!(confirmation.status, Status::Pending);

        let created = confirmation.created();
        let key = confirmation.key().to_string();

        confirmation.update_status(Status::Completed);
        assert_eq!(confirmation.status, Status::Completed);
        assert!(confirmation.modified().is_some());

        confirmation.update_status(Status::Completed);
        assert_eq!(confirmation.created(), created);
        assert_eq!(confirmation.key(), key);
    }

    #[test]
    fn test_context_round_trip() {
        let totp = Totp { otp: "123456789".into(), timestamp: 1_600_000_000 };
        let confirmation =
            Confirmation::new_with_context(ConfirmationType::PinReset, Some(USERID), totp.clone())
                .unwrap();

        let decoded: Totp = confirmation.decode_context().unwrap();
        assert_eq!(decoded, totp);
    }

    #[test]
    fn test_add_context_after_creation() {
        let mut invite = Confirmation::new(ConfirmationType::CareteamInvite, Some(USERID)).unwrap();
        let permissions = Permissions::new().with("view").with("note");

        invite.add_context(permissions.clone()).unwrap();

        let decoded: Permissions = invite.decode_context().unwrap();
        assert_eq!(decoded, permissions);
    }

    #[test]
    fn test_context_shape_must_match_type() {
        let mut reset = Confirmation::new(ConfirmationType::PasswordReset, None).unwrap();
        let err = reset.add_context(Permissions::new().with("view")).unwrap_err();
        assert!(matches!(err, ConfirmationError::ContextMismatch { .. }));

        let invite = Confirmation::new_with_context(
            ConfirmationType::CareteamInvite,
            Some(USERID),
            Permissions::new().with("view"),
        )
        .unwrap();
        let err = invite.decode_context::<Totp>().unwrap_err();
        assert!(matches!(err, ConfirmationError::ContextMismatch { .. }));
    }

    #[test]
    fn test_decode_without_context() {
        let invite = Confirmation::new(ConfirmationType::CareteamInvite, Some(USERID)).unwrap();
        assert!(matches!(
            invite.decode_context::<Permissions>(),
            Err(ConfirmationError::MissingContext)
        ));
    }

    #[test]
    fn test_expiration_boundary() {
        let confirmation = Confirmation::new(ConfirmationType::CareteamInvite, Some(USERID)).unwrap();
        let window = Duration::hours(EXPIRATION_WINDOW_HOURS);

        assert!(!confirmation.is_expired());
        assert!(!confirmation.is_expired_at(confirmation.created() + window - Duration::seconds(1)));
        assert!(confirmation.is_expired_at(confirmation.created() + window));
        assert!(confirmation.is_expired_at(confirmation.created() + window + Duration::seconds(1)));
    }

    #[test]
    fn test_old_pending_invite_is_expired() {
        let mut invite = Confirmation::new(ConfirmationType::CareteamInvite, Some(USERID)).unwrap();
        invite.backdate(Duration::hours(EXPIRATION_WINDOW_HOURS + 1));

        assert_eq!(invite.status, Status::Pending);
        assert!(invite.is_expired());
    }

    #[test]
    fn test_template_name_follows_type() {
        use sea_orm::Iterable;
        for confirmation_type in ConfirmationType::iter() {
            let c = Confirmation::new(confirmation_type, None).unwrap();
            assert_eq!(c.template_name(), confirmation_type.template_name());
        }
    }

    #[test]
    fn test_email_matching_ignores_case() {
        let mut c = Confirmation::new(ConfirmationType::PasswordReset, None).unwrap();
        c.email = Some("test@test.com".into());
        assert!(c.email_matches("TEST@TEST.COM"));
        assert!(!c.email_matches("other@test.com"));
    }
}
