// Mot de passe oublié, reset du mot de passe, reset du PIN (OTP)
use tracing::{info, warn};

use super::ConfirmationService;
use crate::error::ServiceError;
use crate::middleware::AuthUser;
use crate::models::confirmation::{Confirmation, ConfirmationType, Status};
use crate::models::dto::ResetPasswordRequest;
use crate::models::validation::Expectations;
use crate::services::templates::EmailContent;
use crate::store::ConfirmationQuery;
use crate::utils::otp::TotpGenerator;

const STATUS_RESET_NOT_FOUND: &str = "No matching reset confirmation was found.";
const STATUS_RESET_EXPIRED: &str = "Password reset confirmation has expired.";
const STATUS_RESET_ERROR: &str =
    "Error while resetting password; reset confirmation remains active until it expires.";
const STATUS_RESET_NO_ACCOUNT: &str = "No matching account for the email was found.";

/// OTP du PIN reset: fenêtre de 30 minutes, 9 chiffres, depuis l'epoch.
/// Le terminal accepte la fenêtre courante et la précédente: le patient
/// dispose donc de 30 à 60 minutes pour saisir le code.
pub const PIN_RESET_TIME_STEP: u64 = 1800;
pub const PIN_RESET_DIGITS: u32 = 9;
pub const PIN_RESET_START_TIME: i64 = 0;

impl ConfirmationService {
    /// Crée une demande de reset pour `email` et envoie l'email.
    /// Compte inconnu: confirmation "no account" déjà terminée.
    pub async fn forgot_password(
        &self,
        email: &str,
        browser_language: Option<&str>,
    ) -> Result<Confirmation, ServiceError> {
        if email.is_empty() {
            return Err(ServiceError::bad_request("Email is missing"));
        }

        // 1. Type de reset selon le compte
        let mut reset = match self.identity.find_user(email).await? {
            Some(user) => {
                let confirmation_type =
                    if user.is_clinic() || self.settings.allow_patient_reset_password {
                        ConfirmationType::PasswordReset
                    } else {
                        info!("🔑 Patient resetting password, short key issued for {}", email);
                        ConfirmationType::PatientPasswordReset
                    };
                let mut reset = self.new_confirmation(confirmation_type, None, None)?;
                reset.user_id = Some(user.user_id);
                reset
            }
            None => {
                info!("🔑 {} ({})", STATUS_RESET_NO_ACCOUNT, email);
                let mut reset = self.new_confirmation(ConfirmationType::NoAccount, None, None)?;
                reset.update_status(Status::Completed);
                reset
            }
        };
        reset.email = Some(email.to_string());

        // 2. Langue
        let language = self
            .recipient_language(reset.user_id.as_deref(), browser_language)
            .await?;

        // 3. Persister puis notifier
        self.save(&reset).await?;
        info!("📝 Reset confirmation {} created ({})", reset.key(), reset.confirmation_type());

        let content = EmailContent::from([
            ("Key", reset.key().to_string()),
            ("Email", email.to_string()),
            ("ShortKey", reset.short_key().unwrap_or_default().to_string()),
        ]);
        self.notify(&reset, content, &language).await?;

        Ok(reset)
    }

    /// Applique un nouveau mot de passe à partir d'une clé longue ou courte
    pub async fn accept_password_reset(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<Confirmation, ServiceError> {
        // 1. Retrouver la confirmation (clé courte = reset patient)
        let found = match (request.short_key.as_deref(), request.key.as_deref()) {
            (Some(short_key), _) if !short_key.is_empty() => {
                let query = ConfirmationQuery::new()
                    .short_key(short_key)
                    .email(&request.email)
                    .confirmation_type(ConfirmationType::PatientPasswordReset);
                self.newest(&query, &[], &[]).await?
            }
            (_, Some(key)) if !key.is_empty() => self
                .store
                .find_confirmation(&ConfirmationQuery::by_key(key))
                .await?
                .filter(|c| {
                    c.confirmation_type() == ConfirmationType::PasswordReset
                        && c.email_matches(&request.email)
                }),
            _ => return Err(ServiceError::bad_request("A key or a short key is required")),
        };

        let mut reset = found.ok_or_else(|| ServiceError::not_found(STATUS_RESET_NOT_FOUND))?;

        // 2. Expirée / déjà utilisée
        if reset.is_expired() {
            info!("⌛ Reset confirmation {} has expired", reset.key());
            return Err(ServiceError::Expired(STATUS_RESET_EXPIRED.to_string()));
        }
        self.authorize(&Expectations::new().status(Status::Pending), &reset)?;

        // 3. Changer le mot de passe
        let user = self
            .identity
            .find_user(&request.email)
            .await?
            .ok_or_else(|| ServiceError::not_found(STATUS_RESET_NO_ACCOUNT))?;

        if let Err(e) = self.identity.update_password(&user.user_id, &request.password).await {
            warn!("⚠️  Password update failed for {}: {}", user.user_id, e);
            return Err(ServiceError::bad_request(STATUS_RESET_ERROR));
        }

        // 4. Terminer
        reset.update_status(Status::Completed);
        self.save(&reset).await?;
        info!("✅ Password reset {} completed for {}", reset.key(), user.user_id);

        Ok(reset)
    }

    /// Envoie un OTP de reset du PIN au patient (jamais avec un jeton serveur)
    pub async fn send_pin_reset(
        &self,
        caller: &AuthUser,
        user_id: &str,
    ) -> Result<Confirmation, ServiceError> {
        if caller.is_server {
            return Err(ServiceError::Forbidden);
        }
        if user_id.is_empty() {
            return Err(ServiceError::bad_request("Required userid is missing"));
        }
        if !caller.can_act_for(user_id) {
            return Err(ServiceError::unauthorized("Unauthorized"));
        }

        // 1. Patient
        let user = self
            .identity
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::bad_request("This user does not exist"))?;
        if user.is_clinic() {
            info!("🚫 Clinician account {} cannot receive PIN reset", user.user_id);
            return Err(ServiceError::Forbidden);
        }
        let email = user
            .primary_email()
            .ok_or_else(|| ServiceError::bad_request("User has no email"))?
            .to_string();

        // 2. OTP: secret = user id + terminal + user id
        let device_id = self
            .profiles
            .get_device_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("No handset registered for this patient"))?;

        let generator = TotpGenerator::new(
            PIN_RESET_TIME_STEP,
            PIN_RESET_START_TIME,
            format!("{}{}{}", user_id, device_id, user_id),
            PIN_RESET_DIGITS,
        );
        let totp = generator.now();
        let display_otp = totp.display();

        // 3. Confirmation avec l'OTP en contexte
        let mut pin_reset =
            self.new_confirmation(ConfirmationType::PinReset, Some(user_id), Some(totp.into()))?;
        pin_reset.user_id = Some(user.user_id.clone());
        pin_reset.email = Some(email.clone());

        let language = self.recipient_language(Some(user_id), None).await?;

        self.save(&pin_reset).await?;

        let content = EmailContent::from([
            ("Email", email),
            ("OTP", display_otp),
            ("SupportEmail", self.settings.support_url.replacen("mailto:", "", 1)),
        ]);
        self.notify(&pin_reset, content, &language).await?;
        info!("🔐 PIN reset OTP sent for {}", user_id);

        Ok(pin_reset)
    }
}
