//pour les requêtes et réponses de l'API
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::confirmation::{Confirmation, ConfirmationType, Status};
use crate::models::context::Permissions;

// Reset du mot de passe: clé longue (lien) OU clé courte (terminal patient)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub key: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub short_key: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Invitation équipe de soin
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    #[validate(email)]
    pub email: String,
    pub permissions: Permissions,
}

// Invitation / passage admin / retrait d'une équipe médicale
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamInviteRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub team_id: String,
    pub is_admin: bool,
    #[serde(default)]
    pub permissions: Permissions,
}

// Accepter / décliner: la clé suffit à retrouver la confirmation
#[derive(Debug, Deserialize, Validate)]
pub struct KeyRequest {
    #[validate(length(min = 1))]
    pub key: String,
}

// Vue d'une confirmation renvoyée aux clients (sans contexte: l'OTP ne sort pas)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    pub key: String,
    #[serde(rename = "type")]
    pub confirmation_type: ConfirmationType,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    pub created: chrono::DateTime<chrono::Utc>,
    pub expires: chrono::DateTime<chrono::Utc>,
}

impl From<&Confirmation> for ConfirmationResponse {
    fn from(c: &Confirmation) -> Self {
        ConfirmationResponse {
            key: c.key().to_string(),
            confirmation_type: c.confirmation_type(),
            status: c.status,
            email: c.email.clone(),
            user_id: c.user_id.clone(),
            creator_id: c.creator_id.clone(),
            creator_name: c
                .creator
                .profile
                .as_ref()
                .map(|p| p.display_name().to_string()),
            team_id: c.team_id.clone(),
            is_admin: c.is_admin,
            permissions: c.decode_context::<Permissions>().ok(),
            created: c.created(),
            expires: c.expires_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::otp::Totp;

    #[test]
    fn test_reset_request_validation() {
        let ok: ResetPasswordRequest = serde_json::from_value(serde_json::json!({
            "key": "abc", "email": "user@x.com", "password": "secret"
        }))
        .unwrap();
        assert!(ok.validate().is_ok());

        let bad: ResetPasswordRequest = serde_json::from_value(serde_json::json!({
            "shortKey": "ABCD2345", "email": "not-an-email", "password": ""
        }))
        .unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_pin_reset_response_hides_otp() {
        let pin = Confirmation::new_with_context(
            ConfirmationType::PinReset,
            Some("UID1"),
            Totp { otp: "123456789".into(), timestamp: 0 },
        )
        .unwrap();

        let json = serde_json::to_value(ConfirmationResponse::from(&pin)).unwrap();
        assert!(json.get("permissions").is_none());
        assert!(!json.to_string().contains("123456789"));
        assert_eq!(json["type"], "pin_reset");
    }
}
