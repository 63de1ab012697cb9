// ============================================================================
// MODÈLE : CONTEXTE D'UNE CONFIRMATION
// ============================================================================
//
// Description:
//   Charge utile attachée à la création, une forme par type de confirmation:
//     - Permissions     : invitations (équipe de soin, équipe médicale,
//                         passage admin, retrait)
//     - OneTimePassword : reset de PIN (OTP + instant de génération)
//   Les resets de mot de passe et "no account" n'ont pas de contexte.
//
// Stockage:
//   JSON taggé {"kind": "...", "payload": ...} dans la colonne JSONB context
//
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::otp::Totp;

/// Permissions accordées par l'invitant ("view", "upload", "note"...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub BTreeMap<String, Value>);

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str) -> Self {
        self.0.insert(name.to_string(), Value::Object(Default::default()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Permissions,
    OneTimePassword,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKind::Permissions => write!(f, "permissions"),
            ContextKind::OneTimePassword => write!(f, "one_time_password"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ConfirmationContext {
    Permissions(Permissions),
    OneTimePassword(Totp),
}

impl ConfirmationContext {
    pub fn kind(&self) -> ContextKind {
        match self {
            ConfirmationContext::Permissions(_) => ContextKind::Permissions,
            ConfirmationContext::OneTimePassword(_) => ContextKind::OneTimePassword,
        }
    }
}

impl From<Permissions> for ConfirmationContext {
    fn from(permissions: Permissions) -> Self {
        ConfirmationContext::Permissions(permissions)
    }
}

impl From<Totp> for ConfirmationContext {
    fn from(totp: Totp) -> Self {
        ConfirmationContext::OneTimePassword(totp)
    }
}

// En cas d'échec on rend le contexte tel quel, l'appelant construit l'erreur
impl TryFrom<ConfirmationContext> for Permissions {
    type Error = ConfirmationContext;

    fn try_from(context: ConfirmationContext) -> Result<Self, Self::Error> {
        match context {
            ConfirmationContext::Permissions(permissions) => Ok(permissions),
            other => Err(other),
        }
    }
}

impl TryFrom<ConfirmationContext> for Totp {
    type Error = ConfirmationContext;

    fn try_from(context: ConfirmationContext) -> Result<Self, Self::Error> {
        match context {
            ConfirmationContext::OneTimePassword(totp) => Ok(totp),
            other => Err(other),
        }
    }
}
