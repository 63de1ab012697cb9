// ============================================================================
// ERREURS
// ============================================================================
//
// Une enum par couche:
//   - ConfirmationError : entité (clés, contexte)
//   - StoreError        : persistance (jamais pour "non trouvé")
//   - ClientError       : services externes (identité, équipes, profils)
//   - ServiceError      : workflows, traduit en réponse HTTP
//
// Points d'attention:
//   - Forbidden ne dit jamais quel champ a échoué
//   - Expired est distinct de NotFound
//
// ============================================================================

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ConfirmationError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Context {context} is not accepted by confirmation type {confirmation_type}")]
    ContextMismatch {
        confirmation_type: String,
        context: String,
    },

    #[error("Confirmation has no context")]
    MissingContext,

    #[error("Context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {service}")]
    UnexpectedStatus { service: &'static str, status: u16 },
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Expired(String),

    #[error("Forbidden to perform requested operation")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotModified(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),

    #[error("External service error: {0}")]
    External(#[from] ClientError),

    #[error("Notification failed: {0}")]
    NotificationFailed(String),
}

impl ServiceError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        Self::Unauthorized(msg.into())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            // Jeton expiré: visible par l'utilisateur, distinct du 404
            ServiceError::Expired(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::NotModified(_) => StatusCode::NOT_MODIFIED,
            ServiceError::Store(_) | ServiceError::Confirmation(_) | ServiceError::External(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServiceError::NotificationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Le détail des pannes internes reste dans les logs
        let message = match self {
            ServiceError::Store(_) | ServiceError::Confirmation(_) | ServiceError::External(_) => {
                error!("❌ Internal error: {}", self);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": message
        }))
    }
}
