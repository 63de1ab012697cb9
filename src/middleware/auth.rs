use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest, HttpResponse};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::utils::jwt::JwtVerifier;

/// Structure qui contient les infos de l'appelant authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Option<String>,
    /// Jeton serveur (service à service): agit pour n'importe quel utilisateur
    pub is_server: bool,
}

impl AuthUser {
    /// Un jeton utilisateur n'agit que pour lui-même
    pub fn can_act_for(&self, user_id: &str) -> bool {
        self.is_server || self.user_id == user_id
    }
}

fn unauthorized(message: String) -> Error {
    warn!("🔒 {}", message);
    let response = HttpResponse::Unauthorized().json(serde_json::json!({
        "error": message
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

/// Implémentation de FromRequest pour AuthUser
/// Cela permet à Actix-Web d'extraire automatiquement AuthUser des requêtes
impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // 1. Extraire le header Authorization
        let Some(auth_header) = req.headers().get("Authorization") else {
            return ready(Err(unauthorized("Missing Authorization header".into())));
        };

        // 2. Convertir le header en string
        let Ok(auth_str) = auth_header.to_str() else {
            return ready(Err(unauthorized("Invalid Authorization header".into())));
        };

        // 3. Extraire le token (format: "Bearer <token>")
        let Some(token) = auth_str.strip_prefix("Bearer ") else {
            return ready(Err(unauthorized(
                "Invalid Authorization format (expected: Bearer <token>)".into(),
            )));
        };

        // 4. Vérifier le token JWT avec la clé injectée au démarrage
        let Some(verifier) = req.app_data::<web::Data<JwtVerifier>>() else {
            error!("❌ JwtVerifier missing from app data");
            return ready(Err(actix_web::error::ErrorInternalServerError(
                "Authentication is not configured",
            )));
        };

        let claims = match verifier.verify(token) {
            Ok(claims) => claims,
            Err(e) => return ready(Err(unauthorized(e))),
        };

        // 5. Créer et retourner AuthUser
        ready(Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            is_server: claims.server,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::{generate_token, TEST_SECRET};
    use actix_web::test::TestRequest;

    fn request() -> TestRequest {
        TestRequest::default().app_data(web::Data::new(JwtVerifier::new(TEST_SECRET)))
    }

    #[actix_web::test]
    async fn test_extracts_claims_from_bearer() {
        let token = generate_token(TEST_SECRET, "UID1", Some("patient"), false).unwrap();
        let req = request()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.user_id, "UID1");
        assert_eq!(user.role.as_deref(), Some("patient"));
        assert!(!user.is_server);
        assert!(user.can_act_for("UID1"));
        assert!(!user.can_act_for("UID2"));
    }

    #[actix_web::test]
    async fn test_missing_or_malformed_header() {
        let req = request().to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());

        let req = request()
            .insert_header(("Authorization", "Basic abc"))
            .to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());
    }

    #[actix_web::test]
    async fn test_server_token_from_unknown_secret_is_rejected() {
        let forged = generate_token("some-guessed-secret", "attacker", None, true).unwrap();
        let req = request()
            .insert_header(("Authorization", format!("Bearer {}", forged)))
            .to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());
    }

    #[actix_web::test]
    async fn test_missing_verifier_is_an_error() {
        let token = generate_token(TEST_SECRET, "UID1", None, false).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());
    }

    #[test]
    fn test_server_acts_for_anyone() {
        let server = AuthUser { user_id: "svc".into(), role: None, is_server: true };
        assert!(server.can_act_for("UID-anything"));
    }
}
