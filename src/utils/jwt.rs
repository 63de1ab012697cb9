use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,             // user_id
    #[serde(default)]
    pub role: Option<String>,    // "patient", "hcp", "caregiver"...
    #[serde(default)]
    pub server: bool,            // jeton serveur (service à service)
    pub exp: i64,
}

/// Clé de vérification construite depuis AppConfig.jwt_secret
/// Partagée avec l'extracteur AuthUser via web::Data
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Vérifie et décode un JWT
    pub fn verify(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| format!("Invalid token: {}", e))
    }
}

#[cfg(test)]
pub const TEST_SECRET: &str = "confirmation-service-test-secret";

/// Génère un JWT (les jetons sont émis par le service d'identité, ici pour les tests)
#[cfg(test)]
pub fn generate_token(
    secret: &str,
    user_id: &str,
    role: Option<&str>,
    server: bool,
) -> Result<String, String> {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.map(str::to_string),
        server,
        exp: (Utc::now() + Duration::hours(24)).timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| format!("Failed to generate token: {}", e))
}
