// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Variables d'environnement (.env chargé par dotenv dans main.rs):
//   - SERVER_HOST / SERVER_PORT          (127.0.0.1 / 8080)
//   - DATABASE_URL                       (obligatoire sauf STORE=memory)
//   - STORE                              (postgres | memory)
//   - JWT_SECRET                         (obligatoire, vérifie les jetons entrants)
//   - SERVER_TOKEN                       (jeton serveur vers les services externes)
//   - IDENTITY_URL / TEAMS_URL / PROFILES_URL
//   - SUPPORT_URL                        (lien dans les emails)
//   - DEFAULT_LANGUAGE                   (en)
//   - ALLOW_PATIENT_RESET_PASSWORD       (false)
//   - SHORT_KEY_LENGTH                   (8, minimum 6)
//   - NOTIFIER                           (null | http)
//   - MAIL_RELAY_URL / MAIL_FROM / MAIL_TO_DOMAIN
//
// ============================================================================

use std::env;
use thiserror::Error;

use crate::models::confirmation::{DEFAULT_SHORT_KEY_LENGTH, MIN_SHORT_KEY_LENGTH};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Null,
    Http,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailSettings {
    pub relay_url: Option<String>,
    pub from: String,
    /// Si renseigné, seules les adresses de ce domaine reçoivent un email
    pub to_domain: Option<String>,
}

/// Réglages utilisés par les workflows
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub default_language: String,
    pub allow_patient_reset_password: bool,
    pub short_key_length: usize,
    pub support_url: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            allow_patient_reset_password: false,
            short_key_length: DEFAULT_SHORT_KEY_LENGTH,
            support_url: "https://support.example.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_token: String,
    pub identity_url: String,
    pub teams_url: String,
    pub profiles_url: String,
    pub notifier: NotifierKind,
    pub mail: MailSettings,
    pub service: ServiceSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Même chose que from_env avec une source de variables injectée (tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let port = parse_or(&get, "SERVER_PORT", 8080u16)?;
        let short_key_length = parse_or(&get, "SHORT_KEY_LENGTH", DEFAULT_SHORT_KEY_LENGTH)?;
        if short_key_length < MIN_SHORT_KEY_LENGTH {
            return Err(ConfigError::Invalid {
                name: "SHORT_KEY_LENGTH",
                value: short_key_length.to_string(),
            });
        }
        let allow_patient_reset_password = parse_or(&get, "ALLOW_PATIENT_RESET_PASSWORD", false)?;

        let store = match get("STORE").as_deref() {
            None | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid { name: "STORE", value: other.to_string() });
            }
        };

        let database_url = get("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let notifier = match get("NOTIFIER").as_deref() {
            None | Some("null") => NotifierKind::Null,
            Some("http") => NotifierKind::Http,
            Some(other) => {
                return Err(ConfigError::Invalid { name: "NOTIFIER", value: other.to_string() });
            }
        };

        let relay_url = get("MAIL_RELAY_URL");
        if notifier == NotifierKind::Http && relay_url.is_none() {
            return Err(ConfigError::Missing("MAIL_RELAY_URL"));
        }

        Ok(Self {
            host: or("SERVER_HOST", "127.0.0.1"),
            port,
            store,
            database_url,
            jwt_secret,
            server_token: or("SERVER_TOKEN", ""),
            identity_url: or("IDENTITY_URL", "http://localhost:9107"),
            teams_url: or("TEAMS_URL", "http://localhost:9197"),
            profiles_url: or("PROFILES_URL", "http://localhost:9120"),
            notifier,
            mail: MailSettings {
                relay_url,
                from: or("MAIL_FROM", "no-reply@example.org"),
                to_domain: get("MAIL_TO_DOMAIN"),
            },
            service: ServiceSettings {
                default_language: or("DEFAULT_LANGUAGE", "en"),
                allow_patient_reset_password,
                short_key_length,
                support_url: or("SUPPORT_URL", "https://support.example.org"),
            },
        })
    }
}

fn parse_or<G, T>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
