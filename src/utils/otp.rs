// ============================================================================
// TOTP - MOT DE PASSE À USAGE UNIQUE BASÉ SUR LE TEMPS
// ============================================================================
//
// Description:
//   Générateur TOTP (RFC 6238) au-dessus de HOTP (RFC 4226):
//     counter = floor((now - start_time) / time_step)
//     otp     = troncature dynamique de HMAC(secret, counter) mod 10^digits
//
// Fenêtre de validité (voulu, pas un bug):
//   Pour le reset de PIN, time_step = 30 minutes et le vérificateur (le
//   terminal du patient) accepte la fenêtre courante ET la précédente.
//   Le patient dispose donc de 30 à 60 minutes selon le moment de l'envoi.
//
// Points d'attention:
//   - Pour le reset de PIN le secret est userId + deviceId + userId: entropie
//     faible, compromis assumé (pas de secret provisionné sur le terminal)
//   - Fonction pure de ses quatre entrées + l'instant
//
// ============================================================================

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OtpAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

/// OTP calculé, avec l'instant (secondes epoch) de génération
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totp {
    pub otp: String,
    pub timestamp: i64,
}

impl Totp {
    /// Rendu lisible: blocs de 3 chiffres séparés par des tirets (123-456-789)
    pub fn display(&self) -> String {
        self.otp
            .as_bytes()
            .chunks(3)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Clone)]
pub struct TotpGenerator {
    pub time_step: u64,
    pub start_time: i64,
    pub secret: Vec<u8>,
    pub digits: u32,
    pub algorithm: OtpAlgorithm,
}

impl TotpGenerator {
    pub fn new(time_step: u64, start_time: i64, secret: impl AsRef<[u8]>, digits: u32) -> Self {
        Self {
            time_step: time_step.max(1),
            start_time,
            secret: secret.as_ref().to_vec(),
            digits,
            algorithm: OtpAlgorithm::Sha1,
        }
    }

    pub fn with_algorithm(mut self, algorithm: OtpAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// OTP pour l'instant présent
    pub fn now(&self) -> Totp {
        self.at(Utc::now())
    }

    /// OTP pour un instant donné
    pub fn at(&self, instant: DateTime<Utc>) -> Totp {
        let timestamp = instant.timestamp();
        Totp {
            otp: hotp(&self.secret, self.counter(timestamp), self.digits, self.algorithm),
            timestamp,
        }
    }

    /// Numéro de fenêtre pour un instant (secondes epoch)
    pub fn counter(&self, timestamp: i64) -> u64 {
        let elapsed = timestamp.saturating_sub(self.start_time).max(0) as u64;
        elapsed / self.time_step
    }
}

/// HOTP (RFC 4226): HMAC sur le compteur big-endian, troncature dynamique,
/// formatage décimal complété à gauche par des zéros
pub fn hotp(secret: &[u8], counter: u64, digits: u32, algorithm: OtpAlgorithm) -> String {
    let message = counter.to_be_bytes();

    let hash: Vec<u8> = match algorithm {
        OtpAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts keys of any length");
            mac.update(&message);
            mac.finalize().into_bytes().to_vec()
        }
        OtpAlgorithm::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
            mac.update(&message);
            mac.finalize().into_bytes().to_vec()
        }
    };

    // Troncature dynamique: les 4 bits de poids faible du dernier octet donnent l'offset
    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(hash[offset] & 0x7f) << 24)
        | (u32::from(hash[offset + 1]) << 16)
        | (u32::from(hash[offset + 2]) << 8)
        | u32::from(hash[offset + 3]);

    let modulo = 10u64.checked_pow(digits).unwrap_or(u64::MAX);
    let code = u64::from(binary) % modulo;

    format!("{:0width$}", code, width = digits as usize)
}
