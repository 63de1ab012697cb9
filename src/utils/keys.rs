use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

use crate::error::ConfirmationError;

/// Longueur d'une clé longue (24 octets aléatoires = 32 caractères base64)
pub const KEY_LENGTH: usize = 32;
const KEY_BYTES: usize = KEY_LENGTH / 4 * 3;

/// Alphabet des clés courtes: pas de 0/O ni de 1/I/L
pub const SHORT_KEY_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Génère la clé longue d'une confirmation (seule autorité pour agir via le lien)
/// Source: OsRng, encodée en base64 URL-safe sans padding
pub fn generate_key() -> Result<String, ConfirmationError> {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ConfirmationError::KeyGeneration(e.to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Génère une clé courte saisissable par un humain
/// Pas unique globalement: toujours recherchée avec l'email du compte
pub fn generate_short_key(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| SHORT_KEY_ALPHABET[rng.gen_range(0..SHORT_KEY_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn is_url_safe(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    }

    #[test]
    fn test_key_has_fixed_length_and_url_safe_alphabet() {
        let key = generate_key().unwrap();

        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.chars().all(is_url_safe), "unexpected character in {}", key);
    }

    #[test]
    fn test_keys_are_not_repeated() {
        let keys: HashSet<String> = (0..1000).map(|_| generate_key().unwrap()).collect();
        assert_eq!(keys.len(), 1000);

        let first = generate_key().unwrap();
        let second = generate_key().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_short_key_length_and_alphabet() {
        for length in [1, 6, 8, 12] {
            let key = generate_short_key(length);
            assert_eq!(key.len(), length);
            assert!(key.bytes().all(|b| SHORT_KEY_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_short_key_alphabet_has_no_ambiguous_characters() {
        for ambiguous in [b'0', b'O', b'1', b'I', b'L'] {
            assert!(!SHORT_KEY_ALPHABET.contains(&ambiguous));
        }
    }
}
