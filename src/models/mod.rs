// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//
// Liste des modules:
//   - health : Health check API
//   - confirmation : Entité Confirmation (cycle de vie, expiration, contexte)
//   - confirmation_record : Table confirmations (SeaORM)
//   - context : Contexte taggé par type (permissions, OTP)
//   - profile : Auteur, profils, préférences, identités externes
//   - validation : Chaîne de validation avant une transition
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//
// Points d'attention:
//   - Seule la table confirmations est persistée ici; utilisateurs, équipes
//     et profils vivent dans des services externes
//
// ============================================================================

pub mod health;
pub mod confirmation;
pub mod confirmation_record;
pub mod context;
pub mod profile;
pub mod validation;
pub mod dto;
