// ============================================================================
// SERVICES
// ============================================================================
//
// Workflows métier portés par ConfirmationService, un fichier par domaine.
//
// ============================================================================

pub mod confirmation_service;
pub mod invitations;
pub mod password_reset;
pub mod team_invitations;
pub mod templates;

pub use confirmation_service::ConfirmationService;
