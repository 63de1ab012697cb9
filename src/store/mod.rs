// ============================================================================
// STORE - PERSISTANCE DES CONFIRMATIONS
// ============================================================================
//
// Description:
//   Trait commun aux stores + objet de requête (ConfirmationQuery).
//
// Implémentations:
//   - postgres : SeaORM / PostgreSQL (production)
//   - memory   : HashMap en mémoire (tests, STORE=memory en local)
//
// Sémantique de recherche (find_confirmations):
//   1. key renseignée -> seule la clé compte parmi les champs du gabarit
//   2. sinon ET logique des champs renseignés (user_id, email, creator_id,
//      team_id, short_key, type), email sans tenir compte de la casse
//   3. statuses non vide -> status dans la liste
//   4. types non vide -> type dans la liste (remplace le type du gabarit)
//   5. tri: plus récent (created) d'abord
//
// Points d'attention:
//   - "non trouvé" n'est jamais une erreur: Ok(None) / Ok(vec![])
//   - upsert_confirmation est le seul chemin d'écriture (dernier écrit gagne)
//
// ============================================================================

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::confirmation::{Confirmation, ConfirmationType, Status};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait ConfirmationStore: Send + Sync {
    /// Nom court pour les logs et /health
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert ou remplace, par clé
    async fn upsert_confirmation(&self, confirmation: &Confirmation) -> Result<(), StoreError>;

    /// Recherche exacte par clé uniquement (les autres champs sont ignorés)
    async fn find_confirmation(
        &self,
        query: &ConfirmationQuery,
    ) -> Result<Option<Confirmation>, StoreError>;

    async fn find_confirmations(
        &self,
        query: &ConfirmationQuery,
        statuses: &[Status],
        types: &[ConfirmationType],
    ) -> Result<Vec<Confirmation>, StoreError>;

    async fn remove_confirmation(&self, confirmation: &Confirmation) -> Result<(), StoreError>;
}

/// Gabarit de recherche: seuls les champs renseignés participent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfirmationQuery {
    pub key: Option<String>,
    pub short_key: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub creator_id: Option<String>,
    pub team_id: Option<String>,
    pub confirmation_type: Option<ConfirmationType>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl ConfirmationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_key(key: &str) -> Self {
        Self::new().key(key)
    }

    // Une valeur vide équivaut à "non renseigné"

    pub fn key(mut self, key: &str) -> Self {
        self.key = non_empty(key);
        self
    }

    pub fn short_key(mut self, short_key: &str) -> Self {
        self.short_key = non_empty(short_key);
        self
    }

    pub fn user_id(mut self, user_id: &str) -> Self {
        self.user_id = non_empty(user_id);
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = non_empty(email);
        self
    }

    pub fn creator_id(mut self, creator_id: &str) -> Self {
        self.creator_id = non_empty(creator_id);
        self
    }

    pub fn team_id(mut self, team_id: &str) -> Self {
        self.team_id = non_empty(team_id);
        self
    }

    pub fn confirmation_type(mut self, confirmation_type: ConfirmationType) -> Self {
        self.confirmation_type = Some(confirmation_type);
        self
    }

    /// Type du gabarit, ignoré quand une clé est fournie.
    /// La liste `types` passée aux requêtes s'y ajoute (ET logique).
    pub(crate) fn template_type(&self) -> Option<ConfirmationType> {
        match &self.key {
            Some(_) => None,
            None => self.confirmation_type,
        }
    }

    /// Prédicat de référence (utilisé tel quel par le store mémoire)
    pub fn matches(
        &self,
        confirmation: &Confirmation,
        statuses: &[Status],
        types: &[ConfirmationType],
    ) -> bool {
        let fields_match = match &self.key {
            Some(key) => confirmation.key() == key,
            None => {
                eq_opt(&self.short_key, confirmation.short_key())
                    && eq_opt(&self.user_id, confirmation.user_id.as_deref())
                    && eq_opt(&self.creator_id, confirmation.creator_id.as_deref())
                    && eq_opt(&self.team_id, confirmation.team_id.as_deref())
                    && self
                        .email
                        .as_deref()
                        .is_none_or(|email| confirmation.email_matches(email))
            }
        };

        let actual_type = confirmation.confirmation_type();

        fields_match
            && self.template_type().is_none_or(|t| t == actual_type)
            && (statuses.is_empty() || statuses.contains(&confirmation.status))
            && (types.is_empty() || types.contains(&actual_type))
    }
}

fn eq_opt(expected: &Option<String>, actual: Option<&str>) -> bool {
    expected.as_deref().is_none_or(|e| actual == Some(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(creator: &str, email: &str) -> Confirmation {
        let mut c = Confirmation::new(ConfirmationType::CareteamInvite, Some(creator)).unwrap();
        c.email = Some(email.to_string());
        c
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let query = ConfirmationQuery::new().user_id("").email("").creator_id("A");
        assert_eq!(query.user_id, None);
        assert_eq!(query.email, None);
        assert_eq!(query.creator_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_fields_are_combined_with_and() {
        let c = invite("A", "b@x.com");

        assert!(ConfirmationQuery::new().creator_id("A").matches(&c, &[], &[]));
        assert!(ConfirmationQuery::new()
            .creator_id("A")
            .email("B@X.COM")
            .matches(&c, &[], &[]));
        assert!(!ConfirmationQuery::new()
            .creator_id("A")
            .email("other@x.com")
            .matches(&c, &[], &[]));
    }

    #[test]
    fn test_key_overrides_other_fields() {
        let c = invite("A", "b@x.com");
        let query = ConfirmationQuery::by_key(c.key()).creator_id("somebody-else");

        assert!(query.matches(&c, &[], &[]));
        assert!(!query.matches(&c, &[Status::Completed], &[]));
    }

    #[test]
    fn test_type_list_and_template_type_are_intersected() {
        let c = invite("A", "b@x.com");
        let both = [ConfirmationType::CareteamInvite, ConfirmationType::MedicalTeamInvite];

        let medical = ConfirmationQuery::new()
            .creator_id("A")
            .confirmation_type(ConfirmationType::MedicalTeamInvite);
        assert!(!medical.matches(&c, &[], &[]));
        assert!(!medical.matches(&c, &[], &both));

        let careteam = ConfirmationQuery::new()
            .creator_id("A")
            .confirmation_type(ConfirmationType::CareteamInvite);
        assert!(careteam.matches(&c, &[], &both));
        assert!(!careteam.matches(&c, &[], &[ConfirmationType::MedicalTeamInvite]));

        // Sans type dans le gabarit, la liste suffit
        assert!(ConfirmationQuery::new().creator_id("A").matches(&c, &[], &both));
    }

    #[test]
    fn test_status_filter() {
        let mut c = invite("A", "b@x.com");
        c.update_status(Status::Declined);
        let query = ConfirmationQuery::new().creator_id("A");

        assert!(query.matches(&c, &[Status::Declined, Status::Completed], &[]));
        assert!(!query.matches(&c, &[Status::Pending], &[]));
    }
}
