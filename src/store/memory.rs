// Store en mémoire: même sémantique que PostgresStore, sans base.
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ConfirmationQuery, ConfirmationStore};
use crate::error::StoreError;
use crate::models::confirmation::{Confirmation, ConfirmationType, Status};

#[derive(Default)]
pub struct MemoryStore {
    confirmations: RwLock<HashMap<String, Confirmation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfirmationStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_confirmation(&self, confirmation: &Confirmation) -> Result<(), StoreError> {
        let mut confirmations = self.confirmations.write().await;
        confirmations.insert(confirmation.key().to_string(), confirmation.clone());
        debug!("💾 Upserted confirmation {} ({})", confirmation.key(), confirmation.confirmation_type());
        Ok(())
    }

    async fn find_confirmation(
        &self,
        query: &ConfirmationQuery,
    ) -> Result<Option<Confirmation>, StoreError> {
        let Some(key) = query.key.as_deref() else {
            return Ok(None);
        };
        let confirmations = self.confirmations.read().await;
        Ok(confirmations.get(key).cloned())
    }

    async fn find_confirmations(
        &self,
        query: &ConfirmationQuery,
        statuses: &[Status],
        types: &[ConfirmationType],
    ) -> Result<Vec<Confirmation>, StoreError> {
        let confirmations = self.confirmations.read().await;

        let mut found: Vec<Confirmation> = confirmations
            .values()
            .filter(|c| query.matches(c, statuses, types))
            .cloned()
            .collect();

        // Plus récent d'abord
        found.sort_by(|a, b| b.created().cmp(&a.created()));

        Ok(found)
    }

    async fn remove_confirmation(&self, confirmation: &Confirmation) -> Result<(), StoreError> {
        let mut confirmations = self.confirmations.write().await;
        confirmations.remove(confirmation.key());
        Ok(())
    }
}
