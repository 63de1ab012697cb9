use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::*;
use tracing::{debug, error};

use super::{ConfirmationQuery, ConfirmationStore};
use crate::error::StoreError;
use crate::models::confirmation::{Confirmation, ConfirmationType, Status};
use crate::models::confirmation_record::{self, Column, Entity as ConfirmationRecord};

pub struct PostgresStore {
    db: DatabaseConnection,
}

impl PostgresStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Traduit le gabarit + filtres en condition SQL (ET logique)
fn query_condition(
    query: &ConfirmationQuery,
    statuses: &[Status],
    types: &[ConfirmationType],
) -> Condition {
    let mut condition = Condition::all();

    match &query.key {
        Some(key) => {
            condition = condition.add(Column::Key.eq(key.clone()));
        }
        None => {
            if let Some(short_key) = &query.short_key {
                condition = condition.add(Column::ShortKey.eq(short_key.clone()));
            }
            if let Some(user_id) = &query.user_id {
                condition = condition.add(Column::UserId.eq(user_id.clone()));
            }
            if let Some(creator_id) = &query.creator_id {
                condition = condition.add(Column::CreatorId.eq(creator_id.clone()));
            }
            if let Some(team_id) = &query.team_id {
                condition = condition.add(Column::TeamId.eq(team_id.clone()));
            }
            // Email insensible à la casse
            if let Some(email) = &query.email {
                condition = condition.add(
                    Expr::expr(Func::lower(Expr::col((ConfirmationRecord, Column::Email))))
                        .eq(email.to_lowercase()),
                );
            }
        }
    }

    if !statuses.is_empty() {
        condition = condition.add(Column::Status.is_in(statuses.iter().copied()));
    }

    if let Some(template_type) = query.template_type() {
        condition = condition.add(Column::ConfirmationType.eq(template_type));
    }
    if !types.is_empty() {
        condition = condition.add(Column::ConfirmationType.is_in(types.iter().copied()));
    }

    condition
}

#[async_trait]
impl ConfirmationStore for PostgresStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.ping().await.map_err(|e| {
            error!("❌ Database ping failed: {}", e);
            StoreError::Unavailable(e.to_string())
        })
    }

    async fn upsert_confirmation(&self, confirmation: &Confirmation) -> Result<(), StoreError> {
        let record = confirmation_record::Model::from_confirmation(confirmation)?;

        ConfirmationRecord::insert(record.into_active_model_set())
            .on_conflict(
                OnConflict::column(Column::Key)
                    .update_columns([
                        Column::ShortKey,
                        Column::Status,
                        Column::UserId,
                        Column::CreatorId,
                        Column::Creator,
                        Column::Email,
                        Column::TeamId,
                        Column::IsAdmin,
                        Column::Context,
                        Column::Modified,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        debug!("💾 Upserted confirmation {} ({})", confirmation.key(), confirmation.confirmation_type());
        Ok(())
    }

    async fn find_confirmation(
        &self,
        query: &ConfirmationQuery,
    ) -> Result<Option<Confirmation>, StoreError> {
        let Some(key) = query.key.clone() else {
            return Ok(None);
        };

        ConfirmationRecord::find_by_id(key)
            .one(&self.db)
            .await?
            .map(confirmation_record::Model::into_confirmation)
            .transpose()
    }

    async fn find_confirmations(
        &self,
        query: &ConfirmationQuery,
        statuses: &[Status],
        types: &[ConfirmationType],
    ) -> Result<Vec<Confirmation>, StoreError> {
        let records = ConfirmationRecord::find()
            .filter(query_condition(query, statuses, types))
            .order_by_desc(Column::Created)
            .all(&self.db)
            .await?;

        records
            .into_iter()
            .map(confirmation_record::Model::into_confirmation)
            .collect()
    }

    async fn remove_confirmation(&self, confirmation: &Confirmation) -> Result<(), StoreError> {
        ConfirmationRecord::delete_by_id(confirmation.key().to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
