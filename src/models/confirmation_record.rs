// ============================================================================
// MODÈLE : TABLE CONFIRMATIONS
// ============================================================================
//
// Description:
//   Disposition persistée d'une Confirmation (SeaORM / PostgreSQL).
//
// Colonnes de la table confirmations:
//   - key (VARCHAR, PRIMARY KEY) - clé longue, 32 caractères
//   - short_key (VARCHAR, NULL) - reset mot de passe patient, toujours lue avec l'email
//   - type (VARCHAR(32), NOT NULL)
//   - template_name (VARCHAR(32), NOT NULL)
//   - status (VARCHAR(16), NOT NULL)
//   - user_id, creator_id, email, team_id (VARCHAR, NULL)
//   - is_admin (BOOLEAN, NULL)
//   - creator (JSONB, NOT NULL) - instantané du profil de l'auteur
//   - context (JSONB, NULL) - contexte taggé par type
//   - created (TIMESTAMPTZ, NOT NULL)
//   - modified (TIMESTAMPTZ, NULL)
//
// Index (créés au démarrage, voir db.rs):
//   LOWER(email), short_key, user_id, creator_id, type, status, team_id
//
// ============================================================================

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::confirmation::{Confirmation, ConfirmationType, Status, TemplateName};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "confirmations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,

    pub short_key: Option<String>,

    #[sea_orm(column_name = "type")]
    pub confirmation_type: ConfirmationType,

    pub template_name: TemplateName,

    pub status: Status,

    pub user_id: Option<String>,

    pub creator_id: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub creator: Json,

    pub email: Option<String>,

    pub team_id: Option<String>,

    pub is_admin: Option<bool>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub context: Option<Json>,

    pub created: DateTimeUtc,

    pub modified: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn serialization(e: serde_json::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}

impl Model {
    pub fn from_confirmation(confirmation: &Confirmation) -> Result<Self, StoreError> {
        let context = confirmation
            .context()
            .map(serde_json::to_value)
            .transpose()
            .map_err(serialization)?;

        Ok(Self {
            key: confirmation.key().to_string(),
            short_key: confirmation.short_key().map(str::to_string),
            confirmation_type: confirmation.confirmation_type(),
            template_name: confirmation.template_name(),
            status: confirmation.status,
            user_id: confirmation.user_id.clone(),
            creator_id: confirmation.creator_id.clone(),
            creator: serde_json::to_value(&confirmation.creator).map_err(serialization)?,
            email: confirmation.email.clone(),
            team_id: confirmation.team_id.clone(),
            is_admin: confirmation.is_admin,
            context,
            created: confirmation.created(),
            modified: confirmation.modified(),
        })
    }

    pub fn into_confirmation(self) -> Result<Confirmation, StoreError> {
        let context = self
            .context
            .map(serde_json::from_value)
            .transpose()
            .map_err(serialization)?;

        let mut confirmation = Confirmation::restore(
            self.key,
            self.short_key,
            self.confirmation_type,
            self.template_name,
            self.status,
            context,
            self.created,
            self.modified,
        );
        confirmation.user_id = self.user_id;
        confirmation.creator_id = self.creator_id;
        confirmation.creator = serde_json::from_value(self.creator).map_err(serialization)?;
        confirmation.email = self.email;
        confirmation.team_id = self.team_id;
        confirmation.is_admin = self.is_admin;

        Ok(confirmation)
    }

    /// Toutes les colonnes à Set (insert ou update complet)
    pub fn into_active_model_set(self) -> ActiveModel {
        ActiveModel {
            key: Set(self.key),
            short_key: Set(self.short_key),
            confirmation_type: Set(self.confirmation_type),
            template_name: Set(self.template_name),
            status: Set(self.status),
            user_id: Set(self.user_id),
            creator_id: Set(self.creator_id),
            creator: Set(self.creator),
            email: Set(self.email),
            team_id: Set(self.team_id),
            is_admin: Set(self.is_admin),
            context: Set(self.context),
            created: Set(self.created),
            modified: Set(self.modified),
        }
    }
}
