// connexion BD + schéma de la table confirmations

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Schema, Statement};
use tracing::info;

use crate::models::confirmation_record::{Column, Entity as ConfirmationRecord};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Crée la table et ses index s'ils n'existent pas encore
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // 1. Table
    let mut table = schema.create_table_from_entity(ConfirmationRecord);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    // 2. Index de recherche
    let indexes = [
        ("idx_confirmations_short_key", Column::ShortKey),
        ("idx_confirmations_user_id", Column::UserId),
        ("idx_confirmations_creator_id", Column::CreatorId),
        ("idx_confirmations_type", Column::ConfirmationType),
        ("idx_confirmations_status", Column::Status),
        ("idx_confirmations_team_id", Column::TeamId),
    ];

    for (name, column) in indexes {
        let index = Index::create()
            .if_not_exists()
            .name(name)
            .table(ConfirmationRecord)
            .col(column)
            .to_owned();
        db.execute(backend.build(&index)).await?;
    }

    // 3. Email comparé en minuscules par les requêtes
    db.execute(Statement::from_string(
        backend,
        "CREATE INDEX IF NOT EXISTS idx_confirmations_email_lower ON confirmations (LOWER(email))",
    ))
    .await?;

    info!("✅ Schema ready (confirmations + {} indexes)", indexes.len() + 1);
    Ok(())
}
