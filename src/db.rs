use sea_orm::{Database, DatabaseConnection, DbErr};

/// Connect to the backend store and verify it is reachable.
///
/// No migrations run here: the schema is provisioned out of band
/// (schema.sql) and merely consumed. Until the tables exist, reads render
/// as empty collections.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;
    db.ping().await?;
    Ok(db)
}
