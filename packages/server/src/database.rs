use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::entity::link;

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.clone());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(config.max_connections.min(5))
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    ensure_schema(&db).await?;

    Ok(db)
}

/// Create the `link` table and its lookup index when missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    let mut table = Schema::new(backend).create_table_from_entity(link::Entity);
    table.if_not_exists();
    db.execute_raw(backend.build(&table)).await?;
    info!("Ensured table link exists");

    // Every API call filters on the owner:
    // SELECT ... FROM link WHERE identity_hash = ?
    let index = Index::create()
        .if_not_exists()
        .name("idx_link_identity_hash")
        .table(link::Entity)
        .col(link::Column::IdentityHash)
        .to_owned();

    match db.execute_raw(backend.build(&index)).await {
        Ok(_) => info!("Ensured index idx_link_identity_hash exists"),
        Err(e) => warn!("Failed to create index idx_link_identity_hash: {}", e),
    }

    Ok(())
}
