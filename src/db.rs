use anyhow::Context;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

/// Applies one service's migrations. The other service's rows in `_sqlx_migrations` are ignored.
pub async fn migrate(db: &PgPool, mut migrator: Migrator) {
    migrator.set_ignore_missing(true);
    if let Err(e) = migrator.run(db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }
}

pub fn auth_migrations() -> Migrator {
    sqlx::migrate!("./migrations/auth")
}

pub fn notes_migrations() -> Migrator {
    sqlx::migrate!("./migrations/notes")
}
