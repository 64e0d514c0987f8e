use std::sync::Arc;

use notekeep::{
    app::{build_notes_app, init_tracing, serve},
    config::{AppConfig, UserServiceConfig},
    db,
    state::NotesState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    let user_service = UserServiceConfig::from_env();
    tracing::info!(url = %user_service.base_url, timeout_ms = user_service.timeout_ms, "user checks go to auth service");

    let pool = db::connect(&config).await?;
    db::migrate(&pool, db::notes_migrations()).await;

    let state = NotesState::init(pool.clone(), config, &user_service)?;
    serve(build_notes_app(state), 8081).await?;

    pool.close().await;
    Ok(())
}
