use std::sync::Arc;

use notekeep::{
    app::{build_auth_app, init_tracing, serve},
    config::AppConfig,
    db,
    state::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config).await?;
    db::migrate(&pool, db::auth_migrations()).await;

    let app = build_auth_app(AuthState::init(pool.clone(), config));
    serve(app, 8080).await?;

    pool.close().await;
    Ok(())
}
