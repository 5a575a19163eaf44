use std::sync::Arc;
use backend::{
    build_rocket,
    config::AppConfig,
    queries::PgStore,
    repo_check::{run_repo_check_task, GithubProbe},
    routes::AppState,
    store::Store,
};
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tracing::{error, info};

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🚀 Starting Meme War server");

    let config = AppConfig::from_secrets(&secret_store);

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(CustomError::new)?;

    info!("📋 Migrations complete");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    if let Some(token) = &config.github_token {
        match GithubProbe::new(token.clone()) {
            Ok(probe) => {
                tokio::spawn(run_repo_check_task(
                    store.clone(),
                    Arc::new(probe),
                    config.repo_check_interval,
                ));
            }
            Err(e) => error!("Repository checks disabled: {}", e),
        }
    }

    let rocket = build_rocket(AppState::new(store, &config));

    Ok(rocket.into())
}
