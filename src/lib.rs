pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::repositories::classifications::{
    MemoryClassificationStore, PgClassificationStore, SharedClassificationStore,
};
use crate::services::chat::ChatService;
use crate::services::dashboard::DashboardService;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let classifications: SharedClassificationStore = match settings.database().url() {
        Some(_) => {
            let db_pool = db::init_pool(&settings).await?;
            db::run_migrations(&db_pool).await?;
            tracing::info!("Classification cache backed by PostgreSQL");
            Arc::new(PgClassificationStore::new(db_pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not configured; classification cache is in-memory only");
            Arc::new(MemoryClassificationStore::new())
        }
    };

    let chat = ChatService::from_settings(&settings)?;
    let dashboard = DashboardService::new(chat, classifications.clone());
    let state = AppState::new(settings, classifications, dashboard);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        cache_backend = state.classifications().backend(),
        "Arikya Insight API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    Ok(())
}
