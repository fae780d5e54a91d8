mod auth;
mod availability;
mod config;
mod middleware;
mod schedule;
mod seed;
mod services;
mod store;

mod db;
mod error;
mod models;
mod routes;

use std::sync::Arc;

use crate::{
    availability::AvailabilityCalculator,
    config::Config,
    models::AppState,
    services::{AppointmentService, PatientService},
    store::{PgStore, Store},
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let pool = db::connect_pg(&cfg.database_url, cfg.db_max_connections).await?;
    db::ensure_schema(&pool).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));

    if cfg.seed.on_startup {
        let today = chrono::Local::now().date_naive();
        seed::run(&pool, store.as_ref(), &cfg.seed, today).await?;
    }

    let state = AppState {
        db: pool,
        store: store.clone(),
        appointments: AppointmentService::new(store.clone()),
        patients: PatientService::new(store.clone()),
        availability: AvailabilityCalculator::new(store),
        session_ttl_hours: cfg.session_ttl_hours,
    };

    // DEV ONLY: browser clients call the API cross-origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
