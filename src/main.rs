//! Volunteer Intake Backend
//!
//! Serves volunteer profiles from SQLite and runs the intake core on them:
//! skill merging, role-dependent section navigation and completion tracking.

mod api;
mod auth;
mod completion;
mod config;
mod db;
mod errors;
mod models;
mod sections;
mod skills;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Volunteer Intake Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Required profile fields: {}",
        config
            .required_fields
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (VOLUNTEER_API_PSK). Authentication is disabled!");
    }
    if config.required_fields.is_empty() {
        tracing::warn!("No required profile fields configured; every saved profile reports 100%");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        .route("/profiles", get(api::list_profiles))
        .route("/profiles/{user_id}", get(api::get_profile))
        .route("/profiles/{user_id}", put(api::submit_profile))
        .route("/profiles/{user_id}/dashboard", get(api::get_dashboard))
        .route("/profiles/{user_id}/sections", get(api::list_sections))
        .route("/profiles/{user_id}/navigation", get(api::navigate))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
