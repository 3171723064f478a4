//! MDM Console
//!
//! A server-rendered master data management console over the HR REST API. Each entity is a
//! declarative resource descriptor; generic list and form pages are driven from it.

mod auth;
mod config;
mod db;
mod errors;
mod forms;
mod models;
mod resource;
mod transport;
mod views;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::TokenProvider;
use config::Config;
use db::SqliteTokenStore;
use transport::TransportClient;
use views::SubmitGuard;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: TransportClient,
    pub guard: Arc<SubmitGuard>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MDM Console");
    tracing::info!("API base URL: {}", config.api_url);
    tracing::info!("Token store: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize token storage
    let pool = db::init_database(&config.db_path).await?;
    let store = Arc::new(SqliteTokenStore::new(pool));
    let tokens = TokenProvider::new(store.clone(), &config.token_key);
    tokens.prune_expired(config.session_ttl()).await?;
    tracing::info!("Stored sessions: {}", store.count().await?);

    let client = TransportClient::new(&config.api_url, tokens);

    let state = AppState {
        client,
        guard: Arc::new(SubmitGuard::new()),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Console listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the console router with all routes.
pub fn create_router(state: AppState) -> Router {
    let entity_routes = Router::new()
        .route(
            "/entities/{key}",
            get(views::list_records).post(views::create_record),
        )
        .route("/entities/{key}/new", get(views::new_record))
        .route("/entities/{key}/{id}", post(views::update_record))
        .route("/entities/{key}/{id}/edit", get(views::edit_record))
        .route(
            "/entities/{key}/{id}/delete",
            get(views::confirm_delete).post(views::delete_record),
        );

    let user_routes = Router::new()
        .route("/users/{user_id}", get(views::user_detail))
        .route(
            "/users/{user_id}/entities/{key}",
            get(views::list_records).post(views::create_record),
        )
        .route("/users/{user_id}/entities/{key}/new", get(views::new_record))
        .route(
            "/users/{user_id}/entities/{key}/{id}",
            post(views::update_record),
        )
        .route(
            "/users/{user_id}/entities/{key}/{id}/edit",
            get(views::edit_record),
        )
        .route(
            "/users/{user_id}/entities/{key}/{id}/delete",
            get(views::confirm_delete).post(views::delete_record),
        );

    let session_routes = Router::new()
        .route("/login", get(views::login_form).post(views::login_submit))
        .route("/logout", post(views::logout));

    // Health check (no session required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .route("/", get(views::dashboard))
        .merge(entity_routes)
        .merge(user_routes)
        .merge(session_routes)
        .merge(health_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
