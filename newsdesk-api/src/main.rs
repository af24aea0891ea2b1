//! Newsdesk bot process
//!
//! Starts the Discord bot service and, when enabled, the administrative
//! HTTP API server that exposes read/write passthroughs to the guild.

mod routes;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsdesk_bot::NewsdeskBot;
use newsdesk_core::BotConfig;
use newsdesk_extract::ArticleFetcher;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<NewsdeskBot>,
    /// Bearer token required on every request when configured
    pub api_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file when present
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // A missing token is fatal before any connection is attempted
    let config = BotConfig::from_env()?;

    info!("Starting Newsdesk");

    let fetcher = ArticleFetcher::new()?;
    let bot = Arc::new(NewsdeskBot::new(config.clone(), fetcher));

    let bot_task = tokio::spawn(Arc::clone(&bot).start());

    if !config.api.enabled {
        info!("API server disabled");
        bot_task.await?;
        return Ok(());
    }

    let state = AppState {
        bot,
        api_token: config.api.token.clone(),
    };

    // Permissive CORS for operator tooling
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = Router::new()
        .merge(routes::api_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::require_token,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server is listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
