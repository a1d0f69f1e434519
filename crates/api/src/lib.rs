//! # Visita API
//!
//! The API crate provides the web server for the Visita clinic booking
//! engine. It exposes the public slot calendar and the price list, the
//! patient booking and cancellation operations, and the staff surface
//! for rescheduling and availability management.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing and the booking policies
//! - **Middleware**: Bearer-token authentication and error mapping
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework; every occupancy mutation is
//! delegated to the slot store in `visita-db`, which is the single point
//! of concurrency control.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for authentication and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::Result;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state accessible to all request handlers.
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// Runtime configuration (JWT secret, clinic offset, ...)
    pub config: config::ApiConfig,
}

/// Starts the API server with the provided configuration and database
/// connection: initializes logging, assembles the router and serves until
/// shutdown.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let addr = config.server_addr();

    // Create shared state with dependencies
    let state = Arc::new(ApiState { db_pool, config });

    // Build the application router with all routes
    let app = Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Public slot calendar
        .merge(routes::slots::routes())
        // Booking, cancellation and visit listing
        .merge(routes::visits::routes())
        // Staff availability and reschedule operations
        .merge(routes::admin::routes())
        // Price list
        .merge(routes::services::routes())
        // Attach shared state to all routes
        .with_state(Arc::clone(&state));

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &state.config.cors_origins {
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(
                origins
                    .iter()
                    .map(|origin| origin.parse().unwrap())
                    .collect::<Vec<_>>(),
            )
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(
        tower::ServiceBuilder::new()
            .layer(axum::error_handling::HandleErrorLayer::new(
                |_: tower::BoxError| async { axum::http::StatusCode::REQUEST_TIMEOUT },
            ))
            .timeout(std::time::Duration::from_secs(state.config.request_timeout)),
    );

    // Start the HTTP server
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
