use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::{error, info};

use worldcup_board::{
    config::Config,
    db::Database,
    handlers::{health_check, posts},
    middleware::{create_middleware_stack, init_tracing},
    render::Templates,
    upload::UploadStore,
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database connection
    let database = match Database::new(config.database.clone()).await {
        Ok(db) => {
            info!("Database connection established");
            db
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // Run database migrations
    if let Err(e) = database.migrate().await {
        error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }
    info!("Database migrations completed successfully");

    // Prepare the upload directory
    let uploads = UploadStore::new(&config.upload_dir);
    if let Err(e) = uploads.init().await {
        error!("Failed to prepare upload directory: {}", e);
        std::process::exit(1);
    }

    let state = Arc::new(AppState {
        db: database,
        uploads,
        templates: Templates::new(&config.template_dir),
    });

    // Create the Axum router with all endpoints
    let app = create_router(state, &config.upload_dir);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Start the server with graceful shutdown handling
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Create the Axum router with all endpoints and middleware
fn create_router(state: Arc<AppState>, upload_dir: &str) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Board pages
        .route("/", get(posts::index))
        .route("/create", get(posts::create_form).post(posts::create_post))
        .route("/search", get(posts::search_posts))
        .route("/post", get(posts::show_post))
        .route("/edit", get(posts::edit_form))
        .route("/update", post(posts::update_post))
        .route("/delete", get(posts::delete_form).post(posts::delete_post))
        // Uploaded images are served straight from the content directory
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Add shared state
        .with_state(state)
        // Create submissions carry four image files; cap bodies at 20 MB
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
        // Apply middleware stack
        .layer(create_middleware_stack())
}

/// Graceful shutdown signal handler
/// Listens for SIGTERM and SIGINT signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        },
    }
}
