// Library root for the worldcup bulletin board

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod render;
pub mod upload;

// Re-export commonly used types
pub use db::Database;
pub use error::AppError;
pub use models::{CreatePostRequest, Post, UpdatePostRequest};

use render::Templates;
use upload::UploadStore;

/// Shared application state, built once at startup and injected into every
/// route handler through axum state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub uploads: UploadStore,
    pub templates: Templates,
}
