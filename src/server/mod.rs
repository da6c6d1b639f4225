//! HTTP surface: landing page and the upload endpoint.

mod error;
mod handlers;
mod staging;

pub use error::{ApiError, ErrorResponse, GENERIC_FAILURE};
pub use handlers::SummaryResponse;
pub use staging::StagedUpload;

use crate::config::Settings;
use crate::error::Result;
use crate::workflow::UploadSummaryWorkflow;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const DEFAULT_INDEX_HTML: &str = include_str!("index.html");

/// Shared application state.
pub struct AppState {
    workflow: UploadSummaryWorkflow,
    uploads_dir: PathBuf,
    default_prompt: String,
    index_html: String,
    max_upload_bytes: usize,
}

impl AppState {
    /// Build the state, creating the uploads directory if needed.
    pub fn new(workflow: UploadSummaryWorkflow, settings: &Settings) -> Result<Self> {
        let uploads_dir = settings.uploads_dir();
        std::fs::create_dir_all(&uploads_dir)?;

        let index_html = match settings.index_path() {
            Some(path) => std::fs::read_to_string(&path)?,
            None => DEFAULT_INDEX_HTML.to_string(),
        };

        Ok(Self {
            workflow,
            uploads_dir,
            default_prompt: settings.workflow.default_prompt.clone(),
            index_html,
            max_upload_bytes: settings.server.max_upload_bytes,
        })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
