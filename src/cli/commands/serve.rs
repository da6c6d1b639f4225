//! Serve command - run the HTTP server.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::provider::GeminiProcessor;
use crate::server::{self, AppState};
use crate::workflow::{UploadSummaryWorkflow, WorkflowOptions};
use std::sync::Arc;
use tracing::info;

/// Run the HTTP server until Ctrl+C.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'earshot doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let processor = Arc::new(GeminiProcessor::from_settings(&settings.provider)?);
    let workflow = UploadSummaryWorkflow::new(processor, WorkflowOptions::from(&settings.workflow));
    let state = Arc::new(AppState::new(workflow, &settings)?);
    let app = server::router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Earshot");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Landing page", "GET  /");
    Output::kv("Upload", "POST /upload");
    Output::kv("Health", "GET  /health");
    println!();
    Output::kv("Model", &settings.provider.model);
    Output::kv("Uploads", &settings.uploads_dir().display().to_string());
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
