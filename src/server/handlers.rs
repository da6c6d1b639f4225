//! Request handlers.

use super::error::ApiError;
use super::staging::StagedUpload;
use super::AppState;
use crate::error::{EarshotError, Result};
use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

pub(super) async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.index_html.clone())
}

pub(super) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub(super) async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> std::result::Result<Json<SummaryResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("upload", %request_id);

    let form = UploadForm::read(multipart).instrument(span.clone()).await?;
    let prompt = form
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| state.default_prompt.clone());

    // The workflow runs in its own task so that a client disconnect does not
    // abort the provider calls already in flight.
    let task = tokio::spawn(
        async move {
            info!(filename = %form.filename, bytes = form.bytes.len(), "Received upload");

            let staged =
                StagedUpload::write(&state.uploads_dir, request_id, &form.filename, &form.bytes)
                    .await?;
            state.workflow.run(staged.path(), &prompt).await
        }
        .instrument(span),
    );

    let result = task
        .await
        .map_err(|e| EarshotError::Unknown(format!("Upload task failed: {}", e)))??;

    Ok(Json(SummaryResponse {
        summary: result.html,
    }))
}

/// Fields pulled out of the multipart body.
struct UploadForm {
    filename: String,
    bytes: Vec<u8>,
    prompt: Option<String>,
}

impl UploadForm {
    /// Read every field, then check that a named file part was sent.
    ///
    /// A `file` part without a filename counts as a plain form field, so it
    /// does not satisfy the file requirement.
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut file: Option<(String, Vec<u8>)> = None;
        let mut prompt = None;

        while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") if file.is_none() => {
                    let Some(filename) = field.file_name().map(str::to_string) else {
                        debug!("Ignoring file field without a filename");
                        continue;
                    };
                    let bytes = field.bytes().await.map_err(invalid_multipart)?;
                    file = Some((filename, bytes.to_vec()));
                }
                Some("customInput") => {
                    prompt = Some(field.text().await.map_err(invalid_multipart)?);
                }
                _ => {}
            }
        }

        let (filename, bytes) = file.ok_or(EarshotError::MissingFilePart)?;
        if filename.is_empty() {
            return Err(EarshotError::EmptyFilename);
        }

        Ok(Self {
            filename,
            bytes,
            prompt,
        })
    }
}

fn invalid_multipart(e: axum::extract::multipart::MultipartError) -> EarshotError {
    EarshotError::InvalidInput(format!("Malformed multipart body: {}", e))
}
