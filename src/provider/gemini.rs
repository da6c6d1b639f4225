//! Google Gemini implementation (Files API + `generateContent`).

use super::{
    AssetHandle, AssetUpload, InferenceRequest, MediaProcessor, ProcessingState, UploadedAsset,
};
use crate::config::ProviderSettings;
use crate::error::{EarshotError, Result};
use crate::http::create_client_with_timeout;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini-backed media processor.
pub struct GeminiProcessor {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl GeminiProcessor {
    /// Create a processor from provider settings, reading the API key from the
    /// environment.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let api_key = settings.api_key()?;
        Self::with_config(
            &settings.base_url,
            &api_key,
            &settings.model,
            settings.request_timeout(),
        )
    }

    /// Create a processor with explicit configuration.
    pub fn with_config(
        base_url: &str,
        api_key: &str,
        model: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(request_timeout)?,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| EarshotError::Config(format!("Invalid endpoint {}: {}", path, e)))
    }
}

#[async_trait]
impl MediaProcessor for GeminiProcessor {
    #[instrument(
        skip(self, upload),
        fields(display_name = %upload.display_name, bytes = upload.bytes.len())
    )]
    async fn submit(&self, upload: AssetUpload) -> Result<UploadedAsset> {
        let AssetUpload {
            local_path,
            display_name,
            mime_type,
            bytes,
        } = upload;

        // Resumable upload: the start call hands back a session URL that
        // receives the bytes.
        let start = self
            .client
            .post(self.endpoint("upload/v1beta/files")?)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", &mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = check_status(start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| EarshotError::Provider {
                status: start.status().as_u16(),
                message: "Upload session URL missing from response".to_string(),
            })?
            .to_string();

        debug!("Upload session opened");

        let response = self
            .client
            .post(upload_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let envelope: FileEnvelope = check_status(response).await?.json().await?;

        let file = envelope.file;
        debug!(name = %file.name, state = ?file.state, "Upload finalized");

        Ok(UploadedAsset {
            local_path,
            state: parse_state(file.state.as_deref()),
            display_name: file.display_name.unwrap_or(display_name),
            mime_type: file.mime_type.unwrap_or(mime_type),
            expires_at: file.expiration_time,
            handle: AssetHandle {
                name: file.name,
                uri: file.uri,
            },
        })
    }

    #[instrument(skip(self), fields(name = %asset.name))]
    async fn status(&self, asset: &AssetHandle) -> Result<ProcessingState> {
        let response = self
            .client
            .get(self.endpoint(&format!("v1beta/{}", asset.name))?)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let file: FileResource = check_status(response).await?.json().await?;

        if let Some(error) = &file.error {
            debug!(code = error.code, message = %error.message, "Provider reported a file error");
        }

        Ok(parse_state(file.state.as_deref()))
    }

    #[instrument(
        skip(self, request),
        fields(name = %request.asset().handle.name, model = %self.model)
    )]
    async fn infer(&self, request: &InferenceRequest<'_>, timeout: Duration) -> Result<String> {
        let asset = request.asset();
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: request.prompt(),
                    },
                    Part::FileData {
                        file_data: FileData {
                            mime_type: &asset.mime_type,
                            file_uri: &asset.handle.uri,
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(self.endpoint(&format!("v1beta/models/{}:generateContent", self.model))?)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| inference_transport_error(e, timeout))?;

        let response = check_status(response).await.map_err(|e| match e {
            EarshotError::Provider { status, message } => {
                EarshotError::Inference(format!("{}: {}", status, message))
            }
            other => other,
        })?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| inference_transport_error(e, timeout))?;

        extract_text(parsed)
    }

    #[instrument(skip(self), fields(name = %asset.name))]
    async fn delete(&self, asset: &AssetHandle) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("v1beta/{}", asset.name))?)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    // Url::join drops the last path segment unless it ends with a slash.
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };
    Url::parse(&normalized)
        .map_err(|e| EarshotError::Config(format!("Invalid provider base URL {}: {}", base_url, e)))
}

fn parse_state(state: Option<&str>) -> ProcessingState {
    match state {
        Some("ACTIVE") => ProcessingState::Ready,
        Some("PROCESSING") => ProcessingState::Processing,
        Some("FAILED") => ProcessingState::Failed,
        _ => ProcessingState::Pending,
    }
}

fn inference_transport_error(e: reqwest::Error, timeout: Duration) -> EarshotError {
    if e.is_timeout() {
        EarshotError::Timeout(format!("Inference exceeded {}s", timeout.as_secs()))
    } else {
        EarshotError::Inference(e.to_string())
    }
}

/// Turn non-2xx responses into `EarshotError::Provider`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(EarshotError::Provider {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        EarshotError::Inference(format!("Empty response: {}", reason))
    })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(EarshotError::Inference(format!(
            "Response contained no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

// === Wire types ===

#[derive(Deserialize)]
struct FileEnvelope {
    file: FileResource,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    display_name: Option<String>,
    mime_type: Option<String>,
    state: Option<String>,
    expiration_time: Option<DateTime<Utc>>,
    error: Option<RpcStatus>,
}

#[derive(Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RpcStatus,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}
