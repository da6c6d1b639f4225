//! Generative-media provider abstraction.
//!
//! A provider accepts an uploaded file, processes it asynchronously on its
//! side, answers prompts about it once it is ready, and deletes it on request.

mod gemini;

pub use gemini::GeminiProcessor;

use crate::error::{EarshotError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Provider-side lifecycle of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Pending,
    Processing,
    Ready,
    Failed,
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingState::Pending => write!(f, "PENDING"),
            ProcessingState::Processing => write!(f, "PROCESSING"),
            ProcessingState::Ready => write!(f, "READY"),
            ProcessingState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Remote identifiers of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    /// Resource name used for status and delete calls (e.g. `files/abc123`).
    pub name: String,
    /// URI referenced from inference requests.
    pub uri: String,
}

/// A local file handed to the provider.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub local_path: PathBuf,
    pub handle: AssetHandle,
    pub state: ProcessingState,
    pub display_name: String,
    pub mime_type: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Bytes to submit, plus what the provider needs to know about them.
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub local_path: PathBuf,
    pub display_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// A prompt paired with an asset the provider has finished processing.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    prompt: &'a str,
    asset: &'a UploadedAsset,
}

impl<'a> InferenceRequest<'a> {
    /// Pair a prompt with an asset. The asset must be ready.
    pub fn new(prompt: &'a str, asset: &'a UploadedAsset) -> Result<Self> {
        if asset.state != ProcessingState::Ready {
            return Err(EarshotError::Unknown(format!(
                "Asset {} is {}, not ready for inference",
                asset.handle.name, asset.state
            )));
        }
        Ok(Self { prompt, asset })
    }

    pub fn prompt(&self) -> &'a str {
        self.prompt
    }

    pub fn asset(&self) -> &'a UploadedAsset {
        self.asset
    }
}

/// Trait for generative-media providers.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Upload a file and return the provider's record of it.
    async fn submit(&self, upload: AssetUpload) -> Result<UploadedAsset>;

    /// Fetch the current processing state of an asset.
    async fn status(&self, asset: &AssetHandle) -> Result<ProcessingState>;

    /// Ask the model about a ready asset.
    async fn infer(&self, request: &InferenceRequest<'_>, timeout: Duration) -> Result<String>;

    /// Delete the asset on the provider side.
    async fn delete(&self, asset: &AssetHandle) -> Result<()>;
}

/// Guess an audio MIME type from a file extension.
///
/// Unknown or missing extensions are treated as WAV.
pub fn audio_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp3") => "audio/mp3",
        Some("aif") | Some("aiff") => "audio/aiff",
        Some("aac") => "audio/aac",
        Some("ogg") | Some("oga") | Some("opus") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        Some("m4a") | Some("mp4") => "audio/mp4",
        _ => "audio/wav",
    }
}
