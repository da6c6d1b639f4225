//! Upload-and-summarize workflow.
//!
//! Submits a local audio file to a [`MediaProcessor`], waits for the provider
//! to finish processing it, asks the model about it and renders the answer.
//! The remote asset is deleted on every exit path once it exists.

use crate::config::WorkflowSettings;
use crate::error::{EarshotError, Result};
use crate::provider::{
    audio_mime_type, AssetHandle, AssetUpload, InferenceRequest, MediaProcessor, ProcessingState,
    UploadedAsset,
};
use crate::render::markdown_to_html;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Timing bounds for one workflow run.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowOptions {
    /// Delay between status checks.
    pub poll_interval: Duration,
    /// Longest time to wait for the asset to become ready.
    pub max_poll_wait: Duration,
    /// Timeout for the inference call.
    pub inference_timeout: Duration,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self::from(&WorkflowSettings::default())
    }
}

impl From<&WorkflowSettings> for WorkflowOptions {
    fn from(settings: &WorkflowSettings) -> Self {
        Self {
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            max_poll_wait: Duration::from_secs(settings.max_poll_wait_secs),
            inference_timeout: Duration::from_secs(settings.inference_timeout_secs),
        }
    }
}

/// Model answer plus its HTML rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceResult {
    pub text: String,
    pub html: String,
}

impl InferenceResult {
    pub fn from_text(text: String) -> Self {
        let html = markdown_to_html(&text);
        Self { text, html }
    }
}

/// Runs submit → poll → infer → cleanup against a provider.
pub struct UploadSummaryWorkflow {
    processor: Arc<dyn MediaProcessor>,
    options: WorkflowOptions,
}

impl UploadSummaryWorkflow {
    pub fn new(processor: Arc<dyn MediaProcessor>, options: WorkflowOptions) -> Self {
        Self { processor, options }
    }

    /// Run the workflow for one local file.
    #[instrument(skip(self, local_path, prompt), fields(path = %local_path.display()))]
    pub async fn run(&self, local_path: &Path, prompt: &str) -> Result<InferenceResult> {
        let bytes = tokio::fs::read(local_path).await?;
        let display_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();

        info!("Uploading {} ({} bytes)", display_name, bytes.len());
        let mut asset = self
            .processor
            .submit(AssetUpload {
                local_path: local_path.to_path_buf(),
                display_name,
                mime_type: audio_mime_type(local_path).to_string(),
                bytes,
            })
            .await?;
        info!(name = %asset.handle.name, uri = %asset.handle.uri, "Upload complete");

        // Armed until the delete below has run. If this future is dropped
        // first, the guard spawns the delete instead.
        let cleanup = RemoteCleanup::new(self.processor.clone(), asset.handle.clone());

        let outcome = self.process(&mut asset, prompt).await;
        cleanup.run().await;

        let text = outcome?;
        Ok(InferenceResult::from_text(text))
    }

    async fn process(&self, asset: &mut UploadedAsset, prompt: &str) -> Result<String> {
        self.wait_until_ready(asset).await?;
        let request = InferenceRequest::new(prompt, asset)?;
        self.infer(&request).await
    }

    /// Poll until the asset is ready, failed, or the wait bound is exceeded.
    ///
    /// The state returned by submit is not trusted; at least one status check
    /// is always made.
    #[instrument(skip(self, asset), fields(name = %asset.handle.name))]
    async fn wait_until_ready(&self, asset: &mut UploadedAsset) -> Result<()> {
        let started = Instant::now();
        let mut checks: u32 = 0;

        loop {
            asset.state = self.processor.status(&asset.handle).await?;
            checks += 1;
            debug!(state = %asset.state, checks, "Polled asset state");

            match asset.state {
                ProcessingState::Ready => {
                    info!("Asset '{}' ready after {} checks", asset.display_name, checks);
                    return Ok(());
                }
                ProcessingState::Failed => {
                    return Err(EarshotError::ProcessingFailed {
                        asset: asset.handle.name.clone(),
                        state: asset.state.to_string(),
                    });
                }
                ProcessingState::Pending | ProcessingState::Processing => {}
            }

            if started.elapsed() + self.options.poll_interval > self.options.max_poll_wait {
                return Err(EarshotError::Timeout(format!(
                    "Asset {} still {} after {} checks ({}s)",
                    asset.handle.name,
                    asset.state,
                    checks,
                    started.elapsed().as_secs()
                )));
            }

            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    async fn infer(&self, request: &InferenceRequest<'_>) -> Result<String> {
        info!("Making inference request");
        let timeout = self.options.inference_timeout;

        match tokio::time::timeout(timeout, self.processor.infer(request, timeout)).await {
            Ok(Ok(text)) => {
                debug!(chars = text.len(), "Inference complete");
                Ok(text)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(EarshotError::Timeout(format!(
                "Inference exceeded {}s",
                timeout.as_secs()
            ))),
        }
    }

}

/// Deletes a remote asset exactly once, on completion or on drop.
struct RemoteCleanup {
    processor: Arc<dyn MediaProcessor>,
    handle: Option<AssetHandle>,
}

impl RemoteCleanup {
    fn new(processor: Arc<dyn MediaProcessor>, handle: AssetHandle) -> Self {
        Self {
            processor,
            handle: Some(handle),
        }
    }

    async fn run(mut self) {
        if let Some(handle) = self.handle.take() {
            delete_remote(self.processor.as_ref(), &handle).await;
        }
    }
}

impl Drop for RemoteCleanup {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!(
                    name = %handle.name,
                    "Workflow cancelled, deleting remote asset in background"
                );
                let processor = self.processor.clone();
                runtime.spawn(async move {
                    delete_remote(processor.as_ref(), &handle).await;
                });
            }
            Err(_) => warn!(name = %handle.name, "No runtime left to delete remote asset"),
        }
    }
}

/// Delete the remote asset. Failures are logged, never propagated.
async fn delete_remote(processor: &dyn MediaProcessor, handle: &AssetHandle) {
    debug!(name = %handle.name, "Deleting remote asset");
    match processor.delete(handle).await {
        Ok(()) => info!(name = %handle.name, "Deleted remote asset"),
        Err(e) => warn!(name = %handle.name, "Failed to delete remote asset: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_settings() {
        let settings = WorkflowSettings {
            poll_interval_secs: 3,
            max_poll_wait_secs: 30,
            inference_timeout_secs: 90,
            ..WorkflowSettings::default()
        };

        let options = WorkflowOptions::from(&settings);
        assert_eq!(options.poll_interval, Duration::from_secs(3));
        assert_eq!(options.max_poll_wait, Duration::from_secs(30));
        assert_eq!(options.inference_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_result_renders_html() {
        let result = InferenceResult::from_text("*Feeling Good*".to_string());
        assert_eq!(result.text, "*Feeling Good*");
        assert_eq!(result.html, "<p><em>Feeling Good</em></p>\n");
    }
}
