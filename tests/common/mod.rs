//! Shared test helpers: an in-memory media processor that counts its calls.

#![allow(dead_code)]

use async_trait::async_trait;
use earshot::error::{EarshotError, Result};
use earshot::provider::{
    AssetHandle, AssetUpload, InferenceRequest, MediaProcessor, ProcessingState, UploadedAsset,
};
use earshot::workflow::WorkflowOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How the fake answers inference calls.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Bold Markdown of the uploaded bytes.
    Echo,
    Text(String),
    Fail(String),
    /// Never returns.
    Hang,
}

/// In-memory processor. Every asset walks through `states` one status call at
/// a time; the last state repeats.
pub struct FakeProcessor {
    states: Vec<ProcessingState>,
    reply: Reply,
    fail_delete: bool,
    next_id: AtomicUsize,
    uploads: Mutex<HashMap<String, AssetUpload>>,
    polls: Mutex<HashMap<String, usize>>,
    prompts: Mutex<Vec<String>>,
    submits: AtomicUsize,
    status_checks: AtomicUsize,
    inferences: AtomicUsize,
    deletes: AtomicUsize,
}

impl FakeProcessor {
    pub fn with_states(states: Vec<ProcessingState>) -> Self {
        assert!(!states.is_empty());
        Self {
            states,
            reply: Reply::Echo,
            fail_delete: false,
            next_id: AtomicUsize::new(0),
            uploads: Mutex::new(HashMap::new()),
            polls: Mutex::new(HashMap::new()),
            prompts: Mutex::new(Vec::new()),
            submits: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
            inferences: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Pending, then Processing, for `n` checks in total; Ready after that.
    pub fn ready_after(n: usize) -> Self {
        let mut states: Vec<ProcessingState> = (0..n)
            .map(|i| {
                if i == 0 {
                    ProcessingState::Pending
                } else {
                    ProcessingState::Processing
                }
            })
            .collect();
        states.push(ProcessingState::Ready);
        Self::with_states(states)
    }

    pub fn failing_after(n: usize) -> Self {
        let mut states = vec![ProcessingState::Processing; n];
        states.push(ProcessingState::Failed);
        Self::with_states(states)
    }

    pub fn never_ready() -> Self {
        Self::with_states(vec![ProcessingState::Processing])
    }

    pub fn replying(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn status_checks(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }

    pub fn inferences(&self) -> usize {
        self.inferences.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn external_calls(&self) -> usize {
        self.submits() + self.status_checks() + self.inferences() + self.deletes()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<AssetUpload> {
        self.uploads.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl MediaProcessor for FakeProcessor {
    async fn submit(&self, upload: AssetUpload) -> Result<UploadedAsset> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let name = format!("files/fake-{}", id);

        let asset = UploadedAsset {
            local_path: upload.local_path.clone(),
            handle: AssetHandle {
                name: name.clone(),
                uri: format!("https://fake.test/v1beta/{}", name),
            },
            state: ProcessingState::Pending,
            display_name: upload.display_name.clone(),
            mime_type: upload.mime_type.clone(),
            expires_at: None,
        };

        self.uploads.lock().unwrap().insert(name, upload);
        Ok(asset)
    }

    async fn status(&self, asset: &AssetHandle) -> Result<ProcessingState> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        let mut polls = self.polls.lock().unwrap();
        let count = polls.entry(asset.name.clone()).or_insert(0);
        let state = self.states[(*count).min(self.states.len() - 1)];
        *count += 1;
        Ok(state)
    }

    async fn infer(&self, request: &InferenceRequest<'_>, _timeout: Duration) -> Result<String> {
        self.inferences.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push(request.prompt().to_string());

        match &self.reply {
            Reply::Echo => {
                let uploads = self.uploads.lock().unwrap();
                let upload = uploads
                    .get(&request.asset().handle.name)
                    .ok_or_else(|| EarshotError::Inference("unknown asset".to_string()))?;
                Ok(format!("**{}**", String::from_utf8_lossy(&upload.bytes)))
            }
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(EarshotError::Inference(message.clone())),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn delete(&self, _asset: &AssetHandle) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(EarshotError::Provider {
                status: 500,
                message: "delete failed".to_string(),
            });
        }
        Ok(())
    }
}

/// Timings small enough for tests.
pub fn fast_options() -> WorkflowOptions {
    WorkflowOptions {
        poll_interval: Duration::from_millis(1),
        max_poll_wait: Duration::from_secs(5),
        inference_timeout: Duration::from_secs(5),
    }
}
