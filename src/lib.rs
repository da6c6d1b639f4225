//! Earshot - ask a generative model about an audio clip
//!
//! Accepts an audio upload, hands it to a generative-media provider, waits
//! for the provider to finish processing it, asks the model a question about
//! it and returns the answer rendered as HTML.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `provider` - Provider abstraction and the Gemini client
//! - `workflow` - Submit, poll, infer and clean up for one file
//! - `render` - Markdown to HTML
//! - `server` - HTTP routes (`GET /`, `POST /upload`)
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use earshot::config::Settings;
//! use earshot::provider::GeminiProcessor;
//! use earshot::workflow::{UploadSummaryWorkflow, WorkflowOptions};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let processor = Arc::new(GeminiProcessor::from_settings(&settings.provider)?);
//!     let workflow =
//!         UploadSummaryWorkflow::new(processor, WorkflowOptions::from(&settings.workflow));
//!
//!     let result = workflow
//!         .run(Path::new("clip.wav"), &settings.workflow.default_prompt)
//!         .await?;
//!     println!("{}", result.html);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod render;
pub mod server;
pub mod workflow;

pub use error::{EarshotError, Result};
