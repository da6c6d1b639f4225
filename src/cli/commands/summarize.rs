//! Summarize command - run one local file through the workflow.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::provider::GeminiProcessor;
use crate::workflow::{UploadSummaryWorkflow, WorkflowOptions};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the summarize command.
pub async fn run_summarize(
    file: &str,
    prompt: Option<String>,
    raw: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Summarize, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'earshot doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let path = Settings::expand_path(file);
    if !path.is_file() {
        Output::error(&format!("No such file: {}", path.display()));
        return Err(anyhow::anyhow!("File not found: {}", path.display()));
    }

    let prompt = prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| settings.workflow.default_prompt.clone());

    let processor = Arc::new(GeminiProcessor::from_settings(&settings.provider)?);
    let workflow =
        UploadSummaryWorkflow::new(processor, WorkflowOptions::from(&settings.workflow));

    let spinner = Output::spinner(&format!(
        "Asking {} about {}",
        settings.provider.model,
        display(&path)
    ));
    let outcome = workflow.run(&path, &prompt).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(result) => {
            if raw {
                println!("{}", result.text);
            } else {
                print!("{}", result.html);
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{} ({})", e, e.kind()));
            Err(e.into())
        }
    }
}

fn display(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
