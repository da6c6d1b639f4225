//! Pre-flight checks before talking to the provider.
//!
//! Validates that the API key and uploads directory are usable before the
//! server starts accepting requests.

use crate::config::Settings;
use crate::error::{EarshotError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving needs the API key and a writable uploads directory.
    Serve,
    /// A one-off summary only needs the API key.
    Summarize,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Serve => {
            settings.provider.api_key()?;
            check_uploads_dir(settings)?;
        }
        Operation::Summarize => {
            settings.provider.api_key()?;
        }
    }
    Ok(())
}

/// Create the uploads directory and make sure we can write into it.
fn check_uploads_dir(settings: &Settings) -> Result<()> {
    let dir = settings.uploads_dir();
    std::fs::create_dir_all(&dir)?;
    tempfile::tempfile_in(&dir).map_err(|e| {
        EarshotError::Config(format!(
            "Uploads directory {} is not writable: {}",
            dir.display(),
            e
        ))
    })?;
    Ok(())
}
