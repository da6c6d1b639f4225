//! HTTP client construction.

use crate::error::Result;
use std::time::Duration;

/// Create an HTTP client with a default request timeout.
///
/// Individual requests may override the timeout (inference does).
pub fn create_client_with_timeout(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("earshot/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
