//! Configuration settings for Earshot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Prompt used when the client does not send `customInput`.
pub const DEFAULT_PROMPT: &str = "Please provide the singer's name and song title.";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub workflow: WorkflowSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where incoming uploads are staged.
    pub uploads_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            uploads_dir: "uploads".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Optional HTML file served at `/` instead of the built-in page.
    pub index_path: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_bytes: 64 * 1024 * 1024,
            index_path: None,
        }
    }
}

/// Generative-media provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the Gemini API.
    pub base_url: String,
    /// Model used for inference.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Timeout for upload, status and delete calls (seconds).
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "API_KEY".to_string(),
            request_timeout_secs: 300,
        }
    }
}

impl ProviderSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> crate::error::Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(crate::error::EarshotError::Config(format!(
                "{} is empty. Set it with: export {}='...'",
                self.api_key_env, self.api_key_env
            ))),
            Err(_) => Err(crate::error::EarshotError::Config(format!(
                "{} not set. Set it with: export {}='...'",
                self.api_key_env, self.api_key_env
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Upload/poll/infer workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Delay between status checks (seconds).
    pub poll_interval_secs: u64,
    /// Give up waiting for the provider after this long (seconds).
    pub max_poll_wait_secs: u64,
    /// Timeout for the inference call (seconds).
    pub inference_timeout_secs: u64,
    /// Prompt used when the request carries none.
    pub default_prompt: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            max_poll_wait_secs: 600,
            inference_timeout_secs: 600,
            default_prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("earshot")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded uploads directory path.
    pub fn uploads_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.uploads_dir)
    }

    /// Get the expanded landing page override, if any.
    pub fn index_path(&self) -> Option<PathBuf> {
        self.server.index_path.as_deref().map(Self::expand_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.general.uploads_dir, "uploads");
        assert_eq!(settings.provider.api_key_env, "API_KEY");
        assert_eq!(settings.workflow.poll_interval_secs, 10);
        assert_eq!(settings.workflow.inference_timeout_secs, 600);
        assert_eq!(settings.workflow.default_prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            port = 8080

            [workflow]
            poll_interval_secs = 2
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.workflow.poll_interval_secs, 2);
        assert_eq!(settings.workflow.max_poll_wait_secs, 600);
        assert_eq!(settings.provider.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn test_missing_api_key() {
        let provider = ProviderSettings {
            api_key_env: "EARSHOT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ProviderSettings::default()
        };
        let err = provider.api_key().unwrap_err();
        assert!(err.to_string().contains("not set"));
    }
}
