//! Configuration module for Earshot.
//!
//! Settings are read from a TOML file; every section falls back to defaults.

mod settings;

pub use settings::{
    GeneralSettings, ProviderSettings, ServerSettings, Settings, WorkflowSettings, DEFAULT_PROMPT,
};
