//! TOML configuration for the twin.
//!
//! Every field has a default, so an absent file or a partial file both work.
//! The collaborator API key is not a field: it is read from the
//! environment variable named by `collaborator.api_key_env`.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fact::DEFAULT_FACTS_PATH;

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "reefer-twin.toml";

/// Errors from configuration loading.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(reefer::config::read),
        help("Check that the file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(reefer::config::parse),
        help("The file must be valid TOML: a top-level `facts_path` plus optional [collaborator] and [session] tables.")
    )]
    Parse { path: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwinConfig {
    /// Path of the extracted fact file.
    #[serde(default = "default_facts_path")]
    pub facts_path: PathBuf,
    #[serde(default)]
    pub collaborator: CollaboratorConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Remote chat-completions service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_explain_temperature")]
    pub explain_temperature: f32,
    #[serde(default)]
    pub classify_temperature: f32,
}

/// Question-shell behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Report collaborator transport failures and keep the session alive
    /// instead of ending it.
    #[serde(default)]
    pub recover_collaborator_errors: bool,
}

fn default_facts_path() -> PathBuf {
    PathBuf::from(DEFAULT_FACTS_PATH)
}
fn default_base_url() -> String {
    "https://api.perplexity.ai".into()
}
fn default_model() -> String {
    "sonar-pro".into()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_api_key_env() -> String {
    "PERPLEXITY_API_KEY".into()
}
fn default_explain_temperature() -> f32 {
    0.2
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            facts_path: default_facts_path(),
            collaborator: CollaboratorConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
            explain_temperature: default_explain_temperature(),
            classify_temperature: 0.0,
        }
    }
}

impl TwinConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load `explicit` if given, else [`DEFAULT_CONFIG_FILE`] if it exists,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>) -> ConfigResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
