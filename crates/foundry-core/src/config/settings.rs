use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capability::{CallOptions, RetryPolicy};
use crate::error::CoreError;
use crate::ledger::{ModelRates, PriceTable};

const APP_DIR: &str = "foundry";
const LEDGER_FILE: &str = "token_usage.json";

/// Settings for every Foundry surface, read from `config.toml`.
///
/// All sections are optional; anything left out takes its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoundryConfig {
    pub models: ModelSettings,
    pub workflow: WorkflowSettings,
    pub calls: CallSettings,
    pub ledger: LedgerSettings,
    /// Per-model overrides merged over the built-in price table.
    pub pricing: BTreeMap<String, ModelRates>,
    pub retrieval: RetrievalSettings,
    pub provider: ProviderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Classifier and chat answers.
    pub chat: String,
    /// Artifact generation.
    pub tools: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            chat: "gpt-4".to_string(),
            tools: "gpt-3.5-turbo".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    pub temperature: f32,
    pub top_k: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_k: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallSettings {
    /// Per-call deadline. `0` disables it.
    pub timeout_secs: u64,
    pub retry: RetrySettings,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub index_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl FoundryConfig {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        let config: Self = toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.workflow.top_k == 0 {
            return Err(CoreError::Config("workflow.top_k must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.workflow.temperature) {
            return Err(CoreError::Config(
                "workflow.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.calls.retry.max_attempts == 0 {
            return Err(CoreError::Config(
                "calls.retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.models.chat.trim().is_empty() || self.models.tools.trim().is_empty() {
            return Err(CoreError::Config("model names must not be empty".into()));
        }
        Ok(())
    }

    /// `<config_dir>/foundry/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    pub fn ledger_path(&self) -> PathBuf {
        if let Some(path) = &self.ledger.path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join(LEDGER_FILE))
            .unwrap_or_else(|| PathBuf::from(LEDGER_FILE))
    }

    pub fn index_path(&self) -> PathBuf {
        if let Some(path) = &self.retrieval.index_path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join("index"))
            .unwrap_or_else(|| PathBuf::from("index"))
    }

    /// Built-in prices with the `[pricing]` overrides applied.
    pub fn pricing_table(&self) -> PriceTable {
        let mut table = PriceTable::default();
        table.merge(&self.pricing);
        table
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.calls.retry.max_attempts.max(1),
            backoff: Duration::from_millis(self.calls.retry.backoff_ms),
        }
    }

    /// Timeout and retry policy for one external call, with a fresh cancel token.
    pub fn call_options(&self) -> CallOptions {
        let options = CallOptions::new().with_retry(self.retry_policy());
        match self.calls.timeout_secs {
            0 => options,
            secs => options.with_timeout(Duration::from_secs(secs)),
        }
    }

    /// Read the provider key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, CoreError> {
        match std::env::var(&self.provider.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CoreError::Config(format!(
                "environment variable {} is not set",
                self.provider.api_key_env
            ))),
        }
    }
}
