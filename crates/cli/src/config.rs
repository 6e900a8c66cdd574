use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// CLI configuration loaded from a TOML file, layered under env config
/// and over built-in defaults. Flags override both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default backend provider ("ollama" or "openai").
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name per provider.
    #[serde(default)]
    pub ollama_model: Option<String>,
    #[serde(default)]
    pub openai_model: Option<String>,

    /// OpenAI-compatible API key (env var wins when set).
    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default)]
    pub openai_base_url: Option<String>,

    /// Path to the transactions CSV.
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            ollama_model: None,
            openai_model: None,
            openai_api_key: None,
            ollama_url: default_ollama_url(),
            openai_base_url: None,
            csv_path: None,
        }
    }
}

impl CliConfig {
    /// Default config file path: ~/.config/spendlens/config.toml
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("spendlens");
        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the given path, or the default path. Missing
    /// file falls back to defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            debug!(?config_path, "Loading config");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))?;
            Ok(config)
        } else {
            debug!(?config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Fold the file-level settings into the env-derived core config.
    /// Precedence: CLI flag > env > file > default.
    pub fn apply_to(&self, config: &mut spendlens_core::Config) {
        if std::env::var("LLM_PROVIDER").is_err() {
            config.llm.provider = self.provider.clone();
        }
        if let (Some(model), true) = (&self.ollama_model, std::env::var("OLLAMA_MODEL").is_err()) {
            config.ollama.model = model.clone();
        }
        if std::env::var("OLLAMA_URL").is_err() {
            config.ollama.url = self.ollama_url.clone();
        }
        if let (Some(model), true) = (&self.openai_model, std::env::var("OPENAI_MODEL").is_err()) {
            config.llm.openai_model = model.clone();
        }
        if config.llm.openai_api_key.is_none() {
            config.llm.openai_api_key = self.openai_api_key.clone();
        }
        if config.llm.openai_base_url.is_none() {
            config.llm.openai_base_url = self.openai_base_url.clone();
        }
        if let (Some(path), true) = (&self.csv_path, std::env::var("SPENDLENS_CSV").is_err()) {
            config.data.csv_path = path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_prefers_ollama() {
        let config = CliConfig::default();
        assert_eq!(config.provider, "ollama");
        assert!(config.ollama_url.contains("11434"));
    }

    #[test]
    fn toml_round_trip() {
        let config = CliConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: CliConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: CliConfig = toml::from_str("provider = \"openai\"").unwrap();
        assert_eq!(parsed.provider, "openai");
        assert_eq!(parsed.ollama_url, default_ollama_url());
    }
}
