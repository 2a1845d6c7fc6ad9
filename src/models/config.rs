//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where the word store lives
    #[serde(default)]
    pub store: StoreConfig,

    /// Text-generation service settings (shared by generator and verifier)
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Retry and concurrency policy for generation runs
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Remote system-of-record settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration if the file exists; a missing file is `None`.
    pub fn load_if_exists(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Resolve the store path against the data directory.
    pub fn store_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.store.path)
    }

    /// Merge secrets and repository settings from environment variables.
    ///
    /// Recognized keys: `OPENAI_API_KEY`, `GITHUB_TOKEN`, `GITHUB_REPO`,
    /// `GENERATE_SECRET`. Empty values are ignored.
    pub fn apply_env<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let value: String = value.into();
            if value.trim().is_empty() {
                continue;
            }
            match key.as_ref() {
                "OPENAI_API_KEY" => self.generator.api_key = Some(value),
                "GITHUB_TOKEN" => self.remote.token = Some(value),
                "GITHUB_REPO" => self.remote.repo = Some(value),
                "GENERATE_SECRET" => self.remote.secret = Some(value),
                _ => {}
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.store.path.as_os_str().is_empty() {
            return Err(AppError::config("store.path is empty"));
        }
        if self.generator.base_url.trim().is_empty() {
            return Err(AppError::config("generator.base_url is empty"));
        }
        if self.generator.model.trim().is_empty() {
            return Err(AppError::config("generator.model is empty"));
        }
        if self.generator.timeout_secs == 0 {
            return Err(AppError::config("generator.timeout_secs must be > 0"));
        }
        self.pipeline.validate()
    }
}

/// Word store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store file, relative to the data directory
    #[serde(default = "defaults::store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
        }
    }
}

/// OpenAI-compatible chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// API root, without the `/chat/completions` suffix
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Model name used for both generation and verification
    #[serde(default = "defaults::model")]
    pub model: String,

    /// Language the words are drawn from
    #[serde(default = "defaults::language")]
    pub language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// API key; normally supplied through `OPENAI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl GeneratorConfig {
    /// The API key, or a configuration error if none was supplied.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::config("OPENAI_API_KEY is not set. Set it in .env or the environment.")
            })
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            model: defaults::model(),
            language: defaults::language(),
            timeout_secs: defaults::timeout(),
            api_key: None,
        }
    }
}

/// Retry policy of the generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Generator/verifier attempts per target date
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Duplicate candidates tolerated per target date
    #[serde(default = "defaults::max_duplicates")]
    pub max_duplicates: u32,

    /// Concurrent verifier calls in batch mode
    #[serde(default = "defaults::verify_concurrency")]
    pub verify_concurrency: usize,
}

impl PipelineConfig {
    /// Every bound must allow at least one call.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(AppError::config("pipeline.max_retries must be > 0"));
        }
        if self.max_duplicates == 0 {
            return Err(AppError::config("pipeline.max_duplicates must be > 0"));
        }
        if self.verify_concurrency == 0 {
            return Err(AppError::config("pipeline.verify_concurrency must be > 0"));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            max_duplicates: defaults::max_duplicates(),
            verify_concurrency: defaults::verify_concurrency(),
        }
    }
}

/// GitHub contents API target for remote commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// `owner/name` repository
    #[serde(default)]
    pub repo: Option<String>,

    /// Path of the words file inside the repository
    #[serde(default = "defaults::remote_path")]
    pub path: String,

    /// Branch to commit to; repository default when unset
    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Shared secret callers must present
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
}

impl RemoteConfig {
    /// Repository and token, or a configuration error naming what is missing.
    pub fn require_credentials(&self) -> Result<(&str, &str)> {
        match (self.repo.as_deref(), self.token.as_deref()) {
            (Some(repo), Some(token)) => Ok((repo, token)),
            _ => Err(AppError::config("GITHUB_TOKEN or GITHUB_REPO is not configured")),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            repo: None,
            path: defaults::remote_path(),
            branch: None,
            token: None,
            secret: None,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Store defaults
    pub fn store_path() -> PathBuf {
        PathBuf::from("words.json")
    }

    // Generator defaults
    pub fn base_url() -> String {
        "https://api.openai.com/v1".into()
    }
    pub fn model() -> String {
        "gpt-4o-mini".into()
    }
    pub fn language() -> String {
        "Dutch".into()
    }
    pub fn timeout() -> u64 {
        60
    }

    // Pipeline defaults
    pub fn max_retries() -> u32 {
        3
    }
    pub fn max_duplicates() -> u32 {
        10
    }
    pub fn verify_concurrency() -> usize {
        4
    }

    // Remote defaults
    pub fn api_base() -> String {
        "https://api.github.com".into()
    }
    pub fn remote_path() -> String {
        "src/data/words.json".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_retries() {
        let mut config = Config::default();
        config.pipeline.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn pipeline_bounds_are_config_errors() {
        let policy = PipelineConfig {
            verify_concurrency: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(policy.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn load_if_exists_missing_and_present() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        assert!(Config::load_if_exists(&path).unwrap().is_none());

        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();
        let config = Config::load_if_exists(&path).unwrap().unwrap();
        assert_eq!(config.logging.level, "debug");

        std::fs::write(&path, "[logging\n").unwrap();
        assert!(matches!(Config::load_if_exists(&path), Err(AppError::Toml(_))));
    }

    #[test]
    fn validate_rejects_empty_model() {
        let mut config = Config::default();
        config.generator.model = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            max_retries = 5

            [generator]
            language = "Flemish"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.max_retries, 5);
        assert_eq!(config.pipeline.max_duplicates, 10);
        assert_eq!(config.generator.language, "Flemish");
        assert_eq!(config.generator.model, "gpt-4o-mini");
        assert_eq!(config.store.path, PathBuf::from("words.json"));
    }

    #[test]
    fn apply_env_sets_secrets_and_skips_blank_values() {
        let mut config = Config::default();
        config.apply_env([
            ("OPENAI_API_KEY", "sk-test"),
            ("GITHUB_REPO", "someone/words"),
            ("GITHUB_TOKEN", ""),
            ("UNRELATED", "x"),
        ]);

        assert_eq!(config.generator.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.remote.repo.as_deref(), Some("someone/words"));
        assert!(config.remote.token.is_none());
        assert!(config.remote.require_credentials().is_err());
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let config = Config::default();
        assert!(matches!(
            config.generator.require_api_key(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn store_path_is_relative_to_data_dir() {
        let config = Config::default();
        assert_eq!(
            config.store_path(Path::new("data")),
            PathBuf::from("data/words.json")
        );
    }
}
