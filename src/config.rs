use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_search_url")]
    pub search_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_log_level() -> String { "info".to_string() }
fn default_gamma_url() -> String { "https://gamma-api.polymarket.com".to_string() }
fn default_ollama_url() -> String { "http://127.0.0.1:11434".to_string() }
fn default_search_url() -> String { "http://127.0.0.1:5001".to_string() }
fn default_model() -> String { "gpt-oss:120b-cloud".to_string() }
fn default_request_timeout() -> u64 { 120 }
fn default_true() -> bool { true }
fn default_max_results() -> usize { 3 }
fn default_cache_ttl() -> u64 { 300 }

impl Default for SystemConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            ollama_url: default_ollama_url(),
            search_url: default_search_url(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_results: default_max_results(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

/// Endpoint overrides read from the environment (and `.env`).
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub polymarket_gamma_url: Option<String>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
    pub search_url: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Fold environment overrides into the file config.
    pub fn apply_env(mut self, env: EnvConfig) -> Self {
        if let Some(url) = env.polymarket_gamma_url {
            self.endpoints.gamma_url = url;
        }
        if let Some(url) = env.ollama_url {
            self.endpoints.ollama_url = url;
        }
        if let Some(model) = env.ollama_model {
            self.llm.model = model;
        }
        if let Some(url) = env.search_url {
            self.endpoints.search_url = url;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.context.cache_ttl_secs)
    }
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            polymarket_gamma_url: std::env::var("POLYMARKET_GAMMA_URL").ok(),
            ollama_url: std::env::var("OLLAMA_URL").ok(),
            ollama_model: std::env::var("OLLAMA_MODEL").ok(),
            search_url: std::env::var("SEARCH_URL").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.system.log_level, "info");
        assert_eq!(config.endpoints.gamma_url, "https://gamma-api.polymarket.com");
        assert_eq!(config.endpoints.ollama_url, "http://127.0.0.1:11434");
        assert_eq!(config.llm.model, "gpt-oss:120b-cloud");
        assert!(config.context.enabled);
        assert_eq!(config.context.max_results, 3);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [llm]
            model = "llama3"

            [context]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.request_timeout_secs, 120);
        assert!(!config.context.enabled);
        assert_eq!(config.context.cache_ttl_secs, 300);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().apply_env(EnvConfig {
            ollama_url: Some("http://gpu-box:11434".to_string()),
            ollama_model: Some("mistral".to_string()),
            ..EnvConfig::default()
        });

        assert_eq!(config.endpoints.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.endpoints.gamma_url, "https://gamma-api.polymarket.com");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::parse("[llm\nmodel = 1").is_err());
    }
}
