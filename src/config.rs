use crate::error::{RelayError, Result};
use serde::Deserialize;
use std::env;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
}

impl RelayConfig {
    /// Load configuration: from the TOML file named by `RELAY_CONFIG_FILE`
    /// when that is set, otherwise from individual environment variables.
    pub fn load() -> Result<Self> {
        match env::var("RELAY_CONFIG_FILE") {
            Ok(path) => Self::from_file(&path),
            Err(_) => Self::from_env(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let listen_addr =
            env::var("RELAY_LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| RelayError::ConfigError("OPENAI_API_KEY not set".to_string()))?;

        let endpoint = env::var("OPENAI_ENDPOINT")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());

        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        Ok(RelayConfig {
            server: ServerConfig { listen_addr },
            openai: OpenAiConfig {
                api_key,
                endpoint,
                model,
            },
        })
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| RelayError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let mut config: RelayConfig = toml::from_str(&contents)
            .map_err(|e| RelayError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        // Allow environment variables to override file config
        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            config.openai.api_key = api_key;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.openai.api_key.is_empty() {
            return Err(RelayError::ConfigError("API key is empty".to_string()));
        }

        if self.openai.endpoint.is_empty() {
            return Err(RelayError::ConfigError("Endpoint is empty".to_string()));
        }

        if self.openai.model.is_empty() {
            return Err(RelayError::ConfigError("Model is empty".to_string()));
        }

        if self.server.listen_addr.is_empty() {
            return Err(RelayError::ConfigError(
                "Listen address is empty".to_string(),
            ));
        }

        Ok(())
    }
}
