//! Configuration loading from clerk.toml.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Chat model configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// Embedding provider configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index configuration.
    #[serde(default)]
    pub index: IndexConfig,

    /// Storefront configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Chat model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// OpenAI API key. Falls back to the OPENAI_API_KEY environment
    /// variable when unset.
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding output dimension; must match the index collection.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Qdrant base URL.
    #[serde(default = "default_index_url")]
    pub url: String,

    /// Collection holding the product vectors.
    #[serde(default = "default_collection")]
    pub collection: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store host used to derive product and checkout URLs,
    /// e.g. "cool-shoes.myshopify.com".
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_index_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "shop_products".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_key: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_dimension(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            collection: default_collection(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the API key from config or environment.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.model.api_key {
            return Ok(key.clone());
        }
        std::env::var("OPENAI_API_KEY").map_err(|_| ConfigError::MissingApiKey)
    }

    /// Resolve the store host from config or environment.
    pub fn store_base_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.store.base_url {
            return Ok(url.clone());
        }
        std::env::var("SHOPIFY_STORE_URL").map_err(|_| ConfigError::MissingStoreUrl)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("API key not configured: set model.api_key or OPENAI_API_KEY")]
    MissingApiKey,

    #[error("store host not configured: set store.base_url or SHOPIFY_STORE_URL")]
    MissingStoreUrl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gets_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.model.name, "gpt-4o-mini");
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.index.collection, "shop_products");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::parse(
            r#"
            [model]
            name = "gpt-4o"
            api_key = "sk-test"

            [index]
            url = "http://qdrant:6333"
            collection = "catalog"

            [store]
            base_url = "shop.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.api_key().unwrap(), "sk-test");
        assert_eq!(config.index.url, "http://qdrant:6333");
        assert_eq!(config.store_base_url().unwrap(), "shop.example.com");
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(matches!(
            Config::parse("[surprise]\nkey = 1"),
            Err(ConfigError::Parse(_))
        ));
    }
}
