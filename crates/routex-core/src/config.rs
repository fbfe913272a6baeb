use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// What dispatch does with a path longer than `max_path_len`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OversizedPathPolicy {
    /// Dispatch it as `/`.
    #[default]
    Root,
    /// Dispatch it as `NotFound`, skipping the fallback.
    Reject,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RouterConfig {
    /// Array-mode entry count above which the router migrates to the trie.
    pub migration_threshold: usize,
    pub hot_cache_capacity: usize,
    /// Longest path (bytes) the hot-path cache will store.
    pub hot_cache_max_key_len: usize,
    pub hash_buckets: usize,
    pub initial_node_capacity: usize,
    pub max_nodes: usize,
    pub max_path_len: usize,
    pub max_params: usize,
    pub oversized_path: OversizedPathPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            migration_threshold: 16,
            hot_cache_capacity: routex_dsa::hot_cache::DEFAULT_CAPACITY,
            hot_cache_max_key_len: 64,
            hash_buckets: routex_dsa::bucket::DEFAULT_BUCKETS,
            initial_node_capacity: 64,
            max_nodes: u32::MAX as usize - 1,
            max_path_len: 1024,
            max_params: 16,
            oversized_path: OversizedPathPolicy::Root,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Worker threads, each with its own router. Zero means one per CPU.
    pub threads: usize,
    pub pin_cores: bool,
    /// Upper bound on the request line plus headers, in bytes.
    pub max_request_line: usize,
    pub router: RouterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            threads: 2,
            pin_cores: false,
            max_request_line: 8192,
            router: RouterConfig::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// `host:port` as a socket address string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
