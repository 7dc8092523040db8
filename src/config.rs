//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SesameResult;

/// Configuration for a Sesame connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header
    pub user_agent: String,
    /// Fetch the protocol version and repository list when connecting
    pub query_server_information: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("sesame/{}", crate::VERSION),
            query_server_information: false,
        }
    }
}

impl ClientConfig {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> SesameResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> SesameResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}
