/*
[INPUT]:  YAML configuration file, command-line overrides
[OUTPUT]: Validated runner configuration and adapter client configs
[POS]:    Configuration layer - client setup
[UPDATE]: When adding new configuration options
*/

use std::time::Duration;

use anyhow::{Context, Result, ensure};
use hyphe_adapter::{ClientConfig, Environment, WsConfig};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the runner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// API key; `--api-key` and `HYPHE_API_KEY` take precedence
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub environment: Environment,
    /// Log every REST response body at debug level
    #[serde(default)]
    pub log_responses: bool,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Deadline for one snapshot fetch
    #[serde(default = "default_ws_timeout_secs")]
    pub ws_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            environment: Environment::default(),
            log_responses: false,
            http_timeout_secs: default_http_timeout_secs(),
            ws_timeout_secs: default_ws_timeout_secs(),
        }
    }
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_ws_timeout_secs() -> u64 {
    30
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse yaml config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.http_timeout_secs > 0, "http_timeout_secs must be positive");
        ensure!(self.ws_timeout_secs > 0, "ws_timeout_secs must be positive");
        Ok(())
    }

    /// Apply flag/env overrides; an empty key counts as absent
    pub fn apply_overrides(&mut self, api_key: Option<String>, sandbox: bool) {
        if let Some(key) = api_key.filter(|key| !key.is_empty()) {
            self.api_key = Some(key);
        }
        if sandbox {
            self.environment = Environment::Sandbox;
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.http_timeout_secs),
            environment: self.environment,
            log_responses: self.log_responses,
            ..ClientConfig::default()
        }
    }

    pub fn ws_config(&self) -> WsConfig {
        WsConfig {
            timeout: Duration::from_secs(self.ws_timeout_secs),
            ..WsConfig::for_environment(self.environment)
        }
    }
}
