// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy configuration: target host, optional agent bootstrap, timings.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var carrying inline PEM key material; overrides `target.key_file`.
/// Read once at config load, never from anywhere else.
pub const DEPLOY_KEY_ENV: &str = "DEPLOY_KEY";

/// Error loading or validating a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where deploys go and how to authenticate.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub host: String,
    pub user: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_forward_agent")]
    pub forward_agent: bool,
    /// PEM private key file; the operator passphrase decrypts it.
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    /// Inline PEM resolved at load time from `key_file` or `DEPLOY_KEY`.
    #[serde(skip)]
    pub key_data: Option<String>,
}

/// Local credential agent bootstrap. Presence of this table is the
/// production execution mode: deploys spawn the helper and forward its agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Helper program; receives the passphrase as its only argument.
    pub helper: PathBuf,
    /// Socket path the helper exposes once ready (may be a symlink).
    pub socket: PathBuf,
    #[serde(default = "default_agent_timeout_ms")]
    pub startup_timeout_ms: u64,
    #[serde(default = "default_agent_poll_ms")]
    pub poll_ms: u64,
}

impl AgentConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Pacing knobs for the session's cooperative waits.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Pause after job start so a just-attached subscriber sees the prompt.
    #[serde(default = "default_grace_ms")]
    pub subscriber_grace_ms: u64,
    /// Mailbox poll cadence while waiting for the passphrase.
    #[serde(default = "default_input_poll_ms")]
    pub input_poll_ms: u64,
    /// Executor tick cadence while a command runs.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl TimingConfig {
    pub fn subscriber_grace(&self) -> Duration {
        Duration::from_millis(self.subscriber_grace_ms)
    }

    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            subscriber_grace_ms: default_grace_ms(),
            input_poll_ms: default_input_poll_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_port() -> u16 {
    sw_exec::DEFAULT_PORT
}

fn default_forward_agent() -> bool {
    true
}

fn default_agent_timeout_ms() -> u64 {
    5_000
}

fn default_agent_poll_ms() -> u64 {
    100
}

fn default_grace_ms() -> u64 {
    1_500
}

fn default_input_poll_ms() -> u64 {
    250
}

fn default_tick_ms() -> u64 {
    100
}

/// Deploy engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    pub target: TargetConfig,
    #[serde(default)]
    pub agent: Option<AgentConfig>,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl DeployConfig {
    /// Read, parse, validate, and resolve key material.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        let key = config.target.resolve_key(std::env::var(DEPLOY_KEY_ENV).ok())?;
        config.target.key_data = key;
        Ok(config)
    }

    /// Parse and validate, without touching the filesystem or environment.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.target.host.trim().is_empty() {
            return Err(ConfigError::Invalid("target.host must not be empty".into()));
        }
        if self.target.user.trim().is_empty() {
            return Err(ConfigError::Invalid("target.user must not be empty".into()));
        }
        if self.target.port == 0 {
            return Err(ConfigError::Invalid("target.port must not be zero".into()));
        }
        if let Some(agent) = &self.agent {
            if agent.startup_timeout_ms == 0 {
                return Err(ConfigError::Invalid(
                    "agent.startup_timeout_ms must not be zero".into(),
                ));
            }
            if agent.poll_ms == 0 {
                return Err(ConfigError::Invalid("agent.poll_ms must not be zero".into()));
            }
        }
        Ok(())
    }
}

impl TargetConfig {
    /// Inline env key wins over `key_file`; neither means passphrase auth.
    fn resolve_key(&self, env_key: Option<String>) -> Result<Option<String>, ConfigError> {
        if let Some(pem) = env_key.filter(|v| !v.is_empty()) {
            return Ok(Some(pem));
        }
        match &self.key_file {
            Some(path) => std::fs::read_to_string(path)
                .map(Some)
                .map_err(|source| ConfigError::KeyFile {
                    path: path.clone(),
                    source,
                }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
