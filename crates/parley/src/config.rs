// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Application configuration.
//!
//! Supports both programmatic and file-based configuration.

use crate::casing::KeyCasing;
use crate::codec::{CodecOptions, DEFAULT_MAX_DEPTH};
use crate::rpc::{AppInfo, HttpMethod};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppOptions {
    /// Application name (schema title).
    #[serde(default = "default_name")]
    pub name: String,

    /// Application version (schema info).
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: String,

    /// Prepended to every procedure path. Empty, or `/segment[/...]`.
    #[serde(default)]
    pub route_prefix: String,

    /// Casing of property names on the wire.
    #[serde(default)]
    pub key_casing: KeyCasing,

    /// Maximum container nesting accepted when decoding.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Method for procedures that do not set one.
    #[serde(default)]
    pub default_method: HttpMethod,

    /// Event-stream keep-alive interval (seconds).
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    /// Schema route, relative to the prefix. Empty disables it.
    #[serde(default = "default_definition_path")]
    pub definition_path: String,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_name() -> String {
    "parley".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_ping_interval() -> u64 {
    10
}

fn default_definition_path() -> String {
    "/__definition".to_string()
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            description: String::new(),
            route_prefix: String::new(),
            key_casing: KeyCasing::default(),
            max_depth: default_max_depth(),
            default_method: HttpMethod::default(),
            ping_interval_secs: default_ping_interval(),
            definition_path: default_definition_path(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl AppOptions {
    /// Load options from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate options from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Set the route prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into();
        self
    }

    /// Set the key casing.
    pub fn casing(mut self, casing: KeyCasing) -> Self {
        self.key_casing = casing;
        self
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("Application name is empty".into()));
        }
        if !self.route_prefix.is_empty()
            && (!self.route_prefix.starts_with('/') || self.route_prefix.ends_with('/'))
        {
            return Err(ConfigError::Invalid(format!(
                "Route prefix {:?} must start with '/' and not end with '/'",
                self.route_prefix
            )));
        }
        if !self.definition_path.is_empty() && !self.definition_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "Definition path {:?} must start with '/'",
                self.definition_path
            )));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        if self.ping_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "ping_interval_secs must be at least 1".into(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must be at least 1".into()));
        }
        Ok(())
    }

    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            key_casing: self.key_casing,
            max_depth: self.max_depth,
        }
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn info(&self) -> AppInfo {
        AppInfo {
            title: self.name.clone(),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            version: self.version.clone(),
        }
    }
}
