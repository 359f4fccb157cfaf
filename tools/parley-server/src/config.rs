// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Server configuration file.
//!
//! ```toml
//! bind = "0.0.0.0"
//! port = 8080
//! log_level = "info"
//! auth_token = "secret"
//!
//! [app]
//! name = "notes"
//! route_prefix = "/rpc"
//! key_casing = "camel"
//! ```

use parley::AppOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<parley::ConfigError> for ServerConfigError {
    fn from(err: parley::ConfigError) -> Self {
        match err {
            parley::ConfigError::Io(e) => Self::Io(e),
            parley::ConfigError::Toml(e) => Self::Toml(e),
            parley::ConfigError::Invalid(msg) => Self::Invalid(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Tracing filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Bearer token required by every `notes.*` procedure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub app: AppOptions,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            log_level: default_log_level(),
            auth_token: None,
            app: AppOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ServerConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ServerConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ServerConfigError::Invalid("Bind address is empty".into()));
        }
        if matches!(self.auth_token.as_deref(), Some(token) if token.trim().is_empty()) {
            return Err(ServerConfigError::Invalid("auth_token is empty".into()));
        }
        self.app.validate()?;
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley::KeyCasing;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert!(config.auth_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
port = 9000
auth_token = "secret"

[app]
name = "notes"
route_prefix = "/rpc"
key_casing = "snake"
"#
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.app.name, "notes");
        assert_eq!(config.app.route_prefix, "/rpc");
        assert_eq!(config.app.key_casing, KeyCasing::Snake);
    }

    #[test]
    fn test_invalid_app_section() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[app]\nroute_prefix = \"rpc/\"").unwrap();
        let err = ServerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ServerConfigError::Invalid(_)));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = ServerConfig {
            auth_token: Some("t".into()),
            ..ServerConfig::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let back: ServerConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
