// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Procedure descriptors and route derivation.

use super::error::RegistrationError;
use crate::casing::to_kebab;
use axum::http::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// HTTP method a procedure is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }

    pub fn to_http(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-procedure registration options.
///
/// ```
/// use parley::rpc::{HttpMethod, RpcOptions};
///
/// let options = RpcOptions::new()
///     .method(HttpMethod::Get)
///     .description("Fetch one note");
/// assert_eq!(options.method, Some(HttpMethod::Get));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcOptions {
    /// Falls back to the app's default method.
    pub method: Option<HttpMethod>,
    /// Overrides the derived path; the route prefix is still prepended.
    pub path: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
}

impl RpcOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// Registered procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureDef {
    /// Dot-separated name, e.g. `users.getUser`.
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    /// Definition name of the params record, if any.
    pub params: Option<String>,
    /// Definition name of the response (or event) record, if any.
    pub response: Option<String>,
    pub event_stream: bool,
    pub description: Option<String>,
    pub deprecated: bool,
}

impl ProcedureDef {
    pub fn new(name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            params: None,
            response: None,
            event_stream: false,
            description: None,
            deprecated: false,
        }
    }

    /// Schema entry for this procedure.
    pub fn to_schema(&self) -> serde_json::Value {
        let mut entry = json!({
            "transport": "http",
            "path": self.path,
            "method": self.method.as_str(),
        });
        if let Some(params) = &self.params {
            entry["params"] = json!(params);
        }
        if let Some(response) = &self.response {
            entry["response"] = json!(response);
        }
        entry["isEventStream"] = json!(self.event_stream);
        entry["isDeprecated"] = json!(self.deprecated);
        if let Some(description) = &self.description {
            entry["description"] = json!(description);
        }
        entry
    }
}

/// Check a procedure name: dot-separated identifiers.
pub fn validate_name(name: &str) -> Result<(), RegistrationError> {
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            segment
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(RegistrationError::InvalidName(name.to_string()))
    }
}

/// Route path of a procedure.
///
/// Derived as `prefix/<service>/<method>` with every name segment in
/// kebab case (`users.getUser` -> `/users/get-user`), or `prefix + path`
/// when an override is given.
pub fn procedure_path(
    prefix: &str,
    name: &str,
    override_path: Option<&str>,
) -> Result<String, RegistrationError> {
    validate_name(name)?;
    if let Some(path) = override_path {
        if !path.starts_with('/') {
            return Err(RegistrationError::InvalidPath(path.to_string()));
        }
        return Ok(format!("{prefix}{path}"));
    }
    let mut path = prefix.to_string();
    for segment in name.split('.') {
        path.push('/');
        path.push_str(&to_kebab(segment));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        assert_eq!(
            procedure_path("", "users.getUser", None).expect("path"),
            "/users/get-user"
        );
        assert_eq!(
            procedure_path("/rpc", "adminTools.users.resetPassword", None).expect("path"),
            "/rpc/admin-tools/users/reset-password"
        );
        assert_eq!(procedure_path("", "ping", None).expect("path"), "/ping");
    }

    #[test]
    fn test_override_path_keeps_prefix() {
        assert_eq!(
            procedure_path("/api", "users.getUser", Some("/u/get")).expect("path"),
            "/api/u/get"
        );
        assert_eq!(
            procedure_path("", "users.getUser", Some("u/get")),
            Err(RegistrationError::InvalidPath("u/get".into()))
        );
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "users.", ".get", "users..get", "users.get-user", "9lives.get"] {
            assert_eq!(
                validate_name(name),
                Err(RegistrationError::InvalidName(name.to_string())),
                "{name}"
            );
        }
        assert!(validate_name("users_v2.get_user").is_ok());
    }

    #[test]
    fn test_schema_entry() {
        let mut def = ProcedureDef::new("users.getUser", HttpMethod::Get, "/users/get-user");
        def.params = Some("GetUserParams".into());
        def.response = Some("User".into());
        def.description = Some("Fetch a user".into());
        assert_eq!(
            def.to_schema(),
            json!({
                "transport": "http",
                "path": "/users/get-user",
                "method": "get",
                "params": "GetUserParams",
                "response": "User",
                "isEventStream": false,
                "isDeprecated": false,
                "description": "Fetch a user",
            })
        );
    }
}
