//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check API identities and context paths for duplicates
//! - Validate value ranges and upstream URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::Uri;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid bind address: {0}")]
    BindAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("API at index {0} has an empty id")]
    EmptyApiId(usize),

    #[error("duplicate API id: {0}")]
    DuplicateApiId(String),

    #[error("API {api}: context path must start with '/': {path:?}")]
    BadContextPath { api: String, path: String },

    #[error("duplicate context path: {0}")]
    DuplicateContextPath(String),

    #[error("API {api}: upstream must be an absolute URL with scheme and host: {upstream}")]
    BadUpstream { api: String, upstream: String },
}

/// Validate a full configuration, collecting every violation.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut ids = HashSet::new();
    let mut paths = HashSet::new();
    for (idx, api) in config.apis.iter().enumerate() {
        if api.id.is_empty() {
            errors.push(ValidationError::EmptyApiId(idx));
        } else if !ids.insert(api.id.clone()) {
            errors.push(ValidationError::DuplicateApiId(api.id.clone()));
        }

        if !api.context_path.starts_with('/') {
            errors.push(ValidationError::BadContextPath {
                api: api.id.clone(),
                path: api.context_path.clone(),
            });
        } else {
            // Same key the routing table would use: trailing-slash form. The
            // table holds at most one handler per context path, so a second
            // API on the same path would lose the registration race anyway.
            let key = format!("{}/", api.context_path.trim_end_matches('/'));
            if !paths.insert(key) {
                errors.push(ValidationError::DuplicateContextPath(
                    api.context_path.clone(),
                ));
            }
        }

        let upstream_ok = api
            .upstream
            .parse::<Uri>()
            .map(|uri| uri.scheme().is_some() && uri.authority().is_some())
            .unwrap_or(false);
        if !upstream_ok {
            errors.push(ValidationError::BadUpstream {
                api: api.id.clone(),
                upstream: api.upstream.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ApiDefinition;

    fn api(id: &str, path: &str) -> ApiDefinition {
        ApiDefinition {
            id: id.into(),
            name: id.into(),
            enabled: true,
            context_path: path.into(),
            virtual_host: None,
            upstream: "http://127.0.0.1:3000".into(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nonsense".into();
        config.timeouts.request_secs = 0;
        let mut bad = api("x", "no-slash");
        bad.upstream = "not a url".into();
        config.apis.push(bad);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn duplicate_ids_and_paths_detected() {
        let mut config = GatewayConfig::default();
        config.apis.push(api("x", "/team"));
        config.apis.push(api("x", "/team/"));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateApiId(_))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateContextPath(_))));
    }

    #[test]
    fn overlapping_prefixes_are_allowed() {
        let mut config = GatewayConfig::default();
        config.apis.push(api("x", "/team"));
        config.apis.push(api("y", "/team/sub"));

        assert!(validate_config(&config).is_ok());
    }
}
