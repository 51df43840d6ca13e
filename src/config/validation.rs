//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate scheme keys and incomplete assembly schemes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::HostConfig;
use crate::scheme::{SchemeKey, SchemeKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bridge.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "bridge.bind_address",
            format!("'{}' is not a socket address", config.bridge.bind_address),
        ));
    }
    if config.bridge.request_timeout_secs == 0 {
        errors.push(ValidationError::new("bridge.request_timeout_secs", "must be > 0"));
    }
    if config.proxy.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("proxy.connect_timeout_secs", "must be > 0"));
    }
    if config.proxy.request_timeout_secs == 0 {
        errors.push(ValidationError::new("proxy.request_timeout_secs", "must be > 0"));
    }

    let obs = &config.observability;
    if tracing_subscriber::EnvFilter::try_new(&obs.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("'{}' is not a valid filter directive", obs.log_level),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    let mut seen = HashSet::new();
    for (i, scheme) in config.schemes.iter().enumerate() {
        let field = format!("schemes[{}]", i);

        if scheme.scheme.is_empty() || scheme.host.is_empty() {
            errors.push(ValidationError::new(&field, "scheme and host are required"));
            continue;
        }
        if Url::parse(&format!("{}://{}/", scheme.scheme, scheme.host)).is_err() {
            errors.push(ValidationError::new(
                &field,
                format!("'{}://{}' is not a valid URL prefix", scheme.scheme, scheme.host),
            ));
        }

        let key = SchemeKey::new(&scheme.scheme, &scheme.host);
        if !seen.insert(key.clone()) {
            errors.push(ValidationError::new(&field, format!("duplicate scheme {}", key)));
        }

        match (scheme.kind, &scheme.assembly) {
            (SchemeKind::AssemblyResource, None) => errors.push(ValidationError::new(
                format!("{}.assembly", field),
                "required for assembly_resource schemes",
            )),
            (SchemeKind::AssemblyResource, Some(assembly)) if assembly.namespace.is_empty() => {
                errors.push(ValidationError::new(
                    format!("{}.assembly.namespace", field),
                    "must not be empty",
                ))
            }
            (SchemeKind::AssemblyResource, Some(_)) | (_, None) => {}
            (kind, Some(_)) => errors.push(ValidationError::new(
                format!("{}.assembly", field),
                format!("not allowed for {} schemes", kind),
            )),
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
    use crate::config::schema::{AssemblyConfig, SchemeConfig};

    fn scheme(scheme: &str, host: &str, kind: SchemeKind) -> SchemeConfig {
        SchemeConfig {
            scheme: scheme.into(),
            host: host.into(),
            kind,
            base_folder: String::new(),
            assembly: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&HostConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = HostConfig::default();
        config.bridge.bind_address = "nowhere".into();
        config.proxy.request_timeout_secs = 0;
        config.schemes = vec![
            scheme("local", "dist", SchemeKind::Resource),
            scheme("LOCAL", "Dist", SchemeKind::Resource),
            scheme("assembly", "app", SchemeKind::AssemblyResource),
        ];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(fields.contains(&"bridge.bind_address"));
        assert!(fields.contains(&"proxy.request_timeout_secs"));
        assert!(fields.contains(&"schemes[1]"));
        assert!(fields.contains(&"schemes[2].assembly"));
    }

    #[test]
    fn test_assembly_on_wrong_kind() {
        let mut entry = scheme("local", "dist", SchemeKind::Resource);
        entry.assembly = Some(AssemblyConfig {
            namespace: "Demo".into(),
            root_folder: String::new(),
            bundle_dir: "bundle".into(),
            allow_file_fallback: false,
        });
        let config = HostConfig {
            schemes: vec![entry],
            ..HostConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "schemes[0].assembly");
    }
}
