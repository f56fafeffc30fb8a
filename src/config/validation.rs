//! Deployment descriptor validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (default host names a configured host)
//! - Detect conflicting names: hosts, aliases, versions, patterns
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: MapperConfig → Result<(), Vec<ValidationError>>
//! - Runs before a descriptor is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::MapperConfig;

/// A single semantic problem in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("host name is empty")]
    EmptyHostName,

    #[error("duplicate host or alias name {0:?}")]
    DuplicateHostName(String),

    #[error("host {host}: context path {path:?} must be empty or start with '/'")]
    BadContextPath { host: String, path: String },

    #[error("host {host}: context path {path:?} must not end with '/'")]
    TrailingSlash { host: String, path: String },

    #[error("host {host}: duplicate version {version:?} for context path {path:?}")]
    DuplicateContextVersion {
        host: String,
        path: String,
        version: String,
    },

    #[error("context {path:?}: servlet with pattern {pattern:?} has an empty name")]
    EmptyServletName { path: String, pattern: String },

    #[error("context {path:?}: duplicate servlet pattern {pattern:?}")]
    DuplicatePattern { path: String, pattern: String },

    #[error("default host {0:?} is not a configured host or alias")]
    UnknownDefaultHost(String),
}

/// Validate a parsed descriptor, collecting every problem found.
pub fn validate_config(config: &MapperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut host_names = HashSet::new();

    for host in &config.hosts {
        if host.name.is_empty() {
            errors.push(ValidationError::EmptyHostName);
        } else if !host_names.insert(host.name.clone()) {
            errors.push(ValidationError::DuplicateHostName(host.name.clone()));
        }
        for alias in &host.aliases {
            // An alias repeating its own host name is harmless redundancy.
            if alias == &host.name {
                continue;
            }
            if !host_names.insert(alias.clone()) {
                errors.push(ValidationError::DuplicateHostName(alias.clone()));
            }
        }

        let mut versions = HashSet::new();
        for context in &host.contexts {
            if !context.path.is_empty() && !context.path.starts_with('/') {
                errors.push(ValidationError::BadContextPath {
                    host: host.name.clone(),
                    path: context.path.clone(),
                });
            } else if context.path.ends_with('/') {
                errors.push(ValidationError::TrailingSlash {
                    host: host.name.clone(),
                    path: context.path.clone(),
                });
            }
            if !versions.insert((context.path.clone(), context.version.clone())) {
                errors.push(ValidationError::DuplicateContextVersion {
                    host: host.name.clone(),
                    path: context.path.clone(),
                    version: context.version.clone(),
                });
            }

            let mut patterns = HashSet::new();
            for servlet in &context.servlets {
                if servlet.name.is_empty() {
                    errors.push(ValidationError::EmptyServletName {
                        path: context.path.clone(),
                        pattern: servlet.pattern.clone(),
                    });
                }
                if !patterns.insert(servlet.pattern.clone()) {
                    errors.push(ValidationError::DuplicatePattern {
                        path: context.path.clone(),
                        pattern: servlet.pattern.clone(),
                    });
                }
            }
        }
    }

    if let Some(default_host) = &config.default_host {
        let known = config.hosts.iter().any(|h| {
            h.name == *default_host || h.aliases.iter().any(|a| a == default_host)
        });
        if !known {
            errors.push(ValidationError::UnknownDefaultHost(default_host.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
