//! Deployment descriptor loading from disk.

use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::MapperConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error raised while loading a descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {0}")]
    Validation(ValidationFailure),
}

/// All semantic errors found in one descriptor.
#[derive(Debug)]
pub struct ValidationFailure(pub Vec<ValidationError>);

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// Load and validate a descriptor from a TOML file.
pub fn load_config(path: &Path) -> Result<MapperConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: MapperConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(|errors| ConfigError::Validation(ValidationFailure(errors)))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn loads_and_validates_a_descriptor() {
        let path = std::env::temp_dir().join("request-mapper-loader-test.toml");
        std::fs::write(
            &path,
            r#"
            default_host = "localhost"

            [[hosts]]
            name = "localhost"

            [[hosts.contexts]]
            path = "/shop"
            welcome_files = ["index.html"]
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.default_host.as_deref(), Some("localhost"));
        assert_eq!(config.hosts[0].contexts[0].welcome_files, ["index.html"]);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn semantic_problems_surface_as_validation_errors() {
        let path = std::env::temp_dir().join("request-mapper-loader-invalid-test.toml");
        std::fs::write(
            &path,
            r#"
            [[hosts]]
            name = "localhost"

            [[hosts.contexts]]
            path = "shop"
            "#,
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("must be empty or start with '/'"));

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
