//! Deployment descriptor schema definitions.
//!
//! This module defines the complete descriptor structure for the mapper.
//! All types derive Serde traits for deserialization from descriptor files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root of the deployment descriptor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MapperConfig {
    /// Host consulted when no virtual host matches the request.
    pub default_host: Option<String>,

    /// Virtual host definitions.
    pub hosts: Vec<HostConfig>,
}

/// One virtual host and its deployed contexts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Canonical host name.
    pub name: String,

    /// Additional names resolving to the same host.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Deployed web application contexts.
    #[serde(default)]
    pub contexts: Vec<ContextConfig>,
}

/// One deployed context version.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextConfig {
    /// Context path ("" for the root context).
    #[serde(default)]
    pub path: String,

    /// Version label; several versions of one path may be live at once.
    #[serde(default = "default_version")]
    pub version: String,

    /// Welcome files, tried in this order.
    #[serde(default)]
    pub welcome_files: Vec<String>,

    /// Optional document root backing welcome-file and redirect decisions.
    #[serde(default)]
    pub docroot: Option<PathBuf>,

    /// Handler mappings.
    #[serde(default)]
    pub servlets: Vec<ServletConfig>,
}

fn default_version() -> String {
    "0".to_string()
}

/// One handler mapping inside a context.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServletConfig {
    /// Display name used in CLI output.
    pub name: String,

    /// Mapping pattern: exact path, "/prefix/*", "*.ext", or "/" for the
    /// default handler. The empty pattern maps the context root.
    #[serde(default)]
    pub pattern: String,

    /// The handler is the JSP servlet reached through a wildcard pattern.
    #[serde(default)]
    pub jsp_wildcard: bool,

    /// The mapping only applies when a physical resource backs the path.
    #[serde(default)]
    pub resource_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_descriptor_parses_with_defaults() {
        let config: MapperConfig = toml::from_str(
            r#"
            [[hosts]]
            name = "localhost"

            [[hosts.contexts]]
            path = "/shop"

            [[hosts.contexts.servlets]]
            name = "catalog"
            pattern = "/catalog/*"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_host, None);
        assert_eq!(config.hosts.len(), 1);
        let context = &config.hosts[0].contexts[0];
        assert_eq!(context.version, "0");
        assert!(context.welcome_files.is_empty());
        let servlet = &context.servlets[0];
        assert_eq!(servlet.pattern, "/catalog/*");
        assert!(!servlet.jsp_wildcard);
        assert!(!servlet.resource_only);
    }
}
