//! Descriptor to registry translation.
//!
//! Handles are opaque to the mapper; the builder allocates them in
//! registration order and keeps a side table so callers can resolve a
//! mapping result back to descriptor names.

use std::sync::Arc;

use crate::config::schema::MapperConfig;
use crate::mapper::resources::{FsResources, ResourceProvider};
use crate::mapper::{ContextHandle, HostHandle, Mapper, WrapperHandle};

/// Resolves the opaque handles of a built mapper back to display names.
#[derive(Debug, Default)]
pub struct Deployment {
    hosts: Vec<(HostHandle, String)>,
    contexts: Vec<(ContextHandle, String)>,
    servlets: Vec<(WrapperHandle, String)>,
}

impl Deployment {
    pub fn host_name(&self, handle: HostHandle) -> Option<&str> {
        self.hosts
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, name)| name.as_str())
    }

    pub fn context_name(&self, handle: ContextHandle) -> Option<&str> {
        self.contexts
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, name)| name.as_str())
    }

    pub fn servlet_name(&self, handle: WrapperHandle) -> Option<&str> {
        self.servlets
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, name)| name.as_str())
    }

    pub fn summary(&self) -> (usize, usize, usize) {
        (self.hosts.len(), self.contexts.len(), self.servlets.len())
    }
}

/// Populate a fresh mapper from a validated descriptor.
pub fn build_mapper(config: &MapperConfig) -> (Mapper, Deployment) {
    let mapper = Mapper::new();
    let mut deployment = Deployment::default();
    let mut next_id = 0u64;

    for host in &config.hosts {
        next_id += 1;
        let host_handle = HostHandle(next_id);
        let aliases: Vec<&str> = host.aliases.iter().map(String::as_str).collect();
        mapper.add_host(&host.name, &aliases, host_handle);
        deployment.hosts.push((host_handle, host.name.clone()));

        for context in &host.contexts {
            next_id += 1;
            let context_handle = ContextHandle(next_id);
            let resources = context
                .docroot
                .as_ref()
                .map(|root| Arc::new(FsResources::new(root)) as Arc<dyn ResourceProvider>);
            mapper.add_context_version(
                &host.name,
                host_handle,
                &context.path,
                &context.version,
                context_handle,
                &context.welcome_files,
                resources,
            );
            deployment.contexts.push((
                context_handle,
                format!("{}{}#{}", host.name, context.path, context.version),
            ));

            for servlet in &context.servlets {
                next_id += 1;
                let wrapper_handle = WrapperHandle(next_id);
                mapper.add_wrapper(
                    &host.name,
                    &context.path,
                    &context.version,
                    &servlet.pattern,
                    wrapper_handle,
                    servlet.jsp_wildcard,
                    servlet.resource_only,
                );
                deployment
                    .servlets
                    .push((wrapper_handle, servlet.name.clone()));
            }
        }
    }

    if let Some(default_host) = &config.default_host {
        mapper.set_default_host_name(default_host);
    }

    (mapper, deployment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MappingData;

    #[test]
    fn builds_a_working_registry_from_a_descriptor() {
        let config: MapperConfig = toml::from_str(
            r#"
            default_host = "localhost"

            [[hosts]]
            name = "localhost"
            aliases = ["127.0.0.1"]

            [[hosts.contexts]]
            path = "/shop"
            welcome_files = ["index.html"]

            [[hosts.contexts.servlets]]
            name = "catalog"
            pattern = "/catalog/*"

            [[hosts.contexts.servlets]]
            name = "default"
            pattern = "/"
            "#,
        )
        .unwrap();

        let (mapper, deployment) = build_mapper(&config);
        let mut data = MappingData::new();
        mapper.map("127.0.0.1", "/shop/catalog/widgets/7", None, &mut data);

        assert_eq!(data.context_path.as_deref(), Some("/shop"));
        assert_eq!(
            data.wrapper.and_then(|w| deployment.servlet_name(w)),
            Some("catalog")
        );
        assert_eq!(data.path_info.as_deref(), Some("/widgets/7"));
        assert_eq!(
            data.host.and_then(|h| deployment.host_name(h)),
            Some("localhost")
        );
        assert_eq!(deployment.summary(), (1, 1, 2));
    }

    #[test]
    fn unknown_host_falls_back_to_the_default() {
        let config: MapperConfig = toml::from_str(
            r#"
            default_host = "localhost"

            [[hosts]]
            name = "localhost"

            [[hosts.contexts]]
            path = ""

            [[hosts.contexts.servlets]]
            name = "root-default"
            pattern = "/"
            "#,
        )
        .unwrap();

        let (mapper, deployment) = build_mapper(&config);
        let mut data = MappingData::new();
        mapper.map("unknown.example.org", "/anything", None, &mut data);
        assert_eq!(
            data.wrapper.and_then(|w| deployment.servlet_name(w)),
            Some("root-default")
        );
    }
}
