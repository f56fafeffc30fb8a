//! Registry mutation API.
//!
//! # Responsibilities
//! - Register and remove hosts, aliases, context versions, wrappers and
//!   welcome files
//! - Keep every published array sorted, unique and torn-free for readers
//! - Keep the context-handle index consistent with the host tree
//!
//! # Design Decisions
//! - Writers take the smallest enclosing lock: the mapper for the host
//!   array, one host for its contexts, one context version for its wrappers
//! - Naming conflicts and dangling references are logged errors and no-ops;
//!   a bad registration never aborts the rest of a deployment
//! - New snapshots are built aside and published with one store, so a
//!   discarded snapshot can never be observed

use std::sync::{Arc, Mutex};

use arc_swap::{ArcSwap, ArcSwapOption};
use dashmap::DashMap;
use tracing::{debug, error};

use crate::mapper::resources::ResourceProvider;
use crate::mapper::sorted::{exact_find, insert_map, remove_map, slash_count};
use crate::mapper::types::{
    ContextHandle, ContextVersion, HostHandle, HostMapping, MappedContext, MappedHost,
    MappedWrapper, WildcardWrappers, WrapperHandle,
};

/// One handler mapping to register, as supplied by the deployer.
#[derive(Debug, Clone)]
pub struct WrapperMapping {
    /// Mapping pattern: exact path, `/prefix/*`, `*.ext`, or `/` for the
    /// default wrapper. The empty pattern maps the context root.
    pub pattern: String,
    pub wrapper: WrapperHandle,
    pub jsp_wildcard: bool,
    pub resource_only: bool,
}

/// Snapshot of one host-array entry, for administrative display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub name: String,
    pub alias: bool,
    pub handle: HostHandle,
}

/// Concurrent host/path → handler resolution registry.
///
/// Request threads call the `map` entry points freely while deployment
/// threads mutate the registry; lookups observe either the old or the new
/// snapshot of any array, never a partial one.
pub struct Mapper {
    pub(crate) hosts: ArcSwap<Vec<HostMapping>>,
    pub(crate) default_host_name: ArcSwapOption<String>,
    /// Context handle → selected version, for context-relative mapping.
    /// Independently thread-safe; not covered by the write locks.
    pub(crate) context_version_index: DashMap<ContextHandle, Arc<ContextVersion>>,
    /// Serializes host-array mutations.
    write_lock: Mutex<()>,
}

impl Mapper {
    pub fn new() -> Self {
        Self {
            hosts: ArcSwap::from_pointee(Vec::new()),
            default_host_name: ArcSwapOption::empty(),
            context_version_index: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Set the host consulted when no virtual host matches a request.
    pub fn set_default_host_name(&self, name: impl Into<String>) {
        self.default_host_name.store(Some(Arc::new(name.into())));
    }

    /// Register a virtual host and its aliases.
    ///
    /// A duplicate host name is a logged no-op and none of the aliases are
    /// added either (otherwise `remove_host` could never find them). A
    /// duplicate alias is logged and skipped without undoing earlier aliases
    /// from the same call.
    pub fn add_host(&self, name: &str, aliases: &[&str], handle: HostHandle) {
        let _guard = self.write_lock.lock().expect("mapper write lock poisoned");
        let mapped = Arc::new(MappedHost::new(handle));
        let hosts = self.hosts.load();
        let entry = HostMapping {
            name: name.to_string(),
            alias: false,
            host: Arc::clone(&mapped),
        };
        match insert_map(hosts.as_slice(), entry) {
            Some(new_hosts) => self.hosts.store(Arc::new(new_hosts)),
            None => {
                error!(host = name, "duplicate host name, registration ignored");
                return;
            }
        }
        for alias in aliases {
            self.add_host_alias_locked(alias, &mapped, name);
        }
    }

    /// Remove a host and every alias pointing at it. Removing an alias name
    /// through this entry point is a no-op; use [`Mapper::remove_host_alias`].
    pub fn remove_host(&self, name: &str) {
        let _guard = self.write_lock.lock().expect("mapper write lock poisoned");
        let hosts = self.hosts.load();
        let Some(entry) = exact_find(hosts.as_slice(), name) else {
            return;
        };
        if entry.alias {
            return;
        }
        let target = Arc::clone(&entry.host);
        let new_hosts: Vec<HostMapping> = hosts
            .iter()
            .filter(|h| !Arc::ptr_eq(&h.host, &target))
            .cloned()
            .collect();
        self.hosts.store(Arc::new(new_hosts));
    }

    /// Register an extra name for an existing host. Unknown canonical host
    /// is a silent no-op; aliasing a host to its own name is harmless.
    pub fn add_host_alias(&self, name: &str, alias: &str) {
        let _guard = self.write_lock.lock().expect("mapper write lock poisoned");
        let mapped = {
            let hosts = self.hosts.load();
            match exact_find(hosts.as_slice(), name) {
                Some(entry) => Arc::clone(&entry.host),
                None => return,
            }
        };
        self.add_host_alias_locked(alias, &mapped, name);
    }

    /// Remove an alias. Removing a canonical host name through this entry
    /// point is a no-op.
    pub fn remove_host_alias(&self, alias: &str) {
        let _guard = self.write_lock.lock().expect("mapper write lock poisoned");
        let hosts = self.hosts.load();
        let Some(entry) = exact_find(hosts.as_slice(), alias) else {
            return;
        };
        if !entry.alias {
            return;
        }
        if let Some(new_hosts) = remove_map(hosts.as_slice(), alias) {
            self.hosts.store(Arc::new(new_hosts));
        }
    }

    fn add_host_alias_locked(&self, alias: &str, mapped: &Arc<MappedHost>, canonical: &str) {
        let hosts = self.hosts.load();
        let entry = HostMapping {
            name: alias.to_string(),
            alias: true,
            host: Arc::clone(mapped),
        };
        match insert_map(hosts.as_slice(), entry) {
            Some(new_hosts) => self.hosts.store(Arc::new(new_hosts)),
            None => {
                if let Some(existing) = exact_find(hosts.as_slice(), alias) {
                    if Arc::ptr_eq(&existing.host, mapped) {
                        // An alias with the same name as its own host; a
                        // harmless redundancy.
                        return;
                    }
                }
                error!(
                    alias,
                    host = canonical,
                    "duplicate host alias, registration ignored"
                );
            }
        }
    }

    /// Register one version of a context under a host, creating the host
    /// (without aliases) when it is not yet known.
    pub fn add_context_version(
        &self,
        host_name: &str,
        host: HostHandle,
        path: &str,
        version: &str,
        context: ContextHandle,
        welcome_files: &[String],
        resources: Option<Arc<dyn ResourceProvider>>,
    ) {
        let mapped_host = match self.mapped_host(host_name) {
            Some(h) => h,
            None => {
                self.add_host(host_name, &[], host);
                match self.mapped_host(host_name) {
                    Some(h) => h,
                    None => {
                        error!(host = host_name, "no host found");
                        return;
                    }
                }
            }
        };

        let slashes = slash_count(path);
        let _guard = mapped_host
            .write_lock
            .lock()
            .expect("host write lock poisoned");
        let version_node = Arc::new(ContextVersion::new(
            version,
            path,
            slashes,
            context,
            welcome_files,
            resources,
        ));

        let list = mapped_host.context_list.load();
        match exact_find(&list.contexts, path) {
            None => {
                let mapped_context = Arc::new(MappedContext::new(path, Arc::clone(&version_node)));
                if let Some(new_list) = list.add_context(mapped_context, slashes) {
                    mapped_host.context_list.store(Arc::new(new_list));
                    self.context_version_index.insert(context, version_node);
                }
            }
            Some(mapped_context) => {
                let versions = mapped_context.versions.load();
                match insert_map(versions.as_slice(), Arc::clone(&version_node)) {
                    Some(new_versions) => {
                        mapped_context.versions.store(Arc::new(new_versions));
                        self.context_version_index.insert(context, version_node);
                    }
                    None => {
                        error!(
                            context = path,
                            version, "duplicate context version, registration ignored"
                        );
                    }
                }
            }
        }
    }

    /// Remove one context version; when it was the last version, the context
    /// itself disappears from the host and `nesting` is recomputed.
    pub fn remove_context_version(
        &self,
        context: ContextHandle,
        host_name: &str,
        path: &str,
        version: &str,
    ) {
        self.context_version_index.remove(&context);

        let Some(mapped_host) = self.mapped_host(host_name) else {
            return;
        };
        let _guard = mapped_host
            .write_lock
            .lock()
            .expect("host write lock poisoned");
        let list = mapped_host.context_list.load();
        let Some(mapped_context) = exact_find(&list.contexts, path) else {
            return;
        };
        let versions = mapped_context.versions.load();
        let Some(new_versions) = remove_map(versions.as_slice(), version) else {
            return;
        };
        if new_versions.is_empty() {
            if let Some(new_list) = list.remove_context(path) {
                mapped_host.context_list.store(Arc::new(new_list));
            }
        } else {
            mapped_context.versions.store(Arc::new(new_versions));
        }
    }

    /// Register a handler mapping in the addressed context version.
    pub fn add_wrapper(
        &self,
        host_name: &str,
        context_path: &str,
        version: &str,
        pattern: &str,
        wrapper: WrapperHandle,
        jsp_wildcard: bool,
        resource_only: bool,
    ) {
        let Some(cv) = self.context_version(host_name, context_path, version, true) else {
            return;
        };
        self.add_wrapper_to(&cv, pattern, wrapper, jsp_wildcard, resource_only);
    }

    /// Register a batch of handler mappings in one context version.
    pub fn add_wrappers(
        &self,
        host_name: &str,
        context_path: &str,
        version: &str,
        mappings: &[WrapperMapping],
    ) {
        let Some(cv) = self.context_version(host_name, context_path, version, true) else {
            return;
        };
        for m in mappings {
            self.add_wrapper_to(&cv, &m.pattern, m.wrapper, m.jsp_wildcard, m.resource_only);
        }
    }

    /// Remove a handler mapping from the addressed context version.
    pub fn remove_wrapper(&self, host_name: &str, context_path: &str, version: &str, pattern: &str) {
        let Some(cv) = self.context_version(host_name, context_path, version, false) else {
            return;
        };
        self.remove_wrapper_from(&cv, pattern);
    }

    pub(crate) fn add_wrapper_to(
        &self,
        cv: &ContextVersion,
        pattern: &str,
        handle: WrapperHandle,
        jsp_wildcard: bool,
        resource_only: bool,
    ) {
        let _guard = cv.write_lock.lock().expect("context write lock poisoned");
        if let Some(name) = pattern.strip_suffix("/*") {
            // Wildcard wrapper
            let wrapper = Arc::new(MappedWrapper::new(name, handle, jsp_wildcard, resource_only));
            let set = cv.wildcard_wrappers.load();
            match insert_map(&set.wrappers, wrapper) {
                Some(wrappers) => {
                    let nesting = set.nesting.max(slash_count(name));
                    cv.wildcard_wrappers
                        .store(Arc::new(WildcardWrappers { wrappers, nesting }));
                }
                None => error!(pattern, "duplicate wrapper mapping, registration ignored"),
            }
        } else if let Some(ext) = pattern.strip_prefix("*.") {
            // Extension wrapper
            let wrapper = Arc::new(MappedWrapper::new(ext, handle, jsp_wildcard, resource_only));
            let set = cv.extension_wrappers.load();
            match insert_map(set.as_slice(), wrapper) {
                Some(wrappers) => cv.extension_wrappers.store(Arc::new(wrappers)),
                None => error!(pattern, "duplicate wrapper mapping, registration ignored"),
            }
        } else if pattern == "/" {
            // Default wrapper
            cv.default_wrapper.store(Some(Arc::new(MappedWrapper::new(
                "",
                handle,
                jsp_wildcard,
                resource_only,
            ))));
        } else {
            // Exact wrapper; the empty pattern is the context-root mapping,
            // stored under the literal name "/".
            let name = if pattern.is_empty() { "/" } else { pattern };
            let wrapper = Arc::new(MappedWrapper::new(name, handle, jsp_wildcard, resource_only));
            let set = cv.exact_wrappers.load();
            match insert_map(set.as_slice(), wrapper) {
                Some(wrappers) => cv.exact_wrappers.store(Arc::new(wrappers)),
                None => error!(pattern, "duplicate wrapper mapping, registration ignored"),
            }
        }
    }

    pub(crate) fn remove_wrapper_from(&self, cv: &ContextVersion, pattern: &str) {
        debug!(context = %cv.path, pattern, "removing wrapper mapping");
        let _guard = cv.write_lock.lock().expect("context write lock poisoned");
        if let Some(name) = pattern.strip_suffix("/*") {
            let set = cv.wildcard_wrappers.load();
            if set.wrappers.is_empty() {
                return;
            }
            if let Some(wrappers) = remove_map(&set.wrappers, name) {
                let nesting = wrappers
                    .iter()
                    .map(|w| slash_count(&w.name))
                    .max()
                    .unwrap_or(0);
                cv.wildcard_wrappers
                    .store(Arc::new(WildcardWrappers { wrappers, nesting }));
            }
        } else if let Some(ext) = pattern.strip_prefix("*.") {
            let set = cv.extension_wrappers.load();
            if set.is_empty() {
                return;
            }
            if let Some(wrappers) = remove_map(set.as_slice(), ext) {
                cv.extension_wrappers.store(Arc::new(wrappers));
            }
        } else if pattern == "/" {
            cv.default_wrapper.store(None);
        } else {
            let name = if pattern.is_empty() { "/" } else { pattern };
            let set = cv.exact_wrappers.load();
            if set.is_empty() {
                return;
            }
            if let Some(wrappers) = remove_map(set.as_slice(), name) {
                cv.exact_wrappers.store(Arc::new(wrappers));
            }
        }
    }

    /// Append a welcome file to the addressed context version.
    pub fn add_welcome_file(
        &self,
        host_name: &str,
        context_path: &str,
        version: &str,
        welcome_file: &str,
    ) {
        let Some(cv) = self.context_version(host_name, context_path, version, true) else {
            return;
        };
        let _guard = cv.write_lock.lock().expect("context write lock poisoned");
        let mut files = cv.welcome_files.load().to_vec();
        files.push(welcome_file.to_string());
        cv.welcome_files.store(Arc::new(files));
    }

    /// Remove a welcome file, preserving the order of the rest.
    pub fn remove_welcome_file(
        &self,
        host_name: &str,
        context_path: &str,
        version: &str,
        welcome_file: &str,
    ) {
        let Some(cv) = self.context_version(host_name, context_path, version, true) else {
            return;
        };
        let _guard = cv.write_lock.lock().expect("context write lock poisoned");
        let files = cv.welcome_files.load();
        let Some(pos) = files.iter().position(|f| f == welcome_file) else {
            return;
        };
        let mut next = files.to_vec();
        next.remove(pos);
        cv.welcome_files.store(Arc::new(next));
    }

    /// Drop every welcome file of the addressed context version.
    pub fn clear_welcome_files(&self, host_name: &str, context_path: &str, version: &str) {
        let Some(cv) = self.context_version(host_name, context_path, version, true) else {
            return;
        };
        let _guard = cv.write_lock.lock().expect("context write lock poisoned");
        cv.welcome_files.store(Arc::new(Vec::new()));
    }

    /// Snapshot of the host array for administrative display, in array order.
    pub fn registered_hosts(&self) -> Vec<HostInfo> {
        self.hosts
            .load()
            .iter()
            .map(|h| HostInfo {
                name: h.name.clone(),
                alias: h.alias,
                handle: h.host.handle,
            })
            .collect()
    }

    fn mapped_host(&self, name: &str) -> Option<Arc<MappedHost>> {
        let hosts = self.hosts.load();
        exact_find(hosts.as_slice(), name).map(|entry| Arc::clone(&entry.host))
    }

    fn context_version(
        &self,
        host_name: &str,
        context_path: &str,
        version: &str,
        log_missing: bool,
    ) -> Option<Arc<ContextVersion>> {
        let mapped_host = self.mapped_host(host_name)?;
        let list = mapped_host.context_list.load();
        let Some(mapped_context) = exact_find(&list.contexts, context_path) else {
            if log_missing {
                error!(context = context_path, "no context found");
            }
            return None;
        };
        let versions = mapped_context.versions.load();
        let Some(cv) = exact_find(versions.as_slice(), version) else {
            if log_missing {
                error!(context = context_path, version, "no context version found");
            }
            return None;
        };
        Some(Arc::clone(cv))
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(mapper: &Mapper) -> Vec<String> {
        mapper
            .registered_hosts()
            .iter()
            .map(|h| h.name.clone())
            .collect()
    }

    #[test]
    fn hosts_stay_sorted_and_unique() {
        let mapper = Mapper::new();
        for (i, name) in ["zeta", "alpha", "mike", "alpha", "kilo"].iter().enumerate() {
            mapper.add_host(name, &[], HostHandle(i as u64));
        }
        assert_eq!(names(&mapper), ["alpha", "kilo", "mike", "zeta"]);
        // The duplicate did not overwrite the original.
        let hosts = mapper.registered_hosts();
        assert_eq!(hosts[0].handle, HostHandle(1));
    }

    #[test]
    fn duplicate_host_skips_its_aliases() {
        let mapper = Mapper::new();
        mapper.add_host("web.example.org", &[], HostHandle(1));
        mapper.add_host("web.example.org", &["www.example.org"], HostHandle(2));
        assert_eq!(names(&mapper), ["web.example.org"]);
    }

    #[test]
    fn alias_shares_context_list_with_canonical_host() {
        let mapper = Mapper::new();
        mapper.add_host("web.example.org", &["www.example.org"], HostHandle(1));
        let hosts = mapper.hosts.load();
        let canonical = exact_find(hosts.as_slice(), "web.example.org").unwrap();
        let alias = exact_find(hosts.as_slice(), "www.example.org").unwrap();
        assert!(!canonical.alias);
        assert!(alias.alias);
        assert!(Arc::ptr_eq(&canonical.host, &alias.host));
    }

    #[test]
    fn self_alias_is_a_silent_no_op() {
        let mapper = Mapper::new();
        mapper.add_host("web.example.org", &["web.example.org"], HostHandle(1));
        mapper.add_host_alias("web.example.org", "web.example.org");
        assert_eq!(names(&mapper), ["web.example.org"]);
    }

    #[test]
    fn remove_host_takes_aliases_along() {
        let mapper = Mapper::new();
        mapper.add_host("a.example.org", &["a1.example.org", "a2.example.org"], HostHandle(1));
        mapper.add_host("b.example.org", &[], HostHandle(2));
        // Removing by alias name is a no-op.
        mapper.remove_host("a1.example.org");
        assert_eq!(names(&mapper).len(), 4);
        mapper.remove_host("a.example.org");
        assert_eq!(names(&mapper), ["b.example.org"]);
    }

    #[test]
    fn remove_host_alias_ignores_canonical_names() {
        let mapper = Mapper::new();
        mapper.add_host("a.example.org", &["a1.example.org"], HostHandle(1));
        mapper.remove_host_alias("a.example.org");
        assert_eq!(names(&mapper).len(), 2);
        mapper.remove_host_alias("a1.example.org");
        assert_eq!(names(&mapper), ["a.example.org"]);
    }

    #[test]
    fn context_nesting_tracks_insert_and_remove() {
        let mapper = Mapper::new();
        let host = HostHandle(1);
        mapper.add_context_version("h", host, "", "0", ContextHandle(10), &[], None);
        mapper.add_context_version("h", host, "/a/b/c", "0", ContextHandle(11), &[], None);
        let mapped = mapper.mapped_host("h").unwrap();
        assert_eq!(mapped.context_list.load().nesting, 3);

        mapper.remove_context_version(ContextHandle(11), "h", "/a/b/c", "0");
        assert_eq!(mapped.context_list.load().nesting, 0);
        assert_eq!(mapped.context_list.load().contexts.len(), 1);
    }

    #[test]
    fn last_version_removal_drops_the_context() {
        let mapper = Mapper::new();
        let host = HostHandle(1);
        mapper.add_context_version("h", host, "/app", "1", ContextHandle(10), &[], None);
        mapper.add_context_version("h", host, "/app", "2", ContextHandle(11), &[], None);

        mapper.remove_context_version(ContextHandle(10), "h", "/app", "1");
        let mapped = mapper.mapped_host("h").unwrap();
        assert_eq!(mapped.context_list.load().contexts.len(), 1);

        mapper.remove_context_version(ContextHandle(11), "h", "/app", "2");
        assert!(mapped.context_list.load().contexts.is_empty());
        assert!(mapper.context_version_index.is_empty());
    }

    #[test]
    fn wildcard_nesting_recomputed_on_removal() {
        let mapper = Mapper::new();
        let host = HostHandle(1);
        mapper.add_context_version("h", host, "/app", "0", ContextHandle(10), &[], None);
        mapper.add_wrapper("h", "/app", "0", "/a/b/c/*", WrapperHandle(20), false, false);
        mapper.add_wrapper("h", "/app", "0", "/a/*", WrapperHandle(21), false, false);

        let cv = mapper.context_version("h", "/app", "0", false).unwrap();
        assert_eq!(cv.wildcard_wrappers.load().nesting, 3);

        mapper.remove_wrapper("h", "/app", "0", "/a/b/c/*");
        assert_eq!(cv.wildcard_wrappers.load().nesting, 1);
        assert_eq!(cv.wildcard_wrappers.load().wrappers.len(), 1);
    }

    #[test]
    fn duplicate_wrapper_is_a_no_op() {
        let mapper = Mapper::new();
        let host = HostHandle(1);
        mapper.add_context_version("h", host, "/app", "0", ContextHandle(10), &[], None);
        mapper.add_wrapper("h", "/app", "0", "/hello", WrapperHandle(20), false, false);
        mapper.add_wrapper("h", "/app", "0", "/hello", WrapperHandle(21), false, false);

        let cv = mapper.context_version("h", "/app", "0", false).unwrap();
        let exact = cv.exact_wrappers.load();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].handle, WrapperHandle(20));
    }

    #[test]
    fn welcome_files_preserve_registration_order() {
        let mapper = Mapper::new();
        let host = HostHandle(1);
        let welcome = vec!["index.html".to_string()];
        mapper.add_context_version("h", host, "/app", "0", ContextHandle(10), &welcome, None);
        mapper.add_welcome_file("h", "/app", "0", "index.jsp");
        mapper.add_welcome_file("h", "/app", "0", "default.htm");

        let cv = mapper.context_version("h", "/app", "0", false).unwrap();
        assert_eq!(
            cv.welcome_files.load().to_vec(),
            ["index.html", "index.jsp", "default.htm"]
        );

        mapper.remove_welcome_file("h", "/app", "0", "index.jsp");
        assert_eq!(
            cv.welcome_files.load().to_vec(),
            ["index.html", "default.htm"]
        );

        mapper.clear_welcome_files("h", "/app", "0");
        assert!(cv.welcome_files.load().is_empty());
    }
}
