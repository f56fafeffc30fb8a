//! Path-to-handler resolution.
//!
//! # Data Flow
//! ```text
//! map(host, uri, version)
//!     → host stage: case-insensitive lookup, default-host fallback
//!     → context stage: floor search + backward walk bounded by nesting
//!     → version selection: explicit label, else lexicographically last
//!     → wrapper stage, first rule that matches wins:
//!         1. exact            4. welcome file (exact, wildcard,
//!         2. wildcard prefix     file-backed extension, default)
//!         3. extension        5. welcome file, extension only
//!                             6. default wrapper / folder redirect
//! ```
//!
//! # Design Decisions
//! - The backward walk truncates at slash boundaries, first to the
//!   (nesting+1)-th slash and then one slash at a time, so the number of
//!   floor searches is bounded by the registered nesting depth
//! - No match leaves the output record untouched; nothing is raised

use std::sync::Arc;

use crate::mapper::mapping_data::MappingData;
use crate::mapper::registry::Mapper;
use crate::mapper::resources::ResourceKind;
use crate::mapper::sorted::{exact_find, find, find_ignore_case, last_slash, nth_slash};
use crate::mapper::types::{ContextHandle, ContextVersion, MappedWrapper};

impl Mapper {
    /// Resolve a (host, uri, optional version) triple.
    ///
    /// `data` should be freshly created or recycled; fields left unset after
    /// the call signal how far resolution got.
    pub fn map(&self, host_name: &str, uri: &str, version: Option<&str>, data: &mut MappingData) {
        // Virtual host mapping
        let hosts_guard = self.hosts.load();
        let hosts = hosts_guard.as_slice();
        let host_entry = find_ignore_case(hosts, host_name)
            .map(|pos| &hosts[pos])
            .filter(|entry| entry.name.eq_ignore_ascii_case(host_name));
        let host_entry = match host_entry {
            Some(entry) => entry,
            None => {
                let Some(default_name) = self.default_host_name.load_full() else {
                    return;
                };
                match exact_find(hosts, default_name.as_str()) {
                    Some(entry) => entry,
                    None => return,
                }
            }
        };
        data.host = Some(host_entry.host.handle);
        let context_list = host_entry.host.context_list.load();
        let contexts = context_list.contexts.as_slice();
        let nesting = context_list.nesting;

        // Context mapping: longest registered prefix that is an ancestor of
        // the request path.
        let Some(mut pos) = find(contexts, uri) else {
            return;
        };
        let mut end = uri.len();
        let mut truncated = false;
        let mut found = None;
        loop {
            let window = &uri[..end];
            let name = contexts[pos].name.as_str();
            if window.starts_with(name)
                && (window.len() == name.len() || window.as_bytes()[name.len()] == b'/')
            {
                found = Some(pos);
                break;
            }
            end = if truncated {
                last_slash(window)
            } else {
                nth_slash(window, nesting + 1)
            };
            truncated = true;
            match find(contexts, &uri[..end]) {
                Some(next) => pos = next,
                None => break,
            }
        }
        let context = match found {
            Some(pos) => &contexts[pos],
            // The root context, when present, catches everything unmatched.
            None => match contexts.first() {
                Some(first) if first.name.is_empty() => first,
                _ => return,
            },
        };
        data.context_path = Some(context.name.clone());

        // Version selection
        let versions = context.versions.load();
        let versions = versions.as_slice();
        if versions.len() > 1 {
            data.contexts = Some(versions.iter().map(|v| v.handle).collect());
        }
        let selected = version
            .and_then(|v| exact_find(versions, v))
            .or_else(|| versions.last());
        let Some(context_version) = selected else {
            return;
        };
        data.context = Some(context_version.handle);
        data.context_slash_count = context_version.slash_count;

        // Wrapper mapping
        if data.wrapper.is_none() {
            self.map_wrapper(context_version, uri, data);
        }
    }

    /// Resolve a uri relative to an already-known context, as a request
    /// dispatcher does. The uri still carries the context path prefix.
    pub fn map_context(&self, context: ContextHandle, uri: &str, data: &mut MappingData) {
        let Some(context_version) = self
            .context_version_index
            .get(&context)
            .map(|entry| Arc::clone(entry.value()))
        else {
            return;
        };
        self.map_wrapper(&context_version, uri, data);
    }

    fn map_wrapper(&self, cv: &ContextVersion, uri: &str, data: &mut MappingData) {
        if cv.path.len() > uri.len() || !uri.is_char_boundary(cv.path.len()) {
            return;
        }
        let mut path = String::with_capacity(uri.len() + 1);
        path.push_str(uri);
        let no_servlet_path = cv.path.len() == path.len();
        if no_servlet_path {
            path.push('/');
        }
        let suffix = &path[cv.path.len()..];

        let exact = cv.exact_wrappers.load();
        let wildcard = cv.wildcard_wrappers.load();
        let extension = cv.extension_wrappers.load();

        // Rule 1 -- exact match
        map_exact_wrapper(exact.as_slice(), suffix, data);

        // Rule 2 -- prefix match
        let mut check_jsp_welcome_files = false;
        if data.wrapper.is_none() {
            map_wildcard_wrapper(&wildcard.wrappers, wildcard.nesting, suffix, data);
            if data.wrapper.is_some() && data.jsp_wildcard {
                if suffix.ends_with('/') {
                    // A directory path reached the JSP servlet through a
                    // wildcard; the welcome files, interpreted as JSPs, must
                    // be considered instead.
                    data.wrapper = None;
                    check_jsp_welcome_files = true;
                } else {
                    data.wrapper_path = Some(suffix.to_string());
                    data.path_info = None;
                }
            }
        }

        if data.wrapper.is_none() && no_servlet_path {
            // The servlet path is empty: ask the caller to redirect with a
            // trailing slash instead of applying further rules.
            data.redirect_path = Some(path.clone());
            return;
        }

        // Rule 3 -- extension match
        if data.wrapper.is_none() && !check_jsp_welcome_files {
            map_extension_wrapper(extension.as_slice(), suffix, data, true);
        }

        // Rule 4 -- welcome files
        if data.wrapper.is_none() && (check_jsp_welcome_files || suffix.ends_with('/')) {
            let welcome_files = cv.welcome_files.load();
            for welcome in welcome_files.iter() {
                if data.wrapper.is_some() {
                    break;
                }
                let composed = format!("{suffix}{welcome}");

                // Rule 4a -- exact match on the welcome path
                map_exact_wrapper(exact.as_slice(), &composed, data);

                // Rule 4b -- prefix match on the welcome path
                if data.wrapper.is_none() {
                    map_wildcard_wrapper(&wildcard.wrappers, wildcard.nesting, &composed, data);
                }

                // Rule 4c -- physical file behind the welcome path: try the
                // extension mappings, then fall back to the default wrapper
                if data.wrapper.is_none() {
                    if let Some(resources) = &cv.resources {
                        if resources.get_resource(&composed) == Some(ResourceKind::File) {
                            map_extension_wrapper(extension.as_slice(), &composed, data, true);
                            if data.wrapper.is_none() {
                                if let Some(default) = cv.default_wrapper.load_full() {
                                    data.wrapper = Some(default.handle);
                                    data.request_path = Some(composed.clone());
                                    data.wrapper_path = Some(composed.clone());
                                }
                            }
                        }
                    }
                }
            }
        }

        // Welcome files, take 2: extension-mapped welcome files that need no
        // physical backing (index.jsf and friends).
        if data.wrapper.is_none() && (check_jsp_welcome_files || suffix.ends_with('/')) {
            let welcome_files = cv.welcome_files.load();
            for welcome in welcome_files.iter() {
                if data.wrapper.is_some() {
                    break;
                }
                let composed = format!("{suffix}{welcome}");
                map_extension_wrapper(extension.as_slice(), &composed, data, false);
            }
        }

        // Rule 7 -- default wrapper
        if data.wrapper.is_none() && !check_jsp_welcome_files {
            if let Some(default) = cv.default_wrapper.load_full() {
                data.wrapper = Some(default.handle);
                data.request_path = Some(suffix.to_string());
                data.wrapper_path = Some(suffix.to_string());
            }
            if let Some(resources) = &cv.resources {
                if !suffix.ends_with('/') {
                    match resources.get_resource(suffix) {
                        Some(ResourceKind::Directory) => {
                            // The path names a folder: redirecting with a
                            // trailing slash wins over the default wrapper.
                            let mut redirect = path.clone();
                            redirect.push('/');
                            data.redirect_path = Some(redirect);
                        }
                        _ => {
                            data.request_path = Some(suffix.to_string());
                            data.wrapper_path = Some(suffix.to_string());
                        }
                    }
                }
            }
        }
    }
}

/// Rule 1: exact name match.
fn map_exact_wrapper(wrappers: &[Arc<MappedWrapper>], path: &str, data: &mut MappingData) {
    let Some(wrapper) = exact_find(wrappers, path) else {
        return;
    };
    data.request_path = Some(wrapper.name.clone());
    data.wrapper = Some(wrapper.handle);
    if path == "/" {
        data.path_info = Some("/".to_string());
        data.wrapper_path = Some(String::new());
        // This looks wrong, but it is what the servlet mapping rules require
        // for a context-root mapped handler.
        data.context_path = Some(String::new());
    } else {
        data.wrapper_path = Some(wrapper.name.clone());
    }
}

/// Rule 2: longest wildcard prefix, found with the same nesting-bounded
/// backward walk as the context stage.
fn map_wildcard_wrapper(
    wrappers: &[Arc<MappedWrapper>],
    nesting: usize,
    path: &str,
    data: &mut MappingData,
) {
    let Some(mut pos) = find(wrappers, path) else {
        return;
    };
    let mut end = path.len();
    let mut truncated = false;
    loop {
        let window = &path[..end];
        let wrapper = &wrappers[pos];
        let name = wrapper.name.as_str();
        if window.starts_with(name)
            && (window.len() == name.len() || window.as_bytes()[name.len()] == b'/')
        {
            data.wrapper_path = Some(wrapper.name.clone());
            if path.len() > name.len() {
                data.path_info = Some(path[name.len()..].to_string());
            }
            data.request_path = Some(path.to_string());
            data.wrapper = Some(wrapper.handle);
            data.jsp_wildcard = wrapper.jsp_wildcard;
            return;
        }
        end = if truncated {
            last_slash(window)
        } else {
            nth_slash(window, nesting + 1)
        };
        truncated = true;
        match find(wrappers, &path[..end]) {
            Some(next) => pos = next,
            None => return,
        }
    }
}

/// Extension match: the substring after the last `.` that follows the last
/// `/` (so `a.b/c.d` has extension `d`, not `b`).
fn map_extension_wrapper(
    wrappers: &[Arc<MappedWrapper>],
    path: &str,
    data: &mut MappingData,
    resource_expected: bool,
) {
    let bytes = path.as_bytes();
    let Some(slash) = bytes.iter().rposition(|&b| b == b'/') else {
        return;
    };
    let Some(period) = bytes[slash + 1..]
        .iter()
        .rposition(|&b| b == b'.')
        .map(|p| slash + 1 + p)
    else {
        return;
    };
    let extension = &path[period + 1..];
    let Some(wrapper) = exact_find(wrappers, extension) else {
        return;
    };
    if resource_expected || !wrapper.resource_only {
        data.wrapper_path = Some(path.to_string());
        data.request_path = Some(path.to_string());
        data.wrapper = Some(wrapper.handle);
    }
}
