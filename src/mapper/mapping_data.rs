//! Resolution output record.

use serde::Serialize;

use crate::mapper::types::{ContextHandle, HostHandle, WrapperHandle};

/// Result of one mapping operation.
///
/// Fields start unset and are filled in as resolution stages succeed. A
/// record that is still empty after `map` returns means nothing matched;
/// callers check fields rather than catch an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingData {
    /// Matched virtual host.
    pub host: Option<HostHandle>,
    /// Selected context version's handle.
    pub context: Option<ContextHandle>,
    /// All live versions of the matched context, populated only when more
    /// than one version is deployed.
    pub contexts: Option<Vec<ContextHandle>>,
    /// Matched handler.
    pub wrapper: Option<WrapperHandle>,
    /// The matched wrapper is the JSP servlet reached through a wildcard.
    pub jsp_wildcard: bool,
    /// Path prefix owned by the matched context.
    pub context_path: Option<String>,
    /// Context-relative path the match was made against.
    pub request_path: Option<String>,
    /// Portion of the path owned by the matched wrapper.
    pub wrapper_path: Option<String>,
    /// Trailing portion beyond a wildcard match.
    pub path_info: Option<String>,
    /// Set when the caller should redirect (trailing-slash handling) instead
    /// of dispatching to a wrapper.
    pub redirect_path: Option<String>,
    /// Number of slashes in the matched context path.
    pub context_slash_count: usize,
}

impl MappingData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every field so the record can be reused for the next request.
    pub fn recycle(&mut self) {
        *self = Self::default();
    }
}
