//! Registry node types.
//!
//! Nodes form the host → context → version → wrapper tree. Everything a
//! lookup dereferences is an immutable snapshot behind an [`ArcSwap`] slot;
//! mutation builds a replacement snapshot and publishes it with one store.

use std::sync::{Arc, Mutex};

use arc_swap::{ArcSwap, ArcSwapOption};
use serde::{Deserialize, Serialize};

use crate::mapper::resources::ResourceProvider;
use crate::mapper::sorted::{insert_map, remove_map, slash_count, MapElement};

/// Opaque identifier for a deployed virtual host, owned by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostHandle(pub u64);

/// Opaque identifier for a deployed context (web application), owned by the
/// container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextHandle(pub u64);

/// Opaque identifier for a registered handler (servlet), owned by the
/// container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrapperHandle(pub u64);

/// One entry in the sorted host array: a canonical host name or an alias.
/// All entries for one host share the same underlying [`MappedHost`].
#[derive(Clone)]
pub(crate) struct HostMapping {
    pub(crate) name: String,
    pub(crate) alias: bool,
    pub(crate) host: Arc<MappedHost>,
}

impl MapElement for HostMapping {
    fn name(&self) -> &str {
        &self.name
    }
}

/// The host node proper, shared between the canonical entry and its aliases
/// so context changes are visible through every name at once.
pub(crate) struct MappedHost {
    pub(crate) handle: HostHandle,
    pub(crate) context_list: ArcSwap<ContextList>,
    /// Serializes context mutations within this host.
    pub(crate) write_lock: Mutex<()>,
}

impl MappedHost {
    pub(crate) fn new(handle: HostHandle) -> Self {
        Self {
            handle,
            context_list: ArcSwap::from_pointee(ContextList::default()),
            write_lock: Mutex::new(()),
        }
    }
}

/// Immutable snapshot of one host's contexts plus the maximum nesting depth
/// across their paths, which bounds the prefix-search walk.
#[derive(Default)]
pub(crate) struct ContextList {
    pub(crate) contexts: Vec<Arc<MappedContext>>,
    pub(crate) nesting: usize,
}

impl ContextList {
    /// Snapshot with `context` spliced in; `None` when the path is taken.
    pub(crate) fn add_context(
        &self,
        context: Arc<MappedContext>,
        slash_count: usize,
    ) -> Option<ContextList> {
        let contexts = insert_map(&self.contexts, context)?;
        Some(ContextList {
            contexts,
            nesting: self.nesting.max(slash_count),
        })
    }

    /// Snapshot without the named context, with `nesting` fully recomputed;
    /// `None` when the path is absent.
    pub(crate) fn remove_context(&self, path: &str) -> Option<ContextList> {
        let contexts = remove_map(&self.contexts, path)?;
        let nesting = contexts
            .iter()
            .map(|c| slash_count(&c.name))
            .max()
            .unwrap_or(0);
        Some(ContextList { contexts, nesting })
    }
}

/// A context path and its live versions, sorted by version label.
pub(crate) struct MappedContext {
    pub(crate) name: String,
    pub(crate) versions: ArcSwap<Vec<Arc<ContextVersion>>>,
}

impl MappedContext {
    pub(crate) fn new(path: &str, first: Arc<ContextVersion>) -> Self {
        Self {
            name: path.to_string(),
            versions: ArcSwap::from_pointee(vec![first]),
        }
    }
}

impl MapElement for MappedContext {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Wildcard wrappers and the nesting bound that limits their prefix walk,
/// published together so the bound is never stale relative to the array.
#[derive(Default)]
pub(crate) struct WildcardWrappers {
    pub(crate) wrappers: Vec<Arc<MappedWrapper>>,
    pub(crate) nesting: usize,
}

/// One version of one context: the unit the wrapper stage resolves against.
pub(crate) struct ContextVersion {
    /// Version label; the sort key within the owning context.
    pub(crate) name: String,
    /// Context path ("" for the root context).
    pub(crate) path: String,
    pub(crate) slash_count: usize,
    pub(crate) handle: ContextHandle,
    pub(crate) resources: Option<Arc<dyn ResourceProvider>>,
    /// Welcome files in registration order; order is significant.
    pub(crate) welcome_files: ArcSwap<Vec<String>>,
    pub(crate) default_wrapper: ArcSwapOption<MappedWrapper>,
    pub(crate) exact_wrappers: ArcSwap<Vec<Arc<MappedWrapper>>>,
    pub(crate) wildcard_wrappers: ArcSwap<WildcardWrappers>,
    pub(crate) extension_wrappers: ArcSwap<Vec<Arc<MappedWrapper>>>,
    /// Serializes wrapper and welcome-file mutations within this version.
    pub(crate) write_lock: Mutex<()>,
}

impl ContextVersion {
    pub(crate) fn new(
        version: &str,
        path: &str,
        slash_count: usize,
        handle: ContextHandle,
        welcome_files: &[String],
        resources: Option<Arc<dyn ResourceProvider>>,
    ) -> Self {
        Self {
            name: version.to_string(),
            path: path.to_string(),
            slash_count,
            handle,
            resources,
            welcome_files: ArcSwap::from_pointee(welcome_files.to_vec()),
            default_wrapper: ArcSwapOption::empty(),
            exact_wrappers: ArcSwap::from_pointee(Vec::new()),
            wildcard_wrappers: ArcSwap::from_pointee(WildcardWrappers::default()),
            extension_wrappers: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }
}

impl MapElement for ContextVersion {
    fn name(&self) -> &str {
        &self.name
    }
}

/// One handler mapping. The name is the match key after classification:
/// the stripped prefix for wildcards, the stripped extension for extension
/// mappings, the literal path for exact mappings.
pub(crate) struct MappedWrapper {
    pub(crate) name: String,
    pub(crate) handle: WrapperHandle,
    /// The wrapper is the JSP servlet reached through a wildcard pattern;
    /// directory requests matching it fall through to welcome files.
    pub(crate) jsp_wildcard: bool,
    /// The mapping only applies when a physical resource backs the path.
    pub(crate) resource_only: bool,
}

impl MappedWrapper {
    pub(crate) fn new(
        name: &str,
        handle: WrapperHandle,
        jsp_wildcard: bool,
        resource_only: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            handle,
            jsp_wildcard,
            resource_only,
        }
    }
}

impl MapElement for MappedWrapper {
    fn name(&self) -> &str {
        &self.name
    }
}
