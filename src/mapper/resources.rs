//! Physical-resource probes used by welcome-file and redirect rules.

use std::collections::HashMap;
use std::path::PathBuf;

/// What a context-relative path names on the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    Directory,
}

/// Capability handed to the mapper at context registration. The mapper only
/// ever asks whether a path exists and whether it is a file or a directory;
/// paths are context-relative and start with `/`.
pub trait ResourceProvider: Send + Sync {
    fn get_resource(&self, path: &str) -> Option<ResourceKind>;
}

/// Fixed in-memory resource set, for tests and programmatic deployments.
#[derive(Debug, Default)]
pub struct StaticResources {
    entries: HashMap<String, ResourceKind>,
}

impl StaticResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str) -> Self {
        self.entries.insert(path.to_string(), ResourceKind::File);
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.entries
            .insert(path.to_string(), ResourceKind::Directory);
        self
    }
}

impl ResourceProvider for StaticResources {
    fn get_resource(&self, path: &str) -> Option<ResourceKind> {
        self.entries.get(path).copied()
    }
}

/// Document root on the local filesystem.
#[derive(Debug)]
pub struct FsResources {
    root: PathBuf,
}

impl FsResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceProvider for FsResources {
    fn get_resource(&self, path: &str) -> Option<ResourceKind> {
        let meta = std::fs::metadata(self.root.join(path.trim_start_matches('/'))).ok()?;
        if meta.is_dir() {
            Some(ResourceKind::Directory)
        } else {
            Some(ResourceKind::File)
        }
    }
}
