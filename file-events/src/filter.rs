//! Relevance filtering of file entries.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::entry::FileEntry;
use crate::host::ProjectHost;

/// Decides whether an entry can produce a module file event.
///
/// Directories are inputs to expansion, never outputs, and project or
/// workspace metadata is never delivered. The metadata lookup can be costly
/// on the host side, so answers are memoized for the lifetime of the filter,
/// which is one pipeline run.
pub struct EventFilter<'a> {
    host: &'a dyn ProjectHost,
    metadata: HashMap<PathBuf, bool>,
}

impl<'a> EventFilter<'a> {
    pub fn new(host: &'a dyn ProjectHost) -> Self {
        Self {
            host,
            metadata: HashMap::new(),
        }
    }

    /// Whether the entry is project or workspace metadata.
    pub fn is_project_metadata(&mut self, entry: &FileEntry) -> bool {
        if let Some(&cached) = self.metadata.get(entry.path()) {
            return cached;
        }
        let is_metadata = self.host.is_project_metadata(entry);
        self.metadata.insert(entry.path().to_path_buf(), is_metadata);
        is_metadata
    }

    /// Whether the entry may be delivered as a file event.
    pub fn is_relevant(&mut self, entry: &FileEntry) -> bool {
        !entry.is_directory() && !self.is_project_metadata(entry)
    }
}
