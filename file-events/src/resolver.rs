//! Attribution of files to their owning module.

use crate::entry::FileEntry;
use crate::host::{Module, ProjectHost, ProjectId};

/// Maps files to the module that owns them among the open projects.
pub struct ModuleResolver<'a> {
    host: &'a dyn ProjectHost,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(host: &'a dyn ProjectHost) -> Self {
        Self { host }
    }

    /// Find the owning module of `entry`.
    ///
    /// Projects are asked in the order given; the first one claiming the file
    /// wins. Projects disposed since `open_projects` was captured are skipped.
    pub fn resolve(&self, entry: &FileEntry, open_projects: &[ProjectId]) -> Option<Module> {
        open_projects
            .iter()
            .filter(|project| !self.host.is_disposed(project))
            .find_map(|project| self.host.find_module(project, entry))
    }
}
