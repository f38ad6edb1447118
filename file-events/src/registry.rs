//! In-memory project registry implementing [`ProjectHost`].

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::MetadataMatcher;
use crate::entry::FileEntry;
use crate::host::{AnalysisEngine, EngineHandle, Module, ModuleId, ProjectHost, ProjectId};

#[derive(Default)]
struct ProjectState {
    modules: Vec<Module>,
    engine: Option<EngineHandle>,
    disposed: bool,
}

/// Registry of open projects, their modules and started engines.
///
/// Projects are enumerated in the order they were opened. Lookups are
/// answered from the live state, so a project disposed between two pipeline
/// runs is never consulted by the second one.
pub struct ProjectRegistry {
    projects: RwLock<IndexMap<ProjectId, ProjectState>>,
    metadata: MetadataMatcher,
}

impl ProjectRegistry {
    /// Create an empty registry.
    pub fn new(metadata: MetadataMatcher) -> Self {
        Self {
            projects: RwLock::new(IndexMap::new()),
            metadata,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<ProjectId, ProjectState>> {
        self.projects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<ProjectId, ProjectState>> {
        self.projects.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a project. Reopening a disposed project revives it.
    pub fn open_project(&self, project: ProjectId) {
        info!("Opening project: {project}");
        let mut projects = self.write();
        let state = projects.entry(project).or_default();
        state.disposed = false;
    }

    /// Mark a project as disposed while keeping it registered.
    pub fn dispose_project(&self, project: &ProjectId) {
        if let Some(state) = self.write().get_mut(project) {
            state.disposed = true;
            debug!("Disposed project: {project}");
        }
    }

    /// Close a project and forget its modules and engine.
    pub fn close_project(&self, project: &ProjectId) {
        if self.write().shift_remove(project).is_some() {
            info!("Closed project: {project}");
        }
    }

    /// Register a module under an open project.
    ///
    /// Returns `None` if the project is not open.
    pub fn add_module(
        &self,
        project: &ProjectId,
        id: ModuleId,
        content_root: impl Into<std::path::PathBuf>,
    ) -> Option<Module> {
        let mut projects = self.write();
        let state = projects.get_mut(project)?;
        let module = Module::new(id, project.clone(), content_root);
        debug!(
            "Added module {module} with content root {}",
            module.content_root().display()
        );
        state.modules.push(module.clone());
        Some(module)
    }

    /// Attach a started engine to a project.
    pub fn start_engine(&self, project: &ProjectId, engine: Arc<dyn AnalysisEngine>) -> bool {
        match self.write().get_mut(project) {
            Some(state) => {
                info!("Engine {} started for project {project}", engine.name());
                state.engine = Some(EngineHandle::new(engine));
                true
            }
            None => false,
        }
    }

    /// Detach the engine of a project.
    pub fn stop_engine(&self, project: &ProjectId) {
        if let Some(state) = self.write().get_mut(project)
            && let Some(engine) = state.engine.take()
        {
            info!("Engine {} stopped for project {project}", engine.name());
        }
    }
}

impl Default for ProjectRegistry {
    fn default() -> Self {
        Self::new(MetadataMatcher::default())
    }
}

impl ProjectHost for ProjectRegistry {
    fn open_projects(&self) -> Vec<ProjectId> {
        self.read()
            .iter()
            .filter(|(_, state)| !state.disposed)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn is_disposed(&self, project: &ProjectId) -> bool {
        self.read().get(project).is_none_or(|state| state.disposed)
    }

    fn find_module(&self, project: &ProjectId, entry: &FileEntry) -> Option<Module> {
        let projects = self.read();
        let state = projects.get(project)?;
        state
            .modules
            .iter()
            .filter(|m| m.contains(entry.path()))
            .max_by_key(|m| m.content_root().components().count())
            .cloned()
    }

    fn engine_if_started(&self, project: &ProjectId) -> Option<EngineHandle> {
        let projects = self.read();
        let state = projects.get(project)?;
        if state.disposed {
            return None;
        }
        state.engine.clone()
    }

    fn is_project_metadata(&self, entry: &FileEntry) -> bool {
        self.metadata.matches(entry.path())
    }
}
