//! Seams to the host environment: projects, modules and analysis engines.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entry::FileEntry;
use crate::event::ModuleFileEvent;

/// Identity of an open project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a module, unique within its project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A logical grouping of source files within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Module {
    id: ModuleId,
    project: ProjectId,
    content_root: PathBuf,
}

impl Module {
    pub fn new(id: ModuleId, project: ProjectId, content_root: impl Into<PathBuf>) -> Self {
        Self {
            id,
            project,
            content_root: content_root.into(),
        }
    }

    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// Project the module belongs to.
    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Directory relative paths are computed from.
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Whether the module content root contains `path`.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.content_root)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.id)
    }
}

/// Lookups the pipeline needs from the host environment.
///
/// Every call must reflect the current state of the host: the pipeline never
/// caches answers across runs because projects close and engines start or
/// stop independently of file events.
pub trait ProjectHost: Send + Sync {
    /// Open projects, in a stable enumeration order.
    fn open_projects(&self) -> Vec<ProjectId>;

    /// Whether the project has been disposed (closed or closing).
    fn is_disposed(&self, project: &ProjectId) -> bool;

    /// Module of `project` owning `entry`, if any.
    fn find_module(&self, project: &ProjectId, entry: &FileEntry) -> Option<Module>;

    /// Engine started for `project`, if any.
    fn engine_if_started(&self, project: &ProjectId) -> Option<EngineHandle>;

    /// Whether `entry` is project or workspace metadata.
    fn is_project_metadata(&self, entry: &FileEntry) -> bool;
}

/// Downstream analysis engine consuming module file events.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Name of this engine, for diagnostics.
    fn name(&self) -> &str;

    /// Handle the file changes of one module, in order.
    async fn on_module_file_events(
        &self,
        module: &Module,
        events: Vec<ModuleFileEvent>,
    ) -> anyhow::Result<()>;
}

/// Reference to a started engine.
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<dyn AnalysisEngine>,
}

impl EngineHandle {
    pub fn new(engine: Arc<dyn AnalysisEngine>) -> Self {
        Self { engine }
    }

    pub fn name(&self) -> &str {
        self.engine.name()
    }

    pub fn engine(&self) -> &Arc<dyn AnalysisEngine> {
        &self.engine
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("engine", &self.engine.name())
            .finish()
    }
}
