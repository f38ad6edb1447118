//! Raw file system events and the normalized events delivered to engines.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use notify::event::{ModifyKind, RemoveKind, RenameMode};
use serde::{Deserialize, Serialize};

use crate::entry::FileEntry;
use crate::error::{FileEventsError, Result};
use crate::host::Module;

/// An unprocessed file system mutation reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// An entry was created.
    Created(FileEntry),

    /// An entry was deleted.
    Deleted(FileEntry),

    /// File content changed.
    Modified(FileEntry),

    /// An entry was moved from one location to another.
    Moved { from: FileEntry, to: FileEntry },

    /// An entry was copied; `to` is the newly created entry.
    Copied { from: FileEntry, to: FileEntry },

    /// A property of the entry (name, permissions, ...) changed.
    PropertyChanged { entry: FileEntry, property: String },
}

impl RawEvent {
    /// The entry the event is about once it is classified as `kind`.
    ///
    /// Copies always concern the created destination. Moves concern the old
    /// location when seen as a deletion and the new one otherwise.
    pub fn primary_entry(&self, kind: ModuleFileEventKind) -> &FileEntry {
        match self {
            Self::Created(entry) | Self::Deleted(entry) | Self::Modified(entry) => entry,
            Self::PropertyChanged { entry, .. } => entry,
            Self::Copied { to, .. } => to,
            Self::Moved { from, to } => match kind {
                ModuleFileEventKind::Deleted => from,
                ModuleFileEventKind::Created | ModuleFileEventKind::Modified => to,
            },
        }
    }

    /// Convert a notify event into raw events.
    ///
    /// Notify reports mutations after they happened, so removed paths can no
    /// longer be probed and are classified from the event kind instead.
    pub fn from_notify(event: &notify::Event) -> Vec<RawEvent> {
        use notify::EventKind;

        match event.kind {
            EventKind::Create(_) => event
                .paths
                .iter()
                .map(|p| Self::Created(FileEntry::from_path(p)))
                .collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
                [from, to] => vec![
                    Self::Deleted(FileEntry::file(from)),
                    Self::Created(FileEntry::from_path(to)),
                ],
                _ => Vec::new(),
            },
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => event
                .paths
                .iter()
                .map(|p| Self::Deleted(FileEntry::file(p)))
                .collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
                .paths
                .iter()
                .map(|p| Self::Created(FileEntry::from_path(p)))
                .collect(),
            // Renames reported without a side (FSEvents) are resolved on disk.
            EventKind::Modify(ModifyKind::Name(_)) => event
                .paths
                .iter()
                .map(|p| {
                    if p.exists() {
                        Self::Created(FileEntry::from_path(p))
                    } else {
                        Self::Deleted(FileEntry::file(p))
                    }
                })
                .collect(),
            EventKind::Modify(ModifyKind::Metadata(kind)) => event
                .paths
                .iter()
                .map(|p| Self::PropertyChanged {
                    entry: FileEntry::from_path(p),
                    property: format!("{kind:?}").to_lowercase(),
                })
                .collect(),
            EventKind::Modify(_) => event
                .paths
                .iter()
                .map(|p| Self::Modified(FileEntry::from_path(p)))
                .collect(),
            EventKind::Remove(RemoveKind::Folder) => event
                .paths
                .iter()
                .map(|p| Self::Deleted(FileEntry::directory(p)))
                .collect(),
            EventKind::Remove(_) => event
                .paths
                .iter()
                .map(|p| Self::Deleted(FileEntry::file(p)))
                .collect(),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
        }
    }
}

/// Kind of change delivered to an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleFileEventKind {
    /// File was created.
    Created,

    /// File was deleted.
    Deleted,

    /// File was modified.
    Modified,
}

/// When, relative to the mutation, raw events are observed.
///
/// The same raw event means different things before and after the host
/// applies it: a move seen before it happens removes the old file, seen after
/// it creates the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    /// The mutation is about to be applied; old files are still on disk.
    BeforeMutation,

    /// The mutation has just been applied.
    AfterMutation,

    /// Only finished mutations are observed (e.g. OS watchers).
    Settled,
}

impl EventPhase {
    /// Classify a raw event, or `None` if it is not tracked in this phase.
    pub fn classify(self, event: &RawEvent) -> Option<ModuleFileEventKind> {
        use ModuleFileEventKind::{Created, Deleted, Modified};

        match (self, event) {
            (_, RawEvent::PropertyChanged { .. }) => None,

            (Self::BeforeMutation, RawEvent::Deleted(_) | RawEvent::Moved { .. }) => Some(Deleted),
            (Self::BeforeMutation, _) => None,

            (Self::AfterMutation, RawEvent::Created(_)) => Some(Created),
            (Self::AfterMutation, RawEvent::Copied { .. } | RawEvent::Moved { .. }) => Some(Created),
            (Self::AfterMutation, RawEvent::Modified(_)) => Some(Modified),
            (Self::AfterMutation, RawEvent::Deleted(_)) => None,

            (Self::Settled, RawEvent::Created(_)) => Some(Created),
            (Self::Settled, RawEvent::Copied { .. } | RawEvent::Moved { .. }) => Some(Created),
            (Self::Settled, RawEvent::Modified(_)) => Some(Modified),
            (Self::Settled, RawEvent::Deleted(_)) => Some(Deleted),
        }
    }
}

/// A normalized, module-scoped file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFileEvent {
    /// Module owning the file.
    pub module: Module,

    /// The kind of change.
    pub kind: ModuleFileEventKind,

    /// Path relative to the module content root, `/`-separated.
    pub relative_path: String,

    /// Handle to the file content.
    pub content: FileContent,

    /// When the event was produced.
    pub timestamp: DateTime<Utc>,
}

impl ModuleFileEvent {
    /// Build an event for `entry`, or `None` if the entry lies outside the
    /// module content root.
    pub fn new(module: &Module, entry: &FileEntry, kind: ModuleFileEventKind) -> Option<Self> {
        let relative_path = relative_path(module.content_root(), entry.path())?;
        Some(Self {
            module: module.clone(),
            kind,
            relative_path,
            content: FileContent::new(entry),
            timestamp: Utc::now(),
        })
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        self.content.path()
    }
}

/// Lazy handle to the content of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileContent {
    path: PathBuf,
    is_binary: bool,
}

impl FileContent {
    fn new(entry: &FileEntry) -> Self {
        Self {
            path: entry.path().to_path_buf(),
            is_binary: entry.is_binary(),
        }
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file holds binary content.
    pub fn is_binary(&self) -> bool {
        self.is_binary
    }

    /// Read the raw bytes.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Read the content as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.bytes()?)
            .map_err(|_| FileEventsError::NotText(self.path.display().to_string()))
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
