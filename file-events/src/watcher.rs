//! OS file system watcher feeding the pipeline.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::error::{FileEventsError, Result};
use crate::event::RawEvent;
use crate::listener::VfsListener;

/// Watches directories with `notify` and forwards their changes.
///
/// Notify only reports finished mutations, so batches are forwarded as
/// [`crate::EventPhase::Settled`]. One notify event becomes one batch.
pub struct DirectoryWatcher {
    /// Watched directories.
    roots: HashSet<PathBuf>,

    /// Internal notify watcher.
    watcher: Option<RecommendedWatcher>,

    /// Where batches are submitted.
    listener: VfsListener,
}

impl DirectoryWatcher {
    /// Create a stopped watcher.
    pub fn new(listener: VfsListener) -> Self {
        Self {
            roots: HashSet::new(),
            watcher: None,
            listener,
        }
    }

    /// Start the notify watcher and watch every registered directory.
    pub fn start(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }

        let listener = self.listener.clone();
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let raw = RawEvent::from_notify(&event);
                    if raw.is_empty() {
                        return;
                    }
                    if let Err(e) = listener.settled(raw) {
                        warn!("Dropping file system event: {e}");
                    }
                }
                Err(e) => {
                    error!("Watch error: {e}");
                }
            },
        )?;

        for root in &self.roots {
            match watcher.watch(root, RecursiveMode::Recursive) {
                Ok(()) => debug!("Started watching: {}", root.display()),
                Err(e) => warn!("Failed to watch {}: {e}", root.display()),
            }
        }

        self.watcher = Some(watcher);
        info!("Directory watcher started");
        Ok(())
    }

    /// Add a directory to watch.
    pub fn watch(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();

        if !path.is_dir() {
            return Err(FileEventsError::DirectoryNotFound(path.display().to_string()));
        }
        if self.roots.contains(&path) {
            return Err(FileEventsError::AlreadyWatching(path.display().to_string()));
        }

        if let Some(ref mut watcher) = self.watcher {
            watcher.watch(&path, RecursiveMode::Recursive)?;
        }

        info!("Adding directory to watch: {}", path.display());
        self.roots.insert(path);
        Ok(())
    }

    /// Stop watching a directory.
    pub fn unwatch(&mut self, path: &Path) -> Result<()> {
        if !self.roots.remove(path) {
            return Err(FileEventsError::DirectoryNotFound(path.display().to_string()));
        }

        if let Some(ref mut watcher) = self.watcher
            && let Err(e) = watcher.unwatch(path)
        {
            warn!("Failed to unwatch {}: {e}", path.display());
        }

        info!("Removed directory from watch: {}", path.display());
        Ok(())
    }

    /// Stop the notify watcher. Registered directories are kept.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            for root in &self.roots {
                let _ = watcher.unwatch(root);
            }
            info!("Directory watcher stopped");
        }
    }

    /// Whether the watcher is running.
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Watched directories.
    pub fn watched(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
