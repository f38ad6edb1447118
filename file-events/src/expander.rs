//! Expansion of directory events into the files they affect.

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{InclusionPolicy, PipelineConfig};
use crate::entry::FileEntry;

/// Expands entries into the concrete, eligible files they imply.
#[derive(Debug, Clone)]
pub struct DirectoryExpander {
    policy: InclusionPolicy,
    follow_symlinks: bool,
    max_depth: Option<usize>,
}

impl DirectoryExpander {
    pub fn new(policy: InclusionPolicy) -> Self {
        Self {
            policy,
            follow_symlinks: false,
            max_depth: None,
        }
    }

    /// Build an expander from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            policy: config.inclusion.clone(),
            follow_symlinks: config.follow_symlinks,
            max_depth: config.max_depth,
        }
    }

    /// Expand `entry`.
    ///
    /// A file yields itself if the inclusion policy accepts it. A directory is
    /// walked recursively; `keep_going` is asked before every visited node and
    /// the walk ends for good as soon as it returns `false`.
    pub fn expand<F>(&self, entry: &FileEntry, keep_going: F) -> Expansion<'_, F>
    where
        F: FnMut() -> bool,
    {
        let state = if entry.is_directory() {
            let walker = WalkDir::new(entry.path())
                .follow_links(self.follow_symlinks)
                .max_depth(self.max_depth.unwrap_or(usize::MAX));
            ExpansionState::Walk(walker.into_iter())
        } else {
            ExpansionState::Single(Some(entry.clone()))
        };

        Expansion {
            policy: &self.policy,
            state,
            keep_going,
            stopped: false,
        }
    }
}

enum ExpansionState {
    Single(Option<FileEntry>),
    Walk(walkdir::IntoIter),
}

/// Lazy sequence of expanded files, in enumeration order.
///
/// The sequence is finite and cannot be restarted.
pub struct Expansion<'a, F> {
    policy: &'a InclusionPolicy,
    state: ExpansionState,
    keep_going: F,
    stopped: bool,
}

impl<F> Expansion<'_, F> {
    /// Whether the walk ended because `keep_going` returned `false`.
    pub fn was_interrupted(&self) -> bool {
        self.stopped
    }
}

impl<F> Iterator for Expansion<'_, F>
where
    F: FnMut() -> bool,
{
    type Item = FileEntry;

    fn next(&mut self) -> Option<FileEntry> {
        loop {
            if self.stopped {
                return None;
            }
            if !(self.keep_going)() {
                debug!("Expansion interrupted: owning scope is no longer valid");
                self.stopped = true;
                return None;
            }

            let entry = match &mut self.state {
                ExpansionState::Single(entry) => entry.take()?,
                ExpansionState::Walk(walker) => match walker.next()? {
                    Ok(dir_entry) => FileEntry::from_walk_entry(&dir_entry),
                    Err(e) if is_not_found(&e) => {
                        debug!("Entry vanished during expansion: {e}");
                        continue;
                    }
                    Err(e) => {
                        warn!("Skipping unreadable entry during expansion: {e}");
                        continue;
                    }
                },
            };

            if self.policy.includes(&entry) {
                return Some(entry);
            }
        }
    }
}

/// Missing entries are expected, e.g. a directory deleted before the walk.
fn is_not_found(error: &walkdir::Error) -> bool {
    error
        .io_error()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub/folder")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("main.py"), "content").unwrap();
        fs::write(root.join("notes.txt"), "content").unwrap();
        fs::write(root.join("sub/folder/subfile.py"), "content").unwrap();
        fs::write(root.join("sub/folder/readme.md"), "content").unwrap();
        fs::write(root.join("sub/util.py"), "content").unwrap();
        temp_dir
    }

    fn paths(expansion: impl Iterator<Item = FileEntry>) -> Vec<PathBuf> {
        let mut paths: Vec<_> = expansion.map(|e| e.path().to_path_buf()).collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_directory_expands_to_eligible_files() {
        let temp_dir = tree();
        let root = temp_dir.path();
        let expander = DirectoryExpander::new(InclusionPolicy::default());

        let found = paths(expander.expand(&FileEntry::directory(root), || true));

        assert_eq!(
            found,
            vec![
                root.join("main.py"),
                root.join("sub/folder/subfile.py"),
                root.join("sub/util.py"),
            ]
        );
    }

    #[test]
    fn test_all_policy_expands_every_file() {
        let temp_dir = tree();
        let expander = DirectoryExpander::new(InclusionPolicy::All);

        let found = paths(expander.expand(&FileEntry::directory(temp_dir.path()), || true));
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn test_file_passes_through_policy() {
        let expander = DirectoryExpander::new(InclusionPolicy::default());

        let py = FileEntry::file("/gone/main.py");
        let txt = FileEntry::file("/gone/file.txt");

        assert_eq!(expander.expand(&py, || true).collect::<Vec<_>>(), vec![py.clone()]);
        assert_eq!(expander.expand(&txt, || true).count(), 0);
    }

    #[test]
    fn test_empty_and_missing_directories_expand_to_nothing() {
        let temp_dir = tree();
        let expander = DirectoryExpander::new(InclusionPolicy::All);

        let empty = FileEntry::directory(temp_dir.path().join("empty"));
        let missing = FileEntry::directory(temp_dir.path().join("missing"));

        assert_eq!(expander.expand(&empty, || true).count(), 0);
        assert_eq!(expander.expand(&missing, || true).count(), 0);
    }

    #[test]
    fn test_missing_root_is_reported_as_not_found() {
        let temp_dir = tree();
        let error = WalkDir::new(temp_dir.path().join("missing"))
            .into_iter()
            .find_map(std::result::Result::err)
            .unwrap();

        assert!(is_not_found(&error));
    }

    #[test]
    fn test_expansion_stops_when_scope_becomes_invalid() {
        let temp_dir = tree();
        let expander = DirectoryExpander::new(InclusionPolicy::All);

        let mut budget = 2;
        let mut expansion = expander.expand(&FileEntry::directory(temp_dir.path()), || {
            budget -= 1;
            budget >= 0
        });

        // The root directory and at most one more node are visited.
        assert!(expansion.by_ref().count() <= 1);
        assert!(expansion.was_interrupted());
        assert_eq!(expansion.next(), None);
    }

    #[test]
    fn test_max_depth_limits_the_walk() {
        let temp_dir = tree();
        let config = PipelineConfig::new().with_max_depth(1);
        let expander = DirectoryExpander::from_config(&config);

        let found = paths(expander.expand(&FileEntry::directory(temp_dir.path()), || true));
        assert_eq!(found, vec![temp_dir.path().join("main.py")]);
    }
}
