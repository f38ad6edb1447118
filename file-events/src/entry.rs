//! File system entries implicated by raw events.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A handle to a path on disk.
///
/// Entries are snapshots: the directory flag is captured when the entry is
/// built, so an entry for a path that has since been deleted still knows what
/// it used to be.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path to the entry.
    path: PathBuf,

    /// Whether the entry is a directory.
    is_directory: bool,
}

impl FileEntry {
    /// Build an entry by probing the file system.
    ///
    /// Missing paths are treated as files.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_directory = path.is_dir();
        Self { path, is_directory }
    }

    /// Build a file entry without touching the disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
        }
    }

    /// Build a directory entry without touching the disk.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_directory: true,
        }
    }

    pub(crate) fn from_walk_entry(entry: &walkdir::DirEntry) -> Self {
        Self {
            path: entry.path().to_path_buf(),
            is_directory: entry.file_type().is_dir(),
        }
    }

    /// Path of the entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }

    /// Whether the entry holds binary rather than text content.
    ///
    /// Decided from the extension alone so that entries for deleted files can
    /// still be classified.
    pub fn is_binary(&self) -> bool {
        !self.is_directory && self.extension().is_some_and(|ext| is_binary_extension(&ext))
    }
}

fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        // Documents
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx"
        // Images
        | "png" | "jpg" | "jpeg" | "gif" | "webp" | "ico" | "bmp"
        // Audio/Video
        | "mp3" | "wav" | "mp4" | "webm"
        // Archives
        | "zip" | "tar" | "gz" | "jar" | "war" | "7z"
        // Compiled
        | "class" | "pyc" | "pyo" | "o" | "a" | "so" | "dll" | "dylib" | "exe" | "wasm"
    )
}
