//! Configuration types for file event propagation.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entry::FileEntry;
use crate::error::{FileEventsError, Result};

/// Configuration for the file events pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Which expanded files are forwarded to engines.
    pub inclusion: InclusionPolicy,

    /// Glob patterns identifying project/workspace metadata files.
    pub metadata_patterns: Vec<String>,

    /// Whether directory expansion follows symbolic links.
    pub follow_symlinks: bool,

    /// Maximum depth of directory expansion (None = unlimited).
    pub max_depth: Option<usize>,

    /// How long shutdown waits for queued work to drain.
    pub drain_timeout_ms: u64,
}

impl PipelineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            inclusion: InclusionPolicy::default(),
            metadata_patterns: MetadataMatcher::default_patterns(),
            follow_symlinks: false,
            max_depth: None,
            drain_timeout_ms: 5_000,
        }
    }

    /// Set the inclusion policy.
    pub fn with_inclusion(mut self, inclusion: InclusionPolicy) -> Self {
        self.inclusion = inclusion;
        self
    }

    /// Add a metadata pattern.
    pub fn metadata(mut self, pattern: impl Into<String>) -> Self {
        self.metadata_patterns.push(pattern.into());
        self
    }

    /// Set the maximum expansion depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Enable following symbolic links during expansion.
    pub fn follow_symlinks(mut self) -> Self {
        self.follow_symlinks = true;
        self
    }

    /// Set the shutdown drain timeout.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Shutdown drain timeout.
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Compile the metadata patterns.
    pub fn metadata_matcher(&self) -> Result<MetadataMatcher> {
        MetadataMatcher::new(&self.metadata_patterns)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Which files found by expansion are eligible for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InclusionPolicy {
    /// Every file.
    All,

    /// Every file with text content.
    Text,

    /// Files with one of the given extensions (case-insensitive, no dot).
    Extensions { extensions: Vec<String> },
}

impl InclusionPolicy {
    /// Restrict delivery to the given extensions.
    pub fn extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Extensions {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Check whether a file is eligible.
    pub fn includes(&self, entry: &FileEntry) -> bool {
        if entry.is_directory() {
            return false;
        }
        match self {
            Self::All => true,
            Self::Text => !entry.is_binary(),
            Self::Extensions { extensions } => entry
                .extension()
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))),
        }
    }
}

impl Default for InclusionPolicy {
    fn default() -> Self {
        Self::extensions(["py"])
    }
}

/// Compiled glob patterns for project/workspace metadata.
#[derive(Debug, Clone)]
pub struct MetadataMatcher {
    patterns: Vec<glob::Pattern>,
}

impl MetadataMatcher {
    /// Compile the given patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p.as_ref()).map_err(|e| FileEventsError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Get default metadata patterns.
    pub fn default_patterns() -> Vec<String> {
        vec![
            // IntelliJ project model
            "**/.idea/**".to_string(),
            "**/*.iml".to_string(),
            "**/*.ipr".to_string(),
            "**/*.iws".to_string(),
            // Editor workspaces
            "**/.vscode/**".to_string(),
        ]
    }

    /// Check if a path is project/workspace metadata.
    pub fn matches(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.patterns.iter().any(|p| p.matches(&path_str))
    }
}

impl Default for MetadataMatcher {
    fn default() -> Self {
        let patterns = MetadataMatcher::default_patterns()
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();
        Self { patterns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_policy_only_accepts_python() {
        let policy = InclusionPolicy::default();

        assert!(policy.includes(&FileEntry::file("/src/main.py")));
        assert!(policy.includes(&FileEntry::file("/src/MAIN.PY")));
        assert!(!policy.includes(&FileEntry::file("/src/file.txt")));
        assert!(!policy.includes(&FileEntry::directory("/src/pkg.py")));
    }

    #[test]
    fn test_text_policy_skips_binaries() {
        let policy = InclusionPolicy::Text;

        assert!(policy.includes(&FileEntry::file("/src/Program.cs")));
        assert!(!policy.includes(&FileEntry::file("/src/logo.png")));
        assert!(InclusionPolicy::All.includes(&FileEntry::file("/src/logo.png")));
    }

    #[test]
    fn test_metadata_patterns() {
        let matcher = MetadataMatcher::default();

        assert!(matcher.matches(Path::new("/project/.idea/workspace.xml")));
        assert!(matcher.matches(Path::new("/project/module.iml")));
        assert!(!matcher.matches(Path::new("/project/src/main.py")));
    }

    #[test]
    fn test_invalid_metadata_pattern_is_rejected() {
        let result = MetadataMatcher::new(&["**/[.idea"]);
        assert!(matches!(result, Err(FileEventsError::InvalidPattern { .. })));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file-events.json");

        let config = PipelineConfig::new()
            .with_inclusion(InclusionPolicy::extensions([".PY", "pyi"]))
            .with_max_depth(8)
            .with_drain_timeout(Duration::from_secs(2));
        config.save(&path).unwrap();

        let loaded = PipelineConfig::load(&path).unwrap();
        assert_eq!(loaded.inclusion, InclusionPolicy::extensions(["py", "pyi"]));
        assert_eq!(loaded.max_depth, Some(8));
        assert_eq!(loaded.drain_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"inclusion":{"mode":"all"}}"#).unwrap();

        assert_eq!(config.inclusion, InclusionPolicy::All);
        assert_eq!(config.metadata_patterns, MetadataMatcher::default_patterns());
        assert_eq!(config.drain_timeout_ms, 5_000);
    }
}
