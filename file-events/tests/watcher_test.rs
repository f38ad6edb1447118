//! End-to-end test from the OS watcher to an engine.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codex_file_events::{
    AnalysisEngine, DirectoryWatcher, EngineNotifier, FileEventsPipeline, Module, ModuleFileEvent,
    ModuleId, PipelineConfig, ProjectId, ProjectRegistry, SequencedWorker, VfsListener,
};
use tempfile::TempDir;

#[derive(Default)]
struct CollectingEngine {
    paths: tokio::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl AnalysisEngine for CollectingEngine {
    fn name(&self) -> &str {
        "collecting"
    }

    async fn on_module_file_events(
        &self,
        _module: &Module,
        events: Vec<ModuleFileEvent>,
    ) -> anyhow::Result<()> {
        self.paths
            .lock()
            .await
            .extend(events.into_iter().map(|e| e.relative_path));
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watched_file_creation_reaches_engine() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("pkg")).unwrap();

    let registry = Arc::new(ProjectRegistry::default());
    let project = ProjectId::new("project");
    registry.open_project(project.clone());
    registry.add_module(&project, ModuleId::new("module"), &root);
    let engine = Arc::new(CollectingEngine::default());
    registry.start_engine(&project, engine.clone());

    let pipeline = FileEventsPipeline::new(
        registry,
        Arc::new(EngineNotifier::spawn()),
        &PipelineConfig::default(),
    );
    let worker = Arc::new(SequencedWorker::spawn(pipeline));
    let mut watcher = DirectoryWatcher::new(VfsListener::new(worker.clone()));
    watcher.watch(&root).unwrap();
    watcher.start().unwrap();

    fs::write(root.join("pkg/watched.py"), "content").unwrap();
    fs::write(root.join("pkg/ignored.txt"), "content").unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            {
                let paths = engine.paths.lock().await;
                if paths.iter().any(|p| p == "pkg/watched.py") {
                    return paths.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    assert!(seen.iter().all(|p| p == "pkg/watched.py"));

    watcher.stop();
    worker.shutdown(Duration::from_secs(1)).await;
}
