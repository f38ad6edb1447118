//! Single-consumer worker serializing pipeline runs.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{FileEventsError, Result};
use crate::event::{ModuleFileEventKind, RawEvent};
use crate::pipeline::FileEventsPipeline;

/// Classifies raw events for one submitted batch.
pub type EventKindMapper = Box<dyn Fn(&RawEvent) -> Option<ModuleFileEventKind> + Send>;

enum Job {
    Forward {
        events: Vec<RawEvent>,
        kind_of: EventKindMapper,
    },
    Barrier(oneshot::Sender<()>),
}

/// Runs submitted batches one at a time, in submission order.
///
/// Submitting never blocks. All producers share one queue, so if batch A is
/// enqueued before batch B, A is fully expanded, resolved and dispatched
/// before B starts, whichever threads submitted them.
pub struct SequencedWorker {
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SequencedWorker {
    /// Spawn the consumer task on the current tokio runtime.
    pub fn spawn(pipeline: FileEventsPipeline) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let task = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Forward { events, kind_of } => {
                        let pipeline = pipeline.clone();
                        // Expansion reads the file system; keep it off the async workers.
                        let run = tokio::task::spawn_blocking(move || pipeline.run(&events, &*kind_of));
                        if let Err(e) = run.await {
                            error!("File events run failed: {e}");
                        }
                    }
                    Job::Barrier(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("File events worker drained");
        });

        Self {
            tx: Mutex::new(Some(tx)),
            task: Mutex::new(Some(task)),
        }
    }

    fn send(&self, job: Job) -> Result<()> {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = tx.as_ref().ok_or(FileEventsError::WorkerShutdown)?;
        tx.send(job).map_err(|_| FileEventsError::WorkerShutdown)
    }

    /// Enqueue a batch of raw events.
    pub fn submit<F>(&self, events: Vec<RawEvent>, kind_of: F) -> Result<()>
    where
        F: Fn(&RawEvent) -> Option<ModuleFileEventKind> + Send + 'static,
    {
        self.send(Job::Forward {
            events,
            kind_of: Box::new(kind_of),
        })
    }

    /// Wait until every batch submitted before this call has been processed.
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Job::Barrier(done_tx))?;
        done_rx.await.map_err(|_| FileEventsError::WorkerShutdown)
    }

    /// Whether the worker still accepts submissions.
    pub fn is_running(&self) -> bool {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Stop accepting submissions and let queued work drain.
    ///
    /// The consumer is aborted if it has not drained within `drain`; a run in
    /// progress at that point is left to finish in the background.
    pub async fn shutdown(&self, drain: Duration) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        drop(tx);

        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(mut task) = task else {
            return;
        };

        match tokio::time::timeout(drain, &mut task).await {
            Ok(Ok(())) => info!("File events worker stopped"),
            Ok(Err(e)) => error!("File events worker failed: {e}"),
            Err(_) => {
                warn!("File events worker did not drain within {drain:?}, aborting");
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::dispatch::FileEventsNotifier;
    use crate::entry::FileEntry;
    use crate::event::{EventPhase, ModuleFileEvent};
    use crate::host::{EngineHandle, Module};
    use crate::registry::ProjectRegistry;
    use std::sync::Arc;

    struct NullNotifier;

    impl FileEventsNotifier for NullNotifier {
        fn notify_async(&self, _engine: &EngineHandle, _module: &Module, _events: Vec<ModuleFileEvent>) {}
    }

    fn worker() -> SequencedWorker {
        let pipeline = FileEventsPipeline::new(
            Arc::new(ProjectRegistry::default()),
            Arc::new(NullNotifier),
            &PipelineConfig::default(),
        );
        SequencedWorker::spawn(pipeline)
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let worker = worker();
        worker
            .submit(vec![RawEvent::Created(FileEntry::file("/p/main.py"))], |e| {
                EventPhase::AfterMutation.classify(e)
            })
            .unwrap();
        worker.flush().await.unwrap();

        worker.shutdown(Duration::from_secs(1)).await;

        assert!(!worker.is_running());
        let result = worker.submit(Vec::new(), |e| EventPhase::AfterMutation.classify(e));
        assert!(matches!(result, Err(FileEventsError::WorkerShutdown)));
        assert!(matches!(worker.flush().await, Err(FileEventsError::WorkerShutdown)));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let worker = worker();
        worker.shutdown(Duration::from_millis(100)).await;
        worker.shutdown(Duration::from_millis(100)).await;
        assert!(!worker.is_running());
    }

    #[tokio::test]
    async fn test_panicking_mapper_does_not_stop_the_worker() {
        let worker = worker();
        worker
            .submit(vec![RawEvent::Created(FileEntry::file("/p/main.py"))], |_| {
                panic!("mapper failure")
            })
            .unwrap();

        worker.flush().await.unwrap();
        assert!(worker.is_running());
    }
}
