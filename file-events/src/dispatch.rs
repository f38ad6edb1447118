//! Hand-off of module batches to started engines.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::aggregator::ModuleBatch;
use crate::event::ModuleFileEvent;
use crate::host::{EngineHandle, Module, ProjectHost, ProjectId};

/// Asynchronous delivery of module file events to an engine.
///
/// Implementations must return without waiting for the engine.
pub trait FileEventsNotifier: Send + Sync {
    fn notify_async(&self, engine: &EngineHandle, module: &Module, events: Vec<ModuleFileEvent>);
}

/// Outcome of dispatching one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Modules handed to an engine.
    pub dispatched: usize,

    /// Modules dropped because their project has no started engine.
    pub dropped: usize,
}

/// Routes each module's events to its project's engine, if started.
///
/// Engines are captured when the router is created. A project disposed
/// afterwards still receives what was gathered for it.
pub struct DispatchRouter<'a> {
    engines: HashMap<ProjectId, EngineHandle>,
    notifier: &'a dyn FileEventsNotifier,
}

impl<'a> DispatchRouter<'a> {
    /// Capture the started engines of `projects`.
    pub fn new(
        host: &dyn ProjectHost,
        projects: &[ProjectId],
        notifier: &'a dyn FileEventsNotifier,
    ) -> Self {
        let engines = projects
            .iter()
            .filter_map(|project| {
                host.engine_if_started(project)
                    .map(|engine| (project.clone(), engine))
            })
            .collect();
        Self { engines, notifier }
    }

    /// Dispatch every module of `batch`, in batch order.
    pub fn dispatch(&self, batch: ModuleBatch) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for (module, events) in batch {
            match self.engines.get(module.project()) {
                Some(engine) => {
                    debug!(
                        "Notifying engine {} of {} event(s) in {module}",
                        engine.name(),
                        events.len()
                    );
                    self.notifier.notify_async(engine, &module, events);
                    summary.dispatched += 1;
                }
                None => {
                    debug!("No engine started for {module}, dropping {} event(s)", events.len());
                    summary.dropped += 1;
                }
            }
        }

        summary
    }
}

struct Notification {
    engine: EngineHandle,
    module: Module,
    events: Vec<ModuleFileEvent>,
}

/// Notifier delivering to engines from a background task.
///
/// Notifications are queued and handed to engines one at a time, so an engine
/// observes them in dispatch order. Engine failures are logged and dropped.
pub struct EngineNotifier {
    tx: mpsc::UnboundedSender<Notification>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl EngineNotifier {
    /// Spawn the delivery task on the current tokio runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        let task = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                let Notification {
                    engine,
                    module,
                    events,
                } = notification;
                if let Err(e) = engine.engine().on_module_file_events(&module, events).await {
                    warn!("Engine {} failed to handle events for {module}: {e:#}", engine.name());
                }
            }
            debug!("Engine notifier stopped");
        });

        Self {
            tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Stop delivering. Queued notifications are discarded.
    pub fn abort(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl FileEventsNotifier for EngineNotifier {
    fn notify_async(&self, engine: &EngineHandle, module: &Module, events: Vec<ModuleFileEvent>) {
        let notification = Notification {
            engine: engine.clone(),
            module: module.clone(),
            events,
        };
        if self.tx.send(notification).is_err() {
            warn!("Engine notifier is stopped, dropping events for {module}");
        }
    }
}

impl Drop for EngineNotifier {
    fn drop(&mut self) {
        self.abort();
    }
}
