//! One synchronous pass from raw events to engine notifications.

use std::sync::Arc;

use tracing::debug;

use crate::aggregator::EventAggregator;
use crate::config::PipelineConfig;
use crate::dispatch::{DispatchRouter, FileEventsNotifier};
use crate::event::{ModuleFileEventKind, RawEvent};
use crate::expander::DirectoryExpander;
use crate::host::ProjectHost;

/// Statistics of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Raw events received.
    pub raw_events: usize,

    /// Module file events produced.
    pub file_events: usize,

    /// Modules handed to an engine.
    pub modules_dispatched: usize,

    /// Modules dropped for lack of a started engine.
    pub modules_dropped: usize,
}

/// Filter, expand, resolve, aggregate and dispatch.
///
/// A run consults the host afresh. Open projects and their started engines
/// are captured once at the start of the run, so a project disposed during
/// expansion still receives the events gathered before the walk stopped.
#[derive(Clone)]
pub struct FileEventsPipeline {
    host: Arc<dyn ProjectHost>,
    notifier: Arc<dyn FileEventsNotifier>,
    expander: DirectoryExpander,
}

impl FileEventsPipeline {
    pub fn new(
        host: Arc<dyn ProjectHost>,
        notifier: Arc<dyn FileEventsNotifier>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            host,
            notifier,
            expander: DirectoryExpander::from_config(config),
        }
    }

    /// Process one batch of raw events.
    pub fn run(
        &self,
        events: &[RawEvent],
        kind_of: &dyn Fn(&RawEvent) -> Option<ModuleFileEventKind>,
    ) -> RunSummary {
        let host = self.host.as_ref();
        let open_projects = host.open_projects();
        let router = DispatchRouter::new(host, &open_projects, self.notifier.as_ref());

        let batch = EventAggregator::new(host, &self.expander).aggregate(events, &open_projects, kind_of);
        let file_events = batch.values().map(Vec::len).sum();

        let dispatch = router.dispatch(batch);

        let summary = RunSummary {
            raw_events: events.len(),
            file_events,
            modules_dispatched: dispatch.dispatched,
            modules_dropped: dispatch.dropped,
        };
        debug!(?summary, "File events run finished");
        summary
    }
}
