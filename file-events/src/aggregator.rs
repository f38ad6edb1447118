//! Grouping of raw events into per-module batches.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::event::{ModuleFileEvent, ModuleFileEventKind, RawEvent};
use crate::expander::DirectoryExpander;
use crate::filter::EventFilter;
use crate::host::{Module, ProjectHost, ProjectId};
use crate::resolver::ModuleResolver;

/// Module file events of one pipeline run, keyed by module in discovery order.
pub type ModuleBatch = IndexMap<Module, Vec<ModuleFileEvent>>;

/// Turns raw events into a [`ModuleBatch`].
pub struct EventAggregator<'a> {
    host: &'a dyn ProjectHost,
    expander: &'a DirectoryExpander,
}

impl<'a> EventAggregator<'a> {
    pub fn new(host: &'a dyn ProjectHost, expander: &'a DirectoryExpander) -> Self {
        Self { host, expander }
    }

    /// Aggregate `events`, strictly in input order.
    ///
    /// Events `kind_of` does not classify are dropped. The primary entry of
    /// each remaining event is attributed to a module, then expanded; every
    /// relevant file found is appended to that module's list. Modules without
    /// events are absent from the result.
    pub fn aggregate(
        &self,
        events: &[RawEvent],
        open_projects: &[ProjectId],
        kind_of: &dyn Fn(&RawEvent) -> Option<ModuleFileEventKind>,
    ) -> ModuleBatch {
        let mut filter = EventFilter::new(self.host);
        let resolver = ModuleResolver::new(self.host);
        let mut batch = ModuleBatch::new();

        for event in events {
            let Some(kind) = kind_of(event) else {
                trace!("Ignoring untracked event: {event:?}");
                continue;
            };

            let entry = event.primary_entry(kind);
            if filter.is_project_metadata(entry) {
                trace!("Ignoring metadata entry: {}", entry.path().display());
                continue;
            }

            let Some(module) = resolver.resolve(entry, open_projects) else {
                debug!("No open module owns {}", entry.path().display());
                continue;
            };

            let project = module.project().clone();
            let expansion = self.expander.expand(entry, || !self.host.is_disposed(&project));
            for file in expansion {
                if !filter.is_relevant(&file) {
                    continue;
                }
                match ModuleFileEvent::new(&module, &file, kind) {
                    Some(file_event) => batch.entry(module.clone()).or_default().push(file_event),
                    None => debug!(
                        "Skipping {}: outside content root of {module}",
                        file.path().display()
                    ),
                }
            }
        }

        batch
    }
}
