//! Entry points for hosts reporting raw file system events.

use std::sync::Arc;

use crate::error::Result;
use crate::event::{EventPhase, RawEvent};
use crate::worker::SequencedWorker;

/// Forwards host event batches to the worker, classified by phase.
#[derive(Clone)]
pub struct VfsListener {
    worker: Arc<SequencedWorker>,
}

impl VfsListener {
    pub fn new(worker: Arc<SequencedWorker>) -> Self {
        Self { worker }
    }

    /// Events about to be applied: deletions and the old side of moves.
    pub fn before(&self, events: Vec<RawEvent>) -> Result<()> {
        self.forward(events, EventPhase::BeforeMutation)
    }

    /// Events just applied: creations, copies, new side of moves, edits.
    pub fn after(&self, events: Vec<RawEvent>) -> Result<()> {
        self.forward(events, EventPhase::AfterMutation)
    }

    /// Events observed only once settled, such as from OS watchers.
    pub fn settled(&self, events: Vec<RawEvent>) -> Result<()> {
        self.forward(events, EventPhase::Settled)
    }

    fn forward(&self, events: Vec<RawEvent>, phase: EventPhase) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        self.worker.submit(events, move |event| phase.classify(event))
    }

    pub fn worker(&self) -> &Arc<SequencedWorker> {
        &self.worker
    }
}
