//! # File Events
//!
//! This crate propagates file system changes to per-project analysis engines.
//! Raw host events are normalized into module-scoped file events and handed to
//! the engine of the owning project, asynchronously and in order.
//!
//! ## Features
//!
//! - **Directory Expansion**: Directory events become events for the files inside
//! - **Module Attribution**: Every file is owned by exactly one open module
//! - **Ordered Delivery**: One worker processes batches in submission order
//! - **Engine Awareness**: Modules of projects without a started engine are skipped
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        File Events                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  VfsListener / DirectoryWatcher ──► SequencedWorker             │
//! │                                          │                      │
//! │                                          ▼                      │
//! │  EventFilter ─► DirectoryExpander ─► ModuleResolver             │
//! │                                          │                      │
//! │                                          ▼                      │
//! │                  EventAggregator ──► DispatchRouter ──► Engine  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod aggregator;
pub mod config;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod event;
pub mod expander;
pub mod filter;
pub mod host;
pub mod listener;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod watcher;
pub mod worker;

pub use aggregator::{EventAggregator, ModuleBatch};
pub use config::{InclusionPolicy, MetadataMatcher, PipelineConfig};
pub use dispatch::{DispatchRouter, DispatchSummary, EngineNotifier, FileEventsNotifier};
pub use entry::FileEntry;
pub use error::{FileEventsError, Result};
pub use event::{EventPhase, FileContent, ModuleFileEvent, ModuleFileEventKind, RawEvent};
pub use expander::{DirectoryExpander, Expansion};
pub use filter::EventFilter;
pub use host::{AnalysisEngine, EngineHandle, Module, ModuleId, ProjectHost, ProjectId};
pub use listener::VfsListener;
pub use pipeline::{FileEventsPipeline, RunSummary};
pub use registry::ProjectRegistry;
pub use resolver::ModuleResolver;
pub use watcher::DirectoryWatcher;
pub use worker::{EventKindMapper, SequencedWorker};
