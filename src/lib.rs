// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # gastop
//!
//! A top-style terminal monitor and library for live Gas Town polecat
//! workspaces.
//!
//! The engine polls a workspace source on a fixed cadence, reconciles each
//! listing against the known population, and renders derived per-workspace
//! state (status, CPU rate, memory, uptime) in an interactive terminal UI.
//! Workspaces that vanish from a listing are shown as terminated for a
//! grace period instead of silently disappearing.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     render loop (main)                       │
//! │  ┌─────────┐  batches   ┌───────────┐      ┌────────────┐    │
//! │  │ sampler │───────────▶│    app    │─────▶│     ui     │    │
//! │  │ (tokio  │   watch    │ registry/ │      │ (ratatui)  │    │
//! │  │  task)  │  channel   │   view    │      └────────────┘    │
//! │  └────┬────┘            └───────────┘                        │
//! │       │ query / act                                          │
//! │       ▼                                                      │
//! │  ┌─────────┐                                                 │
//! │  │ source  │◀── GtSource | FileSource | ChannelSource        │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Workspace source abstraction ([`WorkspaceSource`] trait)
//!   with implementations for the `gt` CLI, JSON files, and channel-based input
//! - **[`sampler`]**: Background polling task - owns the cadence, numbers the
//!   cycles, and publishes batches through a watch channel
//! - **[`registry`]**: Reconciles listings into lifecycle state and immutable
//!   [`Snapshot`]s, deriving CPU rates and stall diagnoses
//! - **[`view`]**: Pure filter and sort over a snapshot
//! - **[`app`]**: Application state and user interaction logic
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch the whole town
//! gastop
//!
//! # One rig, faster polls
//! gastop --rig nux --interval 1s
//!
//! # Inspect a captured listing
//! gt polecat list --json --all > town.json && gastop --file town.json
//! ```
//!
//! ### Driving the registry directly
//!
//! ```
//! use gastop::{Registry, RegistryConfig, Stamp};
//!
//! let mut registry = Registry::new(RegistryConfig::default());
//! let snapshot = registry.reconcile(Vec::new(), Stamp::now(1));
//! assert!(snapshot.is_empty());
//! ```
//!
//! ### Feeding listings from your own code
//!
//! ```
//! use gastop::ChannelSource;
//!
//! let (tx, source) = ChannelSource::create("my scheduler");
//! tx.send(Vec::new()).unwrap();
//! ```
//!
//! ### Running the sampler against a source
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use gastop::{sampler, ChannelSource, SamplerControl};
//! use tokio::sync::{watch, Notify};
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio_test::block_on(async {
//! let (_feed, source) = ChannelSource::create("demo");
//! let (_control, control_rx) = watch::channel(SamplerControl::new(Duration::from_secs(2)));
//! let (mut batches, _task) = sampler::spawn(
//!     Arc::new(source),
//!     control_rx,
//!     Arc::new(Notify::new()),
//!     CancellationToken::new(),
//! );
//! batches.changed().await.unwrap();
//! # });
//! ```

pub mod app;
pub mod config;
pub mod events;
pub mod model;
pub mod registry;
pub mod sampler;
pub mod source;
pub mod ui;
pub mod view;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use model::{
    LifecycleEvent, LifecycleKind, RawCounters, ReportedState, Sample, Snapshot, Stamp,
    StatusCounts, Workspace, WorkspaceId, WorkspaceStatus,
};
pub use registry::{Registry, RegistryConfig};
pub use sampler::{SampleBatch, SamplerControl};
pub use source::{ActionKind, ChannelSource, FileSource, GtSource, SourceError, WorkspaceSource};
pub use view::{view, SortDirection, SortKey};
