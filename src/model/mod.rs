//! Data models shared across the engine.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of durations (e.g., "2s", "1500ms")
//! - [`workspace`]: Core models ([`Sample`], [`Workspace`], [`Snapshot`])
//!
//! ## Data Flow
//!
//! ```text
//! gt polecat list --json (raw rows)
//!        │
//!        ▼
//!     Sample (one observation per workspace)
//!        │
//!        ▼  Registry::reconcile()
//!   Workspace ──collected into──▶ Snapshot (one per poll cycle)
//! ```

pub mod duration;
pub mod workspace;

pub use duration::{format_age, format_duration, parse_duration};
pub use workspace::{
    LifecycleEvent, LifecycleKind, RawCounters, ReportedState, Sample, Snapshot, Stamp,
    StatusCounts, Workspace, WorkspaceId, WorkspaceStatus,
};
