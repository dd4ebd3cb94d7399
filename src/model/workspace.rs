//! Core workspace models.
//!
//! A source adapter yields one raw [`Sample`] per workspace per poll
//! cycle. The registry reconciles those into derived [`Workspace`] views
//! and collects them in a [`Snapshot`] for the current cycle.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::Utc;

/// Stable identifier for a workspace: the rig-qualified name (`rig/name`).
///
/// Gas Town addresses polecats by this form, so the same string serves as
/// registry key and as the argument to CLI actions. A workspace restarted
/// in place keeps its identifier; its counters reset instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the `rig/name` form; bare name when the rig is empty.
    pub fn from_parts(rig: &str, name: &str) -> Self {
        if rig.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", rig, name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkspaceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// State a workspace reports for itself in the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedState {
    Working,
    Done,
    Stuck,
    Idle,
    Unknown,
}

impl ReportedState {
    pub fn parse(s: &str) -> Self {
        match s {
            "working" => ReportedState::Working,
            "done" => ReportedState::Done,
            "stuck" => ReportedState::Stuck,
            "idle" => ReportedState::Idle,
            _ => ReportedState::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportedState::Working => "working",
            ReportedState::Done => "done",
            ReportedState::Stuck => "stuck",
            ReportedState::Idle => "idle",
            ReportedState::Unknown => "unknown",
        }
    }

    /// State indicator character, matching the rest of the Gas Town tooling.
    pub fn icon(&self) -> &'static str {
        match self {
            ReportedState::Working => "●",
            ReportedState::Done => "✓",
            ReportedState::Stuck => "⚠",
            ReportedState::Idle => "○",
            ReportedState::Unknown => "?",
        }
    }
}

/// Derived lifecycle status.
///
/// The enum declaration order is the sort order for the status column:
/// active < idle < stalled < terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkspaceStatus {
    Active,
    Idle,
    Stalled,
    Terminated,
}

impl WorkspaceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            WorkspaceStatus::Active => "active",
            WorkspaceStatus::Idle => "idle",
            WorkspaceStatus::Stalled => "stalled",
            WorkspaceStatus::Terminated => "gone",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            WorkspaceStatus::Active => "●",
            WorkspaceStatus::Idle => "○",
            WorkspaceStatus::Stalled => "⚠",
            WorkspaceStatus::Terminated => "✗",
        }
    }
}

/// Raw cumulative counters read in one poll.
///
/// `cpu_time_ms` only ever grows for a given session; a decrease means the
/// session restarted in place and the reading is a fresh baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCounters {
    /// Cumulative CPU time consumed by the session, in milliseconds.
    pub cpu_time_ms: u64,
    /// Resident memory in bytes (a gauge, read as-is).
    pub mem_bytes: u64,
}

/// One raw observation of a workspace at a poll.
#[derive(Debug, Clone)]
pub struct Sample {
    pub id: WorkspaceId,
    pub name: String,
    pub rig: String,
    pub state: ReportedState,
    /// Bead (work item) currently assigned, if any.
    pub bead: Option<String>,
    pub session_id: Option<String>,
    pub running: bool,
    pub attached: bool,
    /// Session start, milliseconds since the Unix epoch. 0 means unset.
    pub started_at_ms: Option<u64>,
    /// Last observed activity, milliseconds since the Unix epoch.
    pub last_activity_ms: Option<u64>,
    /// `None` when resource counters could not be read this cycle; the
    /// workspace still appears, with its metrics shown as unknown.
    pub counters: Option<RawCounters>,
}

/// Derived, display-ready view of one workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub rig: String,
    pub state: ReportedState,
    pub bead: Option<String>,
    pub session_id: Option<String>,
    /// A terminal is currently attached to the session.
    pub attached: bool,
    pub status: WorkspaceStatus,
    /// Why the workspace counts as stalled, when it does.
    pub stall_reason: Option<String>,
    /// CPU usage as a fraction of one core (1.0 = 100%). `None` until two
    /// time-separated samples exist; zero is a real observed rate.
    pub cpu: Option<f64>,
    /// Resident memory in bytes. `None` when counters were unreadable.
    pub mem_bytes: Option<u64>,
    /// Time since the session started. Frozen once terminated.
    pub uptime: Option<Duration>,
    /// Time since last observed activity. Frozen once terminated.
    pub idle_for: Option<Duration>,
    /// Consecutive polls this workspace has been absent from.
    pub missed_polls: u32,
}

/// Timing identity of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    /// 1-based cycle counter; every attempted poll gets the next number.
    pub cycle: u64,
    /// Monotonic time the poll started. Rate denominators use this, never
    /// an assumed fixed interval.
    pub at: Instant,
    /// Wall-clock milliseconds since the Unix epoch at poll start.
    pub wall_ms: u64,
}

impl Stamp {
    pub fn now(cycle: u64) -> Self {
        Self {
            cycle,
            at: Instant::now(),
            wall_ms: Utc::now().timestamp_millis().max(0) as u64,
        }
    }

    pub fn new(cycle: u64, at: Instant, wall_ms: u64) -> Self {
        Self { cycle, at, wall_ms }
    }
}

/// Consolidated engine state for one sampling cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Poll cycle this snapshot was built from (0 before the first poll).
    pub cycle: u64,
    /// Monotonic time of the poll that produced it.
    pub taken_at: Instant,
    /// Wall-clock milliseconds since the Unix epoch at that poll.
    pub wall_ms: u64,
    pub workspaces: BTreeMap<WorkspaceId, Workspace>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            cycle: 0,
            taken_at: Instant::now(),
            wall_ms: 0,
            workspaces: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub fn get(&self, id: &WorkspaceId) -> Option<&Workspace> {
        self.workspaces.get(id)
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for workspace in self.workspaces.values() {
            match workspace.status {
                WorkspaceStatus::Active => counts.active += 1,
                WorkspaceStatus::Idle => counts.idle += 1,
                WorkspaceStatus::Stalled => counts.stalled += 1,
                WorkspaceStatus::Terminated => counts.terminated += 1,
            }
        }
        counts
    }
}

/// Per-status workspace counts for the header line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub active: usize,
    pub idle: usize,
    pub stalled: usize,
    pub terminated: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.active + self.idle + self.stalled + self.terminated
    }
}

/// Lifecycle transitions worth surfacing in the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    /// First cycle an identifier was seen.
    Appeared,
    /// Seen again within the grace period after going absent.
    Reappeared,
    /// Absent from the latest poll; retained until the grace period ends.
    Terminated,
    /// Removed from the registry after the grace period.
    Purged,
    Stalled,
    /// No longer stalled.
    Recovered,
}

impl LifecycleKind {
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleKind::Appeared => "appeared",
            LifecycleKind::Reappeared => "reappeared",
            LifecycleKind::Terminated => "terminated",
            LifecycleKind::Purged => "purged",
            LifecycleKind::Stalled => "stalled",
            LifecycleKind::Recovered => "recovered",
        }
    }
}

/// One entry in the activity feed.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub kind: LifecycleKind,
    pub id: WorkspaceId,
    pub cycle: u64,
    pub at: Instant,
    /// Extra context, e.g. the stall reason.
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_parts() {
        assert_eq!(WorkspaceId::from_parts("nux", "slit").as_str(), "nux/slit");
        assert_eq!(WorkspaceId::from_parts("", "mayor").as_str(), "mayor");
    }

    #[test]
    fn test_status_sort_order() {
        assert!(WorkspaceStatus::Active < WorkspaceStatus::Idle);
        assert!(WorkspaceStatus::Idle < WorkspaceStatus::Stalled);
        assert!(WorkspaceStatus::Stalled < WorkspaceStatus::Terminated);
    }

    #[test]
    fn test_reported_state_parse() {
        assert_eq!(ReportedState::parse("working"), ReportedState::Working);
        assert_eq!(ReportedState::parse("done"), ReportedState::Done);
        assert_eq!(ReportedState::parse("stuck"), ReportedState::Stuck);
        assert_eq!(ReportedState::parse("idle"), ReportedState::Idle);
        assert_eq!(ReportedState::parse("sleeping"), ReportedState::Unknown);
        assert_eq!(ReportedState::parse(""), ReportedState::Unknown);
    }

    #[test]
    fn test_status_counts() {
        let mut snapshot = Snapshot::empty();
        for (i, status) in [
            WorkspaceStatus::Active,
            WorkspaceStatus::Active,
            WorkspaceStatus::Stalled,
            WorkspaceStatus::Terminated,
        ]
        .iter()
        .enumerate()
        {
            let id = WorkspaceId::new(format!("rig/w{}", i));
            snapshot.workspaces.insert(
                id.clone(),
                Workspace {
                    id,
                    name: format!("w{}", i),
                    rig: "rig".to_string(),
                    state: ReportedState::Working,
                    bead: None,
                    session_id: None,
                    attached: false,
                    status: *status,
                    stall_reason: None,
                    cpu: None,
                    mem_bytes: None,
                    uptime: None,
                    idle_for: None,
                    missed_polls: 0,
                },
            );
        }

        let counts = snapshot.status_counts();
        assert_eq!(counts.active, 2);
        assert_eq!(counts.idle, 0);
        assert_eq!(counts.stalled, 1);
        assert_eq!(counts.terminated, 1);
        assert_eq!(counts.total(), 4);
    }
}
