//! Workspace registry and per-cycle reconciliation.
//!
//! The registry is the single authoritative writer of workspace lifecycle
//! state. Each poll cycle hands it the full raw listing; it updates
//! per-workspace bookkeeping, derives display views, and publishes an
//! immutable [`Snapshot`]. Every other component reads snapshots and never
//! mutates them.
//!
//! Reconciliation only runs on cycles that produced a listing. A failed
//! poll leaves the registry untouched, so an outage does not read as a
//! mass termination.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::model::{
    format_age, LifecycleEvent, LifecycleKind, RawCounters, ReportedState, Sample, Snapshot,
    Stamp, Workspace, WorkspaceId, WorkspaceStatus,
};

/// Reconciliation tuning.
#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    /// Consecutive missed polls an absent workspace is kept as terminated
    /// before it is dropped. An absent workspace always survives at least
    /// the cycle it disappears in, even with this set to zero.
    pub grace_cycles: u32,
    /// How long a working session may go without activity before it counts
    /// as stalled. Zero disables the activity check.
    pub stall_threshold: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            grace_cycles: 1,
            stall_threshold: Duration::from_secs(30 * 60),
        }
    }
}

/// Per-workspace bookkeeping that outlives a single cycle.
#[derive(Debug, Clone)]
struct RegistryEntry {
    /// Counter reading and the tick it was taken at. Rate denominators use
    /// real tick times, never an assumed fixed interval.
    baseline: Option<(RawCounters, Instant)>,
    first_seen_cycle: u64,
    last_seen_cycle: u64,
    missed_polls: u32,
    /// Derived view as of the last reconcile. Frozen once the workspace
    /// goes absent, apart from the status flip to terminated.
    view: Workspace,
}

/// Owns all workspace lifecycle state.
///
/// Single-writer by construction: [`Registry::reconcile`] runs on the
/// render loop's turn, and consumers only read the snapshots it returns.
#[derive(Debug)]
pub struct Registry {
    config: RegistryConfig,
    entries: BTreeMap<WorkspaceId, RegistryEntry>,
    current: Snapshot,
    events: Vec<LifecycleEvent>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            entries: BTreeMap::new(),
            current: Snapshot::empty(),
            events: Vec::new(),
        }
    }

    /// Reconcile one poll's listing against the known population and
    /// publish the resulting snapshot.
    ///
    /// Workspaces present in the listing get fresh derived views and reset
    /// missed-poll counters. Workspaces absent from it are marked
    /// terminated with their last metrics frozen, then dropped entirely
    /// once they have been missing longer than the grace period.
    pub fn reconcile(&mut self, samples: Vec<Sample>, stamp: Stamp) -> Snapshot {
        // Last row wins when a listing repeats an identifier.
        let mut incoming: BTreeMap<WorkspaceId, Sample> = BTreeMap::new();
        for sample in samples {
            incoming.insert(sample.id.clone(), sample);
        }

        for (id, sample) in incoming {
            match self.entries.get_mut(&id) {
                Some(entry) => {
                    let absent_for = entry.missed_polls;
                    if absent_for > 0 {
                        // Back within the grace window: same workspace, but
                        // its counters restart from scratch for rates.
                        entry.baseline = None;
                        entry.missed_polls = 0;
                    }
                    let was_stalled = entry.view.status == WorkspaceStatus::Stalled;

                    let cpu = match (&entry.baseline, &sample.counters) {
                        (Some((base, base_at)), Some(current)) => {
                            cpu_rate(base, *base_at, current, stamp.at)
                        }
                        _ => None,
                    };
                    if let Some(counters) = sample.counters {
                        entry.baseline = Some((counters, stamp.at));
                    }
                    entry.view = derive_view(&sample, cpu, &stamp, self.config.stall_threshold);
                    entry.last_seen_cycle = stamp.cycle;

                    let now_stalled = entry.view.status == WorkspaceStatus::Stalled;
                    let stall_detail = entry.view.stall_reason.clone();
                    if absent_for > 0 {
                        self.events.push(LifecycleEvent {
                            kind: LifecycleKind::Reappeared,
                            id: id.clone(),
                            cycle: stamp.cycle,
                            at: stamp.at,
                            detail: Some(format!("absent {} polls", absent_for)),
                        });
                    }
                    if now_stalled && !was_stalled {
                        self.events.push(LifecycleEvent {
                            kind: LifecycleKind::Stalled,
                            id: id.clone(),
                            cycle: stamp.cycle,
                            at: stamp.at,
                            detail: stall_detail,
                        });
                    } else if was_stalled && !now_stalled {
                        self.events.push(LifecycleEvent {
                            kind: LifecycleKind::Recovered,
                            id: id.clone(),
                            cycle: stamp.cycle,
                            at: stamp.at,
                            detail: None,
                        });
                    }
                }
                None => {
                    let baseline = sample.counters.map(|c| (c, stamp.at));
                    let view = derive_view(&sample, None, &stamp, self.config.stall_threshold);
                    let arrived_stalled = view.status == WorkspaceStatus::Stalled;
                    let stall_detail = view.stall_reason.clone();
                    self.entries.insert(
                        id.clone(),
                        RegistryEntry {
                            baseline,
                            first_seen_cycle: stamp.cycle,
                            last_seen_cycle: stamp.cycle,
                            missed_polls: 0,
                            view,
                        },
                    );
                    self.events.push(LifecycleEvent {
                        kind: LifecycleKind::Appeared,
                        id: id.clone(),
                        cycle: stamp.cycle,
                        at: stamp.at,
                        detail: None,
                    });
                    // A workspace can be born stalled; the later recovery
                    // event needs its opening half.
                    if arrived_stalled {
                        self.events.push(LifecycleEvent {
                            kind: LifecycleKind::Stalled,
                            id,
                            cycle: stamp.cycle,
                            at: stamp.at,
                            detail: stall_detail,
                        });
                    }
                }
            }
        }

        // Absence pass. Identifier gaps from failed polls never reach this
        // point, so only genuine disappearances count.
        let grace = self.config.grace_cycles.max(1);
        let mut purged: Vec<WorkspaceId> = Vec::new();
        for (id, entry) in self.entries.iter_mut() {
            if entry.last_seen_cycle == stamp.cycle {
                continue;
            }
            entry.missed_polls += 1;
            entry.view.missed_polls = entry.missed_polls;
            if entry.missed_polls == 1 {
                entry.view.status = WorkspaceStatus::Terminated;
                entry.view.stall_reason = None;
                self.events.push(LifecycleEvent {
                    kind: LifecycleKind::Terminated,
                    id: id.clone(),
                    cycle: stamp.cycle,
                    at: stamp.at,
                    detail: None,
                });
            }
            if entry.missed_polls > grace {
                purged.push(id.clone());
            }
        }
        for id in purged {
            debug!(id = %id, cycle = stamp.cycle, "purging workspace");
            self.entries.remove(&id);
            self.events.push(LifecycleEvent {
                kind: LifecycleKind::Purged,
                id,
                cycle: stamp.cycle,
                at: stamp.at,
                detail: None,
            });
        }

        let mut workspaces = BTreeMap::new();
        for (id, entry) in &self.entries {
            workspaces.insert(id.clone(), entry.view.clone());
        }
        self.current = Snapshot {
            cycle: stamp.cycle,
            taken_at: stamp.at,
            wall_ms: stamp.wall_ms,
            workspaces,
        };
        self.current.clone()
    }

    /// The snapshot from the most recent reconcile.
    pub fn current_snapshot(&self) -> &Snapshot {
        &self.current
    }

    /// Derived view of one workspace, if it is still tracked.
    pub fn entry(&self, id: &WorkspaceId) -> Option<&Workspace> {
        self.entries.get(id).map(|e| &e.view)
    }

    /// Cycle an identifier was first observed, if it is still tracked.
    pub fn first_seen(&self, id: &WorkspaceId) -> Option<u64> {
        self.entries.get(id).map(|e| e.first_seen_cycle)
    }

    /// Take all lifecycle events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }
}

/// CPU rate between two counter readings, as a fraction of one core.
///
/// A decreased counter reads as a session restart: the rate reports zero
/// for this cycle and the new reading becomes the next baseline.
fn cpu_rate(
    base: &RawCounters,
    base_at: Instant,
    current: &RawCounters,
    now: Instant,
) -> Option<f64> {
    let elapsed_ms = now.saturating_duration_since(base_at).as_secs_f64() * 1000.0;
    if elapsed_ms <= 0.0 {
        return None;
    }
    if current.cpu_time_ms < base.cpu_time_ms {
        return Some(0.0);
    }
    Some((current.cpu_time_ms - base.cpu_time_ms) as f64 / elapsed_ms)
}

fn derive_view(sample: &Sample, cpu: Option<f64>, stamp: &Stamp, stall_threshold: Duration) -> Workspace {
    let uptime = wall_since(stamp.wall_ms, sample.started_at_ms);
    let idle_for = wall_since(stamp.wall_ms, sample.last_activity_ms);
    let stall_reason = stall_reason(sample, idle_for, stall_threshold);
    let status = if stall_reason.is_some() {
        WorkspaceStatus::Stalled
    } else {
        match sample.state {
            ReportedState::Working => WorkspaceStatus::Active,
            _ => WorkspaceStatus::Idle,
        }
    };
    Workspace {
        id: sample.id.clone(),
        name: sample.name.clone(),
        rig: sample.rig.clone(),
        state: sample.state,
        bead: sample.bead.clone(),
        session_id: sample.session_id.clone(),
        attached: sample.attached,
        status,
        stall_reason,
        cpu,
        mem_bytes: sample.counters.map(|c| c.mem_bytes),
        uptime,
        idle_for,
        missed_polls: 0,
    }
}

/// Stall rules, checked in order. The first match wins.
fn stall_reason(sample: &Sample, idle_for: Option<Duration>, threshold: Duration) -> Option<String> {
    if sample.state == ReportedState::Stuck {
        return Some("marked stuck".to_string());
    }
    if sample.state != ReportedState::Working {
        return None;
    }
    if sample.bead.is_none() {
        return Some("working with no assigned bead".to_string());
    }
    if !threshold.is_zero() {
        if let Some(idle) = idle_for {
            if idle > threshold {
                return Some(format!("no activity for {}", format_age(idle)));
            }
        }
    }
    if !sample.running {
        return Some("session not running".to_string());
    }
    None
}

/// Wall-clock duration since an epoch-milliseconds timestamp. `None` when
/// the timestamp is unset or sits in the future (clock skew between hosts).
fn wall_since(now_ms: u64, then_ms: Option<u64>) -> Option<Duration> {
    let then = then_ms?;
    if then == 0 || then > now_ms {
        return None;
    }
    Some(Duration::from_millis(now_ms - then))
}
