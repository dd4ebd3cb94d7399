//! Sort/filter engine over snapshots.
//!
//! [`view`] is a pure function from a snapshot plus view configuration to
//! an ordered row list. It never mutates the snapshot, so calling it again
//! with the same inputs yields the same sequence.

use std::cmp::Ordering;

use crate::model::{Snapshot, Workspace};

/// Column the table is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Cpu,
    Mem,
    Uptime,
    Status,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Name,
        SortKey::Cpu,
        SortKey::Mem,
        SortKey::Uptime,
        SortKey::Status,
    ];

    /// Next key in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            SortKey::Name => SortKey::Cpu,
            SortKey::Cpu => SortKey::Mem,
            SortKey::Mem => SortKey::Uptime,
            SortKey::Uptime => SortKey::Status,
            SortKey::Status => SortKey::Name,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Cpu => "cpu",
            SortKey::Mem => "mem",
            SortKey::Uptime => "uptime",
            SortKey::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// Filter, then order, the workspaces of a snapshot.
///
/// The predicate runs before sorting; an empty result is a valid view.
/// Ties on the sort key fall back to ascending identifier order so the
/// sequence is total and stable across cycles with unchanged metrics.
pub fn view<'a, F>(
    snapshot: &'a Snapshot,
    key: SortKey,
    direction: SortDirection,
    filter: F,
) -> Vec<&'a Workspace>
where
    F: Fn(&Workspace) -> bool,
{
    let mut rows: Vec<&Workspace> = snapshot
        .workspaces
        .values()
        .filter(|w| filter(w))
        .collect();
    rows.sort_by(|a, b| compare(a, b, key, direction));
    rows
}

fn compare(a: &Workspace, b: &Workspace, key: SortKey, direction: SortDirection) -> Ordering {
    let ord = match key {
        SortKey::Name => directed(a.name.cmp(&b.name), direction),
        SortKey::Cpu => cmp_metric(a.cpu, b.cpu, f64::total_cmp, direction),
        SortKey::Mem => cmp_metric(a.mem_bytes, b.mem_bytes, Ord::cmp, direction),
        SortKey::Uptime => cmp_metric(a.uptime, b.uptime, Ord::cmp, direction),
        SortKey::Status => directed(a.status.cmp(&b.status), direction),
    };
    // Identifier tie-break is never reversed
    ord.then_with(|| a.id.cmp(&b.id))
}

/// Unknown metric values sort after every known value no matter the
/// direction; only known-against-known comparisons follow it.
fn cmp_metric<T>(
    a: Option<T>,
    b: Option<T>,
    cmp: impl Fn(&T, &T) -> Ordering,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => directed(cmp(&x, &y), direction),
    }
}

fn directed(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReportedState, WorkspaceId, WorkspaceStatus};
    use std::collections::BTreeMap;
    use std::time::{Duration, Instant};

    fn workspace(id: &str, cpu: Option<f64>, status: WorkspaceStatus) -> Workspace {
        let (rig, name) = id.split_once('/').unwrap_or(("", id));
        Workspace {
            id: WorkspaceId::new(id),
            name: name.to_string(),
            rig: rig.to_string(),
            state: ReportedState::Working,
            bead: None,
            session_id: None,
            attached: false,
            status,
            stall_reason: None,
            cpu,
            mem_bytes: cpu.map(|c| (c * 1024.0) as u64),
            uptime: cpu.map(|c| Duration::from_secs(c as u64 * 60)),
            idle_for: None,
            missed_polls: 0,
        }
    }

    fn snapshot(workspaces: Vec<Workspace>) -> Snapshot {
        let mut map = BTreeMap::new();
        for w in workspaces {
            map.insert(w.id.clone(), w);
        }
        Snapshot {
            cycle: 1,
            taken_at: Instant::now(),
            wall_ms: 0,
            workspaces: map,
        }
    }

    fn ids(rows: &[&Workspace]) -> Vec<String> {
        rows.iter().map(|w| w.id.to_string()).collect()
    }

    #[test]
    fn test_sort_by_name_ties_on_id() {
        let snap = snapshot(vec![
            workspace("nux/slit", None, WorkspaceStatus::Active),
            workspace("citadel/slit", None, WorkspaceStatus::Active),
            workspace("citadel/ace", None, WorkspaceStatus::Active),
        ]);
        let rows = view(&snap, SortKey::Name, SortDirection::Ascending, |_| true);
        assert_eq!(ids(&rows), vec!["citadel/ace", "citadel/slit", "nux/slit"]);
    }

    #[test]
    fn test_cpu_descending_sinks_unknown() {
        let snap = snapshot(vec![
            workspace("a/low", Some(0.1), WorkspaceStatus::Active),
            workspace("b/unknown", None, WorkspaceStatus::Active),
            workspace("c/high", Some(1.5), WorkspaceStatus::Active),
        ]);
        let rows = view(&snap, SortKey::Cpu, SortDirection::Descending, |_| true);
        assert_eq!(ids(&rows), vec!["c/high", "a/low", "b/unknown"]);
    }

    #[test]
    fn test_unknown_metrics_sink_in_both_directions() {
        let snap = snapshot(vec![
            workspace("a/low", Some(0.1), WorkspaceStatus::Active),
            workspace("b/unknown", None, WorkspaceStatus::Active),
            workspace("c/high", Some(1.5), WorkspaceStatus::Active),
        ]);
        for key in [SortKey::Cpu, SortKey::Mem, SortKey::Uptime] {
            let asc = view(&snap, key, SortDirection::Ascending, |_| true);
            let desc = view(&snap, key, SortDirection::Descending, |_| true);
            assert_eq!(ids(&asc), vec!["a/low", "c/high", "b/unknown"]);
            assert_eq!(ids(&desc), vec!["c/high", "a/low", "b/unknown"]);
        }
    }

    #[test]
    fn test_status_sorts_by_severity() {
        let snap = snapshot(vec![
            workspace("a/gone", None, WorkspaceStatus::Terminated),
            workspace("b/busy", None, WorkspaceStatus::Active),
            workspace("c/warn", None, WorkspaceStatus::Stalled),
            workspace("d/rest", None, WorkspaceStatus::Idle),
        ]);
        let rows = view(&snap, SortKey::Status, SortDirection::Ascending, |_| true);
        assert_eq!(ids(&rows), vec!["b/busy", "d/rest", "c/warn", "a/gone"]);
    }

    #[test]
    fn test_ties_are_deterministic_both_directions() {
        let snap = snapshot(vec![
            workspace("b/two", Some(0.5), WorkspaceStatus::Active),
            workspace("a/one", Some(0.5), WorkspaceStatus::Active),
            workspace("c/three", Some(0.5), WorkspaceStatus::Active),
        ]);
        let expect = vec!["a/one", "b/two", "c/three"];
        let asc = view(&snap, SortKey::Cpu, SortDirection::Ascending, |_| true);
        let desc = view(&snap, SortKey::Cpu, SortDirection::Descending, |_| true);
        // Equal keys keep identifier order regardless of direction
        assert_eq!(ids(&asc), expect);
        assert_eq!(ids(&desc), expect);
    }

    #[test]
    fn test_filter_applies_before_sort() {
        let snap = snapshot(vec![
            workspace("a/gone", Some(2.0), WorkspaceStatus::Terminated),
            workspace("b/busy", Some(1.0), WorkspaceStatus::Active),
            workspace("c/calm", Some(0.5), WorkspaceStatus::Idle),
        ]);
        let rows = view(&snap, SortKey::Cpu, SortDirection::Descending, |w| {
            w.status != WorkspaceStatus::Terminated
        });
        assert_eq!(ids(&rows), vec!["b/busy", "c/calm"]);
    }

    #[test]
    fn test_empty_view_is_valid() {
        let snap = snapshot(vec![workspace("a/one", None, WorkspaceStatus::Active)]);
        let rows = view(&snap, SortKey::Name, SortDirection::Ascending, |_| false);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_view_is_idempotent() {
        let snap = snapshot(vec![
            workspace("a/one", Some(0.2), WorkspaceStatus::Active),
            workspace("b/two", None, WorkspaceStatus::Stalled),
            workspace("c/three", Some(0.9), WorkspaceStatus::Idle),
        ]);
        for key in SortKey::ALL {
            let first = ids(&view(&snap, key, SortDirection::Descending, |_| true));
            let second = ids(&view(&snap, key, SortDirection::Descending, |_| true));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_sort_key_cycle_covers_all() {
        let mut key = SortKey::Name;
        let mut seen = Vec::new();
        for _ in 0..SortKey::ALL.len() {
            seen.push(key);
            key = key.next();
        }
        assert_eq!(key, SortKey::Name);
        assert_eq!(seen, SortKey::ALL.to_vec());
    }
}
