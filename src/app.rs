//! Application state and navigation logic.
//!
//! [`App`] owns all mutable view state: the registry, selection, sort and
//! filter settings, and overlay flags. It is driven from the render loop
//! in `main`, one event at a time, and is the only writer of any of it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch, Notify};

use crate::config::Settings;
use crate::model::{LifecycleEvent, Snapshot, Workspace, WorkspaceId, WorkspaceStatus};
use crate::registry::Registry;
use crate::sampler::{clamp_interval, SampleBatch, SamplerControl};
use crate::source::{ActionKind, SourceError, WorkspaceSource};
use crate::ui::Theme;
use crate::view::{view, SortDirection, SortKey};

/// Consecutive failed polls before the outage banner turns persistent.
pub const BANNER_FAILURES: u32 = 3;

/// Lifecycle events retained for the feed panel.
const FEED_CAPACITY: usize = 100;

/// Interval step for the `+`/`-` keys.
const INTERVAL_STEP: Duration = Duration::from_secs(1);

/// Result of a fire-and-forget workspace action, reported back to the
/// render loop once the source answers.
#[derive(Debug)]
pub struct ActionOutcome {
    pub action: ActionKind,
    pub id: WorkspaceId,
    pub result: Result<(), SourceError>,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub show_detail: bool,
    pub show_feed: bool,
    /// Keep terminated workspaces visible during their grace window.
    pub show_terminated: bool,

    // Engine state
    registry: Registry,
    pub snapshot: Snapshot,
    pub feed: VecDeque<LifecycleEvent>,
    /// Rows the feed panel shows when visible.
    pub feed_lines: usize,

    // Source and sampler status
    source: Arc<dyn WorkspaceSource>,
    pub source_description: String,
    pub paused: bool,
    pub interval: Duration,
    pub overrun: bool,
    consecutive_failures: u32,
    failing_since_cycle: Option<u64>,
    last_error: Option<String>,
    pub last_cycle: u64,

    control: watch::Sender<SamplerControl>,
    refresh: Arc<Notify>,
    actions: mpsc::UnboundedSender<ActionOutcome>,

    // Navigation state
    pub selected: usize,

    // Sorting
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(
        source: Arc<dyn WorkspaceSource>,
        settings: &Settings,
        interval: Duration,
        control: watch::Sender<SamplerControl>,
        refresh: Arc<Notify>,
        actions: mpsc::UnboundedSender<ActionOutcome>,
    ) -> Self {
        let source_description = source.description();
        Self {
            running: true,
            show_help: false,
            show_detail: false,
            show_feed: settings.show_feed,
            show_terminated: true,
            registry: Registry::new(settings.registry_config()),
            snapshot: Snapshot::empty(),
            feed: VecDeque::new(),
            feed_lines: settings.feed_lines,
            source,
            source_description,
            paused: false,
            interval: clamp_interval(interval),
            overrun: false,
            consecutive_failures: 0,
            failing_since_cycle: None,
            last_error: None,
            last_cycle: 0,
            control,
            refresh,
            actions,
            selected: 0,
            sort_key: SortKey::Cpu,
            sort_direction: SortDirection::Descending,
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Fold one poll outcome into the registry and status fields.
    ///
    /// A failed poll leaves the registry and snapshot untouched; the last
    /// known-good state keeps rendering under the outage banner.
    pub fn apply_batch(&mut self, batch: SampleBatch) {
        self.last_cycle = batch.stamp.cycle;
        self.overrun = batch.overrun;
        self.consecutive_failures = batch.consecutive_failures;

        match batch.outcome {
            Ok(samples) => {
                self.failing_since_cycle = None;
                self.last_error = None;
                self.snapshot = self.registry.reconcile(samples, batch.stamp);
                for event in self.registry.drain_events() {
                    self.feed.push_back(event);
                    while self.feed.len() > FEED_CAPACITY {
                        self.feed.pop_front();
                    }
                }
                self.clamp_selection();
            }
            Err(e) => {
                if self.failing_since_cycle.is_none() {
                    self.failing_since_cycle = Some(batch.stamp.cycle);
                }
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Outage banner, present from the first failed poll onward.
    /// The flag is true once the failure streak warrants a persistent,
    /// full-width banner rather than a status-line note.
    pub fn source_banner(&self) -> Option<(String, bool)> {
        if self.consecutive_failures == 0 {
            return None;
        }
        let since = self.failing_since_cycle.unwrap_or(self.last_cycle);
        let text = match &self.last_error {
            Some(err) => format!("source unavailable since cycle {} ({})", since, err),
            None => format!("source unavailable since cycle {}", since),
        };
        Some((text, self.consecutive_failures >= BANNER_FAILURES))
    }

    /// The filtered, sorted rows currently on screen.
    pub fn visible(&self) -> Vec<&Workspace> {
        view(&self.snapshot, self.sort_key, self.sort_direction, |w| {
            self.matches_row(w)
        })
    }

    fn matches_row(&self, workspace: &Workspace) -> bool {
        if !self.show_terminated && workspace.status == WorkspaceStatus::Terminated {
            return false;
        }
        if self.filter_text.is_empty() {
            return true;
        }
        let needle = self.filter_text.to_lowercase();
        if workspace.id.as_str().to_lowercase().contains(&needle) {
            return true;
        }
        workspace
            .bead
            .as_deref()
            .is_some_and(|bead| bead.to_lowercase().contains(&needle))
    }

    /// The workspace under the cursor, if the view is non-empty.
    pub fn selected_workspace(&self) -> Option<&Workspace> {
        self.visible().get(self.selected).copied()
    }

    /// Pull the cursor back inside the view after anything shrinks it.
    pub fn clamp_selection(&mut self) {
        let max = self.visible().len().saturating_sub(1);
        if self.selected > max {
            self.selected = max;
        }
    }

    /// Move selection down by one row.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one row.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n rows, clamped to the last row.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible().len().saturating_sub(1);
        self.selected = (self.selected + n).min(max);
    }

    /// Move selection up by n rows, clamped to the first row.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.visible().len().saturating_sub(1);
    }

    /// Open the detail overlay for the current selection.
    pub fn enter_detail(&mut self) {
        if self.selected_workspace().is_some() {
            self.show_detail = true;
        }
    }

    pub fn close_overlay(&mut self) {
        self.show_detail = false;
    }

    /// Navigate back: close the overlay first, then drop any filter.
    pub fn go_back(&mut self) {
        if self.show_detail {
            self.show_detail = false;
        } else if !self.filter_text.is_empty() {
            self.clear_filter();
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_feed(&mut self) {
        self.show_feed = !self.show_feed;
    }

    /// Show or hide workspaces in their terminated grace window.
    pub fn toggle_terminated(&mut self) {
        self.show_terminated = !self.show_terminated;
        self.clamp_selection();
    }

    /// Cycle to the next sort column.
    pub fn cycle_sort(&mut self) {
        self.sort_key = self.sort_key.next();
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        self.sort_direction = self.sort_direction.toggled();
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
        self.clamp_selection();
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
        self.clamp_selection();
    }

    /// Pause or resume the poll loop.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        let paused = self.paused;
        self.control.send_modify(|c| c.paused = paused);
        self.set_status_message(if paused { "polling paused" } else { "polling resumed" }.to_string());
    }

    /// Ask the sampler for an immediate poll, even while paused.
    pub fn request_refresh(&mut self) {
        self.refresh.notify_one();
    }

    pub fn speed_up(&mut self) {
        self.adjust_interval(self.interval.saturating_sub(INTERVAL_STEP));
    }

    pub fn slow_down(&mut self) {
        self.adjust_interval(self.interval.saturating_add(INTERVAL_STEP));
    }

    fn adjust_interval(&mut self, interval: Duration) {
        let clamped = clamp_interval(interval);
        if clamped == self.interval {
            return;
        }
        self.interval = clamped;
        self.control.send_modify(|c| c.interval = clamped);
        self.set_status_message(format!(
            "poll interval {}",
            crate::model::format_duration(clamped)
        ));
    }

    /// Fire an action at the selected workspace.
    ///
    /// The call runs off the render loop; its outcome comes back through
    /// the actions channel. The registry is never mutated optimistically,
    /// so the effect only shows up via a later poll.
    pub fn request_action(&mut self, action: ActionKind) {
        let Some(id) = self.selected_workspace().map(|w| w.id.clone()) else {
            self.set_status_message("no workspace selected".to_string());
            return;
        };
        let source = Arc::clone(&self.source);
        let outcomes = self.actions.clone();
        self.set_status_message(format!("{} {} requested", action, id));
        tokio::spawn(async move {
            let result = source.act(&id, action).await;
            let _ = outcomes.send(ActionOutcome { action, id, result });
        });
    }

    /// Surface a finished action as a transient message.
    pub fn apply_action_outcome(&mut self, outcome: ActionOutcome) {
        match outcome.result {
            Ok(()) => {
                self.set_status_message(format!("{} {} accepted", outcome.action, outcome.id));
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Cycle a workspace was first observed, for the detail view.
    pub fn first_seen(&self, id: &WorkspaceId) -> Option<u64> {
        self.registry.first_seen(id)
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}
