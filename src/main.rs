use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gastop::app::{ActionOutcome, App};
use gastop::config::{self, Settings};
use gastop::events;
use gastop::model::Stamp;
use gastop::registry::Registry;
use gastop::sampler::{self, SampleBatch, SamplerControl};
use gastop::source::{detect_town_root, FileSource, GtSource, WorkspaceSource};
use gastop::ui;

#[derive(Parser, Debug)]
#[command(name = "gastop")]
#[command(version)]
#[command(about = "Live terminal monitor for Gas Town polecat workspaces")]
struct Args {
    /// Town root directory (auto-detected when omitted)
    #[arg(short, long)]
    town: Option<PathBuf>,

    /// Show only this rig's workspaces
    #[arg(short, long)]
    rig: Option<String>,

    /// Read workspace listings from a JSON file instead of running gt
    #[arg(short, long, conflicts_with_all = ["rig", "town", "gt_binary"])]
    file: Option<PathBuf>,

    /// Poll interval (e.g. "2s", "1500ms")
    #[arg(short, long)]
    interval: Option<String>,

    /// Extra cycles an absent workspace is kept on screen as terminated
    #[arg(long)]
    grace: Option<u32>,

    /// Minutes without activity before a working session counts as stalled
    #[arg(long)]
    stall_threshold: Option<u64>,

    /// Settings file (default: ~/.config/gastop/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll once, print the snapshot as JSON, and exit
    #[arg(short, long)]
    json: bool,

    /// The gt binary to shell out to
    #[arg(long)]
    gt_binary: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    let mut settings = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };

    // Command-line flags override the settings file
    if let Some(interval) = &args.interval {
        settings.interval = interval.clone();
    }
    if let Some(grace) = args.grace {
        settings.grace_cycles = grace;
    }
    if let Some(minutes) = args.stall_threshold {
        settings.stall_threshold_minutes = minutes;
    }
    if let Some(gt) = &args.gt_binary {
        settings.paths.gt_binary = gt.clone();
    }
    if let Some(town) = &args.town {
        settings.paths.town_root = Some(town.clone());
    }

    let interval = settings.poll_interval()?;

    let source: Arc<dyn WorkspaceSource> = match &args.file {
        Some(path) => Arc::new(FileSource::new(path)),
        None => {
            let town_root = settings.paths.town_root.clone().or_else(detect_town_root);
            Arc::new(GtSource::new(
                settings.paths.gt_binary.clone(),
                town_root,
                args.rig.clone(),
            ))
        }
    };

    if args.json {
        return print_snapshot(source, &settings).await;
    }

    run_tui(source, settings, interval).await
}

/// Tracing goes to the file named by `GASTOP_LOG`, or nowhere. Writing
/// log lines to the terminal would fight the interface for the screen.
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match std::env::var("GASTOP_LOG").ok().filter(|p| !p.is_empty()) {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
    Ok(())
}

/// One poll printed as JSON on stdout, for scripts.
async fn print_snapshot(source: Arc<dyn WorkspaceSource>, settings: &Settings) -> Result<()> {
    let samples = source.query().await?;
    let mut registry = Registry::new(settings.registry_config());
    let snapshot = registry.reconcile(samples, Stamp::now(1));

    let rows: Vec<serde_json::Value> = snapshot
        .workspaces
        .values()
        .map(|w| {
            serde_json::json!({
                "id": w.id.as_str(),
                "name": w.name,
                "rig": w.rig,
                "state": w.state.label(),
                "status": w.status.label(),
                "stall_reason": w.stall_reason,
                "bead": w.bead,
                "session": w.session_id,
                "attached": w.attached,
                "cpu": w.cpu,
                "mem_bytes": w.mem_bytes,
                "uptime_secs": w.uptime.map(|d| d.as_secs()),
                "idle_secs": w.idle_for.map(|d| d.as_secs()),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

/// Run the interactive interface until quit.
async fn run_tui(
    source: Arc<dyn WorkspaceSource>,
    settings: Settings,
    interval: Duration,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let (control_tx, control_rx) = watch::channel(SamplerControl::new(interval));
    let refresh = Arc::new(Notify::new());
    let cancel = CancellationToken::new();
    let (batches, sampler_task) =
        sampler::spawn(Arc::clone(&source), control_rx, Arc::clone(&refresh), cancel.clone());
    let (action_tx, action_rx) = mpsc::unbounded_channel();

    let mut app = App::new(source, &settings, interval, control_tx, refresh, action_tx);

    let result = run_loop(&mut terminal, &mut app, batches, action_rx, settings.frame_rate).await;

    // Stop the sampler before giving the terminal back
    cancel.cancel();
    let _ = sampler_task.await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// The render loop.
///
/// Input, sample batches, and action outcomes each mark the frame dirty;
/// actual drawing happens on the frame ticker, so a burst of triggers
/// costs one redraw. A quiet screen still repaints about once a second
/// to keep the data-age line honest.
async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut batches: watch::Receiver<Option<SampleBatch>>,
    mut outcomes: mpsc::UnboundedReceiver<ActionOutcome>,
    frame_rate: u32,
) -> Result<()> {
    let mut events = EventStream::new();
    let frame_budget = Duration::from_millis(1000 / u64::from(frame_rate.clamp(1, 60)));
    let mut frames = tokio::time::interval(frame_budget);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut dirty = true;
    let mut last_draw = tokio::time::Instant::now();

    while app.running {
        tokio::select! {
            changed = batches.changed() => {
                if changed.is_err() {
                    break;
                }
                let batch = batches.borrow_and_update().clone();
                if let Some(batch) = batch {
                    app.apply_batch(batch);
                    dirty = true;
                }
            }
            Some(outcome) = outcomes.recv() => {
                app.apply_action_outcome(outcome);
                dirty = true;
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        events::handle_key_event(app, key);
                        dirty = true;
                    }
                    Some(Ok(Event::Mouse(mouse))) => {
                        events::handle_mouse_event(app, mouse);
                        dirty = true;
                    }
                    Some(Ok(Event::Resize(_, _))) => {
                        dirty = true;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
            _ = frames.tick() => {
                if dirty || last_draw.elapsed() >= Duration::from_secs(1) {
                    terminal.draw(|frame| ui::draw(frame, app))?;
                    dirty = false;
                    last_draw = tokio::time::Instant::now();
                }
            }
        }
    }

    Ok(())
}
