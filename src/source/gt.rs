//! Gas Town CLI source.
//!
//! Shells out to `gt polecat list --json` to discover workspaces, and to
//! `gt polecat kill`/`gt polecat nudge` for actions. Commands run in the
//! town root when one is known.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{parse_listing, ActionKind, SourceError, WorkspaceSource};
use crate::model::{Sample, WorkspaceId};

/// Workspace source backed by the `gt` command-line tool.
pub struct GtSource {
    gt_path: String,
    town_root: Option<PathBuf>,
    rig: Option<String>,
}

impl GtSource {
    /// Create a source using the given `gt` binary.
    ///
    /// With `rig` set, only that rig's workspaces are listed; otherwise
    /// the whole town is.
    pub fn new(gt_path: impl Into<String>, town_root: Option<PathBuf>, rig: Option<String>) -> Self {
        Self {
            gt_path: gt_path.into(),
            town_root,
            rig,
        }
    }

    pub fn town_root(&self) -> Option<&Path> {
        self.town_root.as_deref()
    }

    async fn run_gt(&self, args: &[&str]) -> Result<Vec<u8>, String> {
        debug!("running {} {}", self.gt_path, args.join(" "));

        let mut cmd = Command::new(&self.gt_path);
        cmd.args(args);
        if let Some(root) = &self.town_root {
            cmd.current_dir(root);
        }
        // The sampler's timeout drops this future; the child must die with it.
        cmd.kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .map_err(|e| format!("cannot run {}: {}", self.gt_path, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "gt {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            ));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl WorkspaceSource for GtSource {
    async fn query(&self) -> Result<Vec<Sample>, SourceError> {
        let mut args = vec!["polecat", "list", "--json"];
        match &self.rig {
            Some(rig) => args.push(rig),
            None => args.push("--all"),
        }

        let stdout = self
            .run_gt(&args)
            .await
            .map_err(SourceError::Unavailable)?;
        parse_listing(&stdout)
    }

    async fn act(&self, id: &WorkspaceId, action: ActionKind) -> Result<(), SourceError> {
        self.run_gt(&["polecat", action.verb(), id.as_str()])
            .await
            .map_err(|reason| SourceError::ActionFailed {
                action,
                id: id.clone(),
                reason,
            })?;
        Ok(())
    }

    fn description(&self) -> String {
        match &self.town_root {
            Some(root) => format!("gt: {}", root.display()),
            None => "gt".to_string(),
        }
    }
}

/// Locate the Gas Town root.
///
/// `GT_TOWN_ROOT` wins when set; otherwise walk up from the current
/// directory looking for town markers.
pub fn detect_town_root() -> Option<PathBuf> {
    if let Ok(root) = std::env::var("GT_TOWN_ROOT") {
        if !root.is_empty() {
            return Some(PathBuf::from(root));
        }
    }
    let cwd = std::env::current_dir().ok()?;
    town_root_from(&cwd)
}

/// Walk up from `start` (at most 5 levels) looking for a directory with a
/// `.beads/` or `mayor/` marker.
pub(crate) fn town_root_from(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    for _ in 0..5 {
        if is_town_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

fn is_town_root(dir: &Path) -> bool {
    dir.join(".beads").is_dir() || dir.join("mayor").is_dir()
}
