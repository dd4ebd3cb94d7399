//! Workspace source abstraction and implementations.
//!
//! A source answers two questions: which workspaces exist right now
//! ([`WorkspaceSource::query`]), and can an action be applied to one of
//! them ([`WorkspaceSource::act`]). Implementations:
//!
//! - [`GtSource`]: shells out to the Gas Town `gt` CLI (the default)
//! - [`FileSource`]: reads a captured JSON listing from disk
//! - [`ChannelSource`]: receives listings over a tokio watch channel,
//!   for embedding and tests

mod channel;
mod file;
mod gt;
mod wire;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use gt::{detect_town_root, GtSource};
pub use wire::parse_listing;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Sample, WorkspaceId};

/// Action a user can request on a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Kill the session backing the workspace.
    Kill,
    /// Prod an apparently stuck workspace to resume.
    Nudge,
}

impl ActionKind {
    /// The `gt polecat` subcommand verb for this action.
    pub fn verb(&self) -> &'static str {
        match self {
            ActionKind::Kill => "kill",
            ActionKind::Nudge => "nudge",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Errors a workspace source can produce.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The source could not be queried at all this cycle.
    #[error("workspace source unavailable: {0}")]
    Unavailable(String),
    /// The query did not complete within the poll interval.
    #[error("workspace source timed out after {0:?}")]
    Timeout(Duration),
    /// An action on a single workspace was rejected or failed.
    #[error("{action} {id} failed: {reason}")]
    ActionFailed {
        action: ActionKind,
        id: WorkspaceId,
        reason: String,
    },
}

/// A live source of workspace observations.
///
/// Both operations may be slow. The sampler wraps `query` in a timeout
/// and neither is ever invoked on the render path.
#[async_trait]
pub trait WorkspaceSource: Send + Sync {
    /// Fetch the current set of workspaces.
    async fn query(&self) -> Result<Vec<Sample>, SourceError>;

    /// Apply an action to one workspace.
    ///
    /// Fire-and-forget from the engine's perspective: a success here only
    /// means the request was accepted. The effect shows up (or doesn't)
    /// in a later query.
    async fn act(&self, id: &WorkspaceId, action: ActionKind) -> Result<(), SourceError>;

    /// Human-readable description for the header line.
    fn description(&self) -> String;
}
