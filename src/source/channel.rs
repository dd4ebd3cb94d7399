//! Channel-backed workspace source.
//!
//! Listings are pushed in through a tokio watch channel and each query
//! returns whatever was sent last. Useful for embedders that already hold
//! workspace data, and for driving the engine in tests.

use async_trait::async_trait;
use tokio::sync::watch;

use super::{ActionKind, SourceError, WorkspaceSource};
use crate::model::{Sample, WorkspaceId};

/// A workspace source fed through a watch channel.
///
/// The producer pushes listings through the sender half; the sampler
/// reads the latest one on every poll.
///
/// # Example
///
/// ```
/// use gastop::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("in-process feed");
/// tx.send(Vec::new()).unwrap();
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<Vec<Sample>>,
    description: String,
}

impl ChannelSource {
    /// Wrap the receiving end of a watch channel.
    pub fn new(receiver: watch::Receiver<Vec<Sample>>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            receiver,
            description,
        }
    }

    /// Create a channel pair for feeding listings to a ChannelSource.
    ///
    /// Returns (sender, source); the sender pushes listings and the
    /// source hands them to the sampler.
    pub fn create(source_description: &str) -> (watch::Sender<Vec<Sample>>, Self) {
        let (tx, rx) = watch::channel(Vec::new());
        let source = Self::new(rx, source_description);
        (tx, source)
    }
}

#[async_trait]
impl WorkspaceSource for ChannelSource {
    async fn query(&self) -> Result<Vec<Sample>, SourceError> {
        Ok(self.receiver.borrow().clone())
    }

    async fn act(&self, id: &WorkspaceId, action: ActionKind) -> Result<(), SourceError> {
        Err(SourceError::ActionFailed {
            action,
            id: id.clone(),
            reason: "channel source cannot reach workspaces".to_string(),
        })
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportedState;

    fn sample(name: &str) -> Sample {
        Sample {
            id: WorkspaceId::from_parts("nux", name),
            name: name.to_string(),
            rig: "nux".to_string(),
            state: ReportedState::Working,
            bead: None,
            session_id: None,
            running: true,
            attached: false,
            started_at_ms: None,
            last_activity_ms: None,
            counters: None,
        }
    }

    #[tokio::test]
    async fn test_query_returns_latest() {
        let (tx, source) = ChannelSource::create("test feed");
        assert!(source.query().await.unwrap().is_empty());

        tx.send(vec![sample("slit"), sample("capable")]).unwrap();
        assert_eq!(source.query().await.unwrap().len(), 2);

        tx.send(vec![sample("slit")]).unwrap();
        assert_eq!(source.query().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_act_is_rejected() {
        let (_tx, source) = ChannelSource::create("test feed");
        let id = WorkspaceId::new("nux/slit");
        let err = source.act(&id, ActionKind::Nudge).await.unwrap_err();
        assert!(matches!(err, SourceError::ActionFailed { .. }));
        assert_eq!(source.description(), "channel: test feed");
    }
}
