//! Transparency log of agent activity for the UI sidebar.
//!
//! Events are published fire-and-forget: a slow or dropped consumer
//! never blocks a turn, and ordering within the stream follows the
//! invocation order chosen by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tokio::sync::mpsc;

/// Lifecycle stage of one agent or engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ActivityStage {
    Started,
    Finished,
    Failed,
}

/// A single transparency log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub agent: String,
    pub stage: ActivityStage,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Consumer of the activity stream. Implementations must not block.
pub trait ActivitySink: Send + Sync {
    fn publish(&self, event: ActivityEvent);
}

/// Sink backed by an unbounded channel; the display layer drains the
/// receiver at its own pace. A dropped receiver is silently ignored.
pub struct ChannelActivitySink {
    sender: mpsc::UnboundedSender<ActivityEvent>,
}

impl ChannelActivitySink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ActivityEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ActivitySink for ChannelActivitySink {
    fn publish(&self, event: ActivityEvent) {
        let _ = self.sender.send(event);
    }
}

/// Sink that discards everything. Useful when no display is attached.
pub struct NullActivitySink;

impl ActivitySink for NullActivitySink {
    fn publish(&self, _event: ActivityEvent) {}
}

/// Emits lifecycle events on behalf of the orchestrator and the
/// extraction engine. A pure observer: it has no control-flow authority.
#[derive(Clone)]
pub struct ActivityReporter {
    sink: std::sync::Arc<dyn ActivitySink>,
}

impl ActivityReporter {
    pub fn new(sink: std::sync::Arc<dyn ActivitySink>) -> Self {
        Self { sink }
    }

    /// Reporter wired to nothing, for headless use.
    pub fn disabled() -> Self {
        Self::new(std::sync::Arc::new(NullActivitySink))
    }

    pub fn started(&self, agent: &str, description: impl Into<String>) {
        self.emit(agent, ActivityStage::Started, description.into());
    }

    pub fn finished(&self, agent: &str, description: impl Into<String>) {
        self.emit(agent, ActivityStage::Finished, description.into());
    }

    pub fn failed(&self, agent: &str, description: impl Into<String>) {
        self.emit(agent, ActivityStage::Failed, description.into());
    }

    fn emit(&self, agent: &str, stage: ActivityStage, description: String) {
        self.sink.publish(ActivityEvent {
            agent: agent.to_string(),
            stage,
            description,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Sink that records everything, for assertions.
    pub struct MemorySink {
        pub events: Mutex<Vec<ActivityEvent>>,
    }

    impl MemorySink {
        pub fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }
    }

    impl ActivitySink for MemorySink {
        fn publish(&self, event: ActivityEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn events_preserve_emission_order() {
        let sink = Arc::new(MemorySink::new());
        let reporter = ActivityReporter::new(sink.clone());

        reporter.started("Rescue Agent", "looking up safety instructions");
        reporter.finished("Rescue Agent", "brief ready");
        reporter.started("Resource Agent", "contact lookup");
        reporter.failed("Resource Agent", "no sources reachable");

        let events = sink.events.lock().unwrap();
        let stages: Vec<ActivityStage> = events.iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                ActivityStage::Started,
                ActivityStage::Finished,
                ActivityStage::Started,
                ActivityStage::Failed,
            ]
        );
        assert_eq!(events[2].agent, "Resource Agent");
    }

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelActivitySink::new();
        let reporter = ActivityReporter::new(Arc::new(sink));

        reporter.started("Orchestrator", "classifying intent");
        reporter.finished("Orchestrator", "intent classified");

        assert_eq!(rx.recv().await.unwrap().stage, ActivityStage::Started);
        assert_eq!(rx.recv().await.unwrap().stage, ActivityStage::Finished);
    }

    #[test]
    fn dropped_receiver_does_not_block_publisher() {
        let (sink, rx) = ChannelActivitySink::new();
        drop(rx);
        let reporter = ActivityReporter::new(Arc::new(sink));
        reporter.started("Orchestrator", "still fine");
    }
}
