//! Progress events emitted while a pipeline runs
//!
//! Events are transient: they are streamed to a [`ProgressObserver`] and never
//! persisted. The pipeline awaits the observer at each emission point, so an
//! observer can apply back-pressure. Observer errors are reported back to the
//! pipeline, which logs and drops them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tokio::sync::mpsc;

/// Prefix for machine-readable event lines written to stderr
pub const EVENT_LINE_PREFIX: &str = "__FACTCHECK_EVENT__:";

/// Milestones a pipeline reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    RunStarted,
    PlanningStarted,
    PlanningCompleted,
    ResearchStarted,
    ResearchCheckCompleted,
    ResearchCheckFailed,
    ResearchCompleted,
    JudgingStarted,
    JudgingCompleted,
    RunCompleted,
    RunFailed,
    ExtractionStarted,
    ExtractionCompleted,
}

impl ProgressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::PlanningStarted => "planning_started",
            Self::PlanningCompleted => "planning_completed",
            Self::ResearchStarted => "research_started",
            Self::ResearchCheckCompleted => "research_check_completed",
            Self::ResearchCheckFailed => "research_check_failed",
            Self::ResearchCompleted => "research_completed",
            Self::JudgingStarted => "judging_started",
            Self::JudgingCompleted => "judging_completed",
            Self::RunCompleted => "run_completed",
            Self::RunFailed => "run_failed",
            Self::ExtractionStarted => "extraction_started",
            Self::ExtractionCompleted => "extraction_completed",
        }
    }
}

impl fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single milestone plus its key/value payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub kind: ProgressKind,

    #[serde(default)]
    pub payload: Map<String, Value>,

    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(kind: ProgressKind) -> Self {
        Self {
            kind,
            payload: Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Build an event from a JSON value
    ///
    /// Objects become the payload as-is, `null` yields an empty payload and any
    /// other value is stored under `"value"`.
    pub fn with_payload(kind: ProgressKind, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        Self {
            kind,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.payload.get(key).and_then(Value::as_u64)
    }

    /// Emit this event to stderr as a single prefixed JSON line
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("{}{}", EVENT_LINE_PREFIX, json);
            let _ = std::io::stderr().flush();
        }
    }

    /// Parse a line produced by [`ProgressEvent::emit`]
    pub fn parse_line(line: &str) -> Option<Self> {
        line.strip_prefix(EVENT_LINE_PREFIX)
            .and_then(|json| serde_json::from_str(json).ok())
    }
}

// ============================================================================
// Observers
// ============================================================================

/// Receives progress events in pipeline order
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    async fn on_event(&self, event: &ProgressEvent) -> anyhow::Result<()>;
}

/// Writes every event to stderr as a prefixed JSON line
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrObserver;

#[async_trait]
impl ProgressObserver for StderrObserver {
    async fn on_event(&self, event: &ProgressEvent) -> anyhow::Result<()> {
        event.emit();
        Ok(())
    }
}

/// Forwards events into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ProgressObserver for ChannelObserver {
    async fn on_event(&self, event: &ProgressEvent) -> anyhow::Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| anyhow::anyhow!("progress channel closed"))
    }
}

/// Create a channel observer and the receiving end of its channel
pub fn progress_channel() -> (ChannelObserver, mpsc::UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelObserver::new(tx), rx)
}

/// Adapts a synchronous closure into an observer
pub struct FnObserver<F> {
    callback: F,
}

impl<F> FnObserver<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F> ProgressObserver for FnObserver<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    async fn on_event(&self, event: &ProgressEvent) -> anyhow::Result<()> {
        (self.callback)(event);
        Ok(())
    }
}
