//! Progress emission for pipeline stages

use factcheck_sdk::{ProgressEvent, ProgressKind, ProgressObserver};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Handle through which stages report milestones
///
/// Each emission awaits the observer before the stage continues. Observer
/// errors are logged and swallowed; an observer that exceeds the configured
/// timeout is abandoned for that event.
#[derive(Clone, Default)]
pub struct ProgressSink {
    observer: Option<Arc<dyn ProgressObserver>>,
    timeout: Option<Duration>,
}

impl ProgressSink {
    pub fn new(observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            observer: Some(observer),
            timeout: None,
        }
    }

    /// A sink that drops every event
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.observer.is_some()
    }

    pub async fn emit(&self, kind: ProgressKind, payload: Value) {
        let Some(observer) = &self.observer else {
            return;
        };

        let event = ProgressEvent::with_payload(kind, payload);
        let delivery = observer.on_event(&event);

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, delivery).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        kind = %kind,
                        timeout_ms = limit.as_millis() as u64,
                        "progress observer timed out; event dropped"
                    );
                    return;
                }
            },
            None => delivery.await,
        };

        if let Err(e) = result {
            tracing::warn!(kind = %kind, error = %e, "progress observer failed; continuing");
        }
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSink")
            .field("enabled", &self.is_enabled())
            .field("timeout", &self.timeout)
            .finish()
    }
}
