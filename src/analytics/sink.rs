// src/analytics/sink.rs — Event delivery
//
// Emission is fire-and-forget: `emit` never blocks, never fails, and never
// reports back. The channel sink hands events to a background task that
// POSTs them to the configured endpoint; delivery failures are logged at
// warn and the event is dropped. No retry, no dead-letter queue.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::analytics::events::AnalyticsEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: AnalyticsEvent);
}

/// Logs events at debug level. Default when no endpoint is configured.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: AnalyticsEvent) {
        tracing::debug!(
            event = event.name,
            payload = %serde_json::Value::Object(event.payload),
            "analytics event"
        );
    }
}

/// Non-blocking sink backed by an unbounded channel and a delivery task.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AnalyticsEvent>,
}

impl ChannelSink {
    /// Spawns the delivery task and returns the sending half. Must be
    /// called from within a tokio runtime.
    pub fn spawn(client: reqwest::Client, endpoint: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AnalyticsEvent>();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let body = serde_json::json!({
                    "event": event.name,
                    "properties": serde_json::Value::Object(event.payload),
                });
                match client.post(&endpoint).json(&body).send().await {
                    Ok(response) if !response.status().is_success() => {
                        tracing::warn!(
                            event = event.name,
                            status = %response.status(),
                            "analytics endpoint rejected event, dropping"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            event = event.name,
                            error = %e,
                            "analytics delivery failed, dropping"
                        );
                    }
                }
            }
        });

        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: AnalyticsEvent) {
        // Receiver gone means the runtime is shutting down; nothing to do.
        let _ = self.tx.send(event);
    }
}

/// Collects events in memory. Used by tests to assert on emission order
/// and payload contents.
#[derive(Debug, Default)]
pub struct CaptureSink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl CaptureSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn captured(&self) -> Vec<AnalyticsEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Event names in emission order.
    pub fn names(&self) -> Vec<&'static str> {
        self.captured().into_iter().map(|e| e.name).collect()
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: AnalyticsEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
