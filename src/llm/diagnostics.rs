//! Diagnostic side channel for adapter invocations.
//!
//! The adapter reports what it sends and receives through a [`Diagnostics`]
//! collaborator instead of logging inline. `record` returns nothing, and the
//! adapter wraps every sink in [`GuardedDiagnostics`], so a sink can never
//! change the outcome of an invocation.

use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    /// Outbound request, with inline media truncated.
    Request {
        model: String,
        stream: bool,
        body: Value,
    },
    /// Status line of the gateway response.
    Status { status: u16 },
    /// Complete non-streaming response body.
    Completion { body: Value },
    /// A `data:` frame that could not be decoded and was skipped.
    MalformedFrame { payload: String, reason: String },
    /// Tool-call arguments that were not valid JSON and were replaced by `{}`.
    MalformedArguments { name: String, reason: String },
    /// End of an event stream.
    StreamEnd { frames: usize, saw_done: bool },
    /// Terminal failure converted into an error response.
    Failure { code: String, message: String },
}

/// Receiver of [`DiagnosticEvent`]s.
pub trait Diagnostics: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::Request {
                model,
                stream,
                body,
            } => {
                tracing::debug!(model = %model, stream, "LiteLLM request: {}", body);
            }
            DiagnosticEvent::Status { status } => {
                tracing::debug!("LiteLLM response status {}", status);
            }
            DiagnosticEvent::Completion { body } => {
                tracing::debug!("LiteLLM response: {}", body);
            }
            DiagnosticEvent::MalformedFrame { payload, reason } => {
                tracing::warn!("Skipping malformed stream frame ({}): {}", reason, payload);
            }
            DiagnosticEvent::MalformedArguments { name, reason } => {
                tracing::warn!("Tool call '{}' has undecodable arguments: {}", name, reason);
            }
            DiagnosticEvent::StreamEnd { frames, saw_done } => {
                tracing::debug!("LiteLLM stream ended after {} frames (done marker: {})", frames, saw_done);
            }
            DiagnosticEvent::Failure { code, message } => {
                tracing::error!("LiteLLM call failed ({}): {}", code, message);
            }
        }
    }
}

/// Shields the caller from a sink that panics: the panic is caught and the
/// event dropped.
#[derive(Clone)]
pub struct GuardedDiagnostics {
    inner: Arc<dyn Diagnostics>,
}

impl GuardedDiagnostics {
    pub fn new(inner: Arc<dyn Diagnostics>) -> Self {
        Self { inner }
    }
}

impl Diagnostics for GuardedDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        let inner = &self.inner;
        if catch_unwind(AssertUnwindSafe(|| inner.record(event))).is_err() {
            tracing::error!("Diagnostics sink panicked; event dropped");
        }
    }
}

/// Keeps every event in memory; handy for inspecting an invocation.
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnostics {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_diagnostics_keeps_order() {
        let diagnostics = RecordingDiagnostics::new();
        diagnostics.record(DiagnosticEvent::Status { status: 200 });
        diagnostics.record(DiagnosticEvent::StreamEnd {
            frames: 2,
            saw_done: true,
        });

        assert_eq!(
            diagnostics.events(),
            vec![
                DiagnosticEvent::Status { status: 200 },
                DiagnosticEvent::StreamEnd {
                    frames: 2,
                    saw_done: true
                },
            ]
        );
    }

    struct PanickingDiagnostics;

    impl Diagnostics for PanickingDiagnostics {
        fn record(&self, _event: DiagnosticEvent) {
            panic!("sink exploded");
        }
    }

    #[test]
    fn test_guarded_diagnostics_contains_sink_panics() {
        let guarded = GuardedDiagnostics::new(Arc::new(PanickingDiagnostics));
        guarded.record(DiagnosticEvent::Status { status: 200 });
        guarded.record(DiagnosticEvent::Status { status: 500 });
    }

    #[test]
    fn test_guarded_diagnostics_forwards_events() {
        let diagnostics = RecordingDiagnostics::new();
        let guarded = GuardedDiagnostics::new(Arc::new(diagnostics.clone()));
        guarded.record(DiagnosticEvent::MalformedArguments {
            name: "area".to_string(),
            reason: "expected value".to_string(),
        });
        assert_eq!(diagnostics.events().len(), 1);
    }

    #[test]
    fn test_clones_share_one_log() {
        let diagnostics = RecordingDiagnostics::new();
        let probe = diagnostics.clone();
        diagnostics.record(DiagnosticEvent::Status { status: 503 });
        assert_eq!(probe.events().len(), 1);
    }
}
