//! Turn trace — an ordered, append-only list of what the orchestrator did.
//!
//! The trace is for display only; it is never sent back to the model.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Thinking,
    Generating,
    Validating,
    Fixing,
    Complete,
    Error,
}

impl StepKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::Generating => "generating",
            Self::Validating => "validating",
            Self::Fixing => "fixing",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThoughtStep {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub message: String,
    /// Elapsed milliseconds, for timed steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ThoughtStep {
    #[must_use]
    pub fn new(kind: StepKind, message: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), kind, message: message.into(), duration: None, details: None }
    }

    #[must_use]
    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Attach detail lines. An empty list is left off.
    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = (!details.is_empty()).then_some(details);
        self
    }
}

#[derive(Debug, Default)]
pub struct TraceRecorder {
    steps: Vec<ThoughtStep>,
}

impl TraceRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: ThoughtStep) {
        debug!(step = step.kind.as_str(), message = %step.message, duration_ms = ?step.duration, "turn: step");
        self.steps.push(step);
    }

    pub fn record(&mut self, kind: StepKind, message: impl Into<String>) {
        self.push(ThoughtStep::new(kind, message));
    }

    #[must_use]
    pub fn finish(self) -> Vec<ThoughtStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_serialize_for_the_ui() {
        let step = ThoughtStep::new(StepKind::Validating, "Found 1 issue")
            .with_duration(Duration::from_millis(1500))
            .with_details(vec!["/a.tsx: oops".into()]);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "validating");
        assert_eq!(json["duration"], 1500);
        assert_eq!(json["details"][0], "/a.tsx: oops");
        assert!(json["id"].as_str().is_some());
    }

    #[test]
    fn optional_fields_are_omitted() {
        let json = serde_json::to_value(ThoughtStep::new(StepKind::Thinking, "hmm").with_details(Vec::new())).unwrap();
        assert!(json.get("duration").is_none());
        assert!(json.get("details").is_none());
    }

    #[test]
    fn recorder_keeps_order() {
        let mut trace = TraceRecorder::new();
        trace.record(StepKind::Thinking, "a");
        trace.record(StepKind::Complete, "b");
        let kinds: Vec<StepKind> = trace.finish().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StepKind::Thinking, StepKind::Complete]);
    }
}
