use std::time::Duration;

use engine_error::{MessageCollection, ResponsePath, Severity};
use engine_operation::PlanCacheKey;

use crate::FieldStatus;

/// Stages of a request, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Parse,
    Validation,
    Planning,
    VariableCoercion,
    Execution,
    ResultValidation,
}

/// Hook notified as a request goes through the pipeline. Every method does
/// nothing by default.
pub trait ExecutionListener: Send + Sync {
    fn request_started(&self, _operation_name: Option<&str>) {}

    fn plan_cache_lookup(&self, _key: &PlanCacheKey, _hit: bool) {}

    fn phase_completed(&self, _phase: Phase, _duration: Duration) {}

    fn field_resolved(&self, _path: &ResponsePath, _status: FieldStatus, _duration: Duration) {}

    fn request_completed(&self, _messages: &MessageCollection, _duration: Duration) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ExecutionListener for NoopListener {}

/// Forwards pipeline timings as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl ExecutionListener for TracingListener {
    fn request_started(&self, operation_name: Option<&str>) {
        tracing::debug!(operation_name, "request started");
    }

    fn plan_cache_lookup(&self, key: &PlanCacheKey, hit: bool) {
        tracing::debug!(%key, hit, "plan cache lookup");
    }

    fn phase_completed(&self, phase: Phase, duration: Duration) {
        tracing::debug!(phase = phase.as_ref(), duration_ms = duration.as_millis(), "phase completed");
    }

    fn field_resolved(&self, path: &ResponsePath, status: FieldStatus, duration: Duration) {
        tracing::trace!(%path, %status, duration_us = duration.as_micros(), "field resolved");
    }

    fn request_completed(&self, messages: &MessageCollection, duration: Duration) {
        let errors = messages.count_at_least(Severity::Critical);
        if errors > 0 {
            tracing::info!(errors, duration_ms = duration.as_millis(), "request completed with errors");
        } else {
            tracing::info!(duration_ms = duration.as_millis(), "request completed");
        }
    }
}
