//! Per-invocation run context
//!
//! Carries the run identity and the tracing span every event of the run is
//! emitted under. Built once per invocation and passed down explicitly.

use chrono::{DateTime, Utc};
use tracing::Span;
use uuid::Uuid;

use crate::types::InvocationContext;

/// Context for one handler run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique per run, also used as the document ID
    pub run_id: Uuid,
    /// Request ID from the invoking runtime, if any
    pub request_id: Option<String>,
    /// Name of the invoked function, if the runtime supplied one
    pub function_name: Option<String>,
    pub started_at: DateTime<Utc>,
    /// Parent span for all events of this run
    pub span: Span,
}

impl RunContext {
    pub fn new(invocation: &InvocationContext) -> Self {
        let run_id = Uuid::new_v4();
        let request_id = invocation.request_id.clone();
        let function_name = invocation.function_name.clone();
        let span = tracing::info_span!(
            "ocr_run",
            run_id = %run_id,
            request_id = request_id.as_deref().unwrap_or("-"),
            function = function_name.as_deref().unwrap_or("-"),
        );

        Self {
            run_id,
            request_id,
            function_name,
            started_at: Utc::now(),
            span,
        }
    }

    /// Milliseconds since the run started
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_get_distinct_ids() {
        let invocation = InvocationContext {
            request_id: Some("req-1".to_string()),
            function_name: Some("pdf-ocr-handler".to_string()),
        };
        let a = RunContext::new(&invocation);
        let b = RunContext::new(&invocation);
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.request_id.as_deref(), Some("req-1"));
        assert_eq!(a.function_name.as_deref(), Some("pdf-ocr-handler"));
        assert!(a.elapsed_ms() >= 0);
    }
}
