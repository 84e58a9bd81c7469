//! Pipeline context management.
//!
//! Provides run context for logging and state tracking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        let run_id = format!("run-{}", &Uuid::new_v4().simple().to_string()[..8]);
        Self::with_id(&run_id, Utc::now())
    }

    pub fn with_id(run_id: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.to_string(),
            started_at,
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.run_id)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_shape() {
        let ctx = RunContext::new();
        assert!(ctx.run_id.starts_with("run-"));
        assert_eq!(ctx.run_id.len(), 12);
        assert_ne!(ctx.run_id, RunContext::new().run_id);
    }

    #[test]
    fn test_log_context() {
        let ctx = RunContext::with_id("run-fixed", Utc::now());
        assert_eq!(ctx.log_context().to_string(), "[run=run-fixed]");
    }
}
