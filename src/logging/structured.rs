//! Structured logging utilities.
//!
//! Every message starts with the run context, narrowed to a line and, during
//! extraction, to an input row:
//!
//! ```text
//! [run=run-1a2b3c4d] EXTRACT_COMPLETE received=5 parsed=4 rejected=1
//! [run=run-1a2b3c4d] [row=2] ROW_REJECTED reason="malformed input" ...
//! [run=run-1a2b3c4d] [line=gr-np-47] EVENT_QUARANTINED reason="missing START" ...
//! ```
//!
//! Run-level events (`INPUT_READ`, `EXTRACT_COMPLETE`, `VALIDATION_COMPLETE`,
//! `LOAD_COMPLETE`, `BATCH_COMPLETE`) log at info. Line-scoped lifecycle
//! events (`EVENT_ACCEPTED`, `EVENT_RESUBMITTED`, `LIFECYCLE_VIOLATION`) log
//! at debug, and every quarantine (`ROW_REJECTED`, `EVENT_QUARANTINED`) at
//! warn.

use std::fmt;

/// Logging context for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub run_id: String,
    pub line_id: Option<String>,
    /// Zero-based data row position, set while a row is being extracted.
    pub row: Option<usize>,
}

impl LogContext {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            line_id: None,
            row: None,
        }
    }

    /// Narrow to one production line.
    pub fn with_line(&self, line_id: &str) -> Self {
        Self {
            line_id: Some(line_id.to_string()),
            ..self.clone()
        }
    }

    /// Narrow to one input row; rows are identified before their line id is
    /// known to be valid.
    pub fn with_row(&self, position: usize) -> Self {
        Self {
            row: Some(position),
            ..self.clone()
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[run={}]", self.run_id)?;
        if let Some(line) = &self.line_id {
            write!(f, " [line={}]", line)?;
        }
        if let Some(row) = self.row {
            write!(f, " [row={}]", row)?;
        }
        Ok(())
    }
}

/// Initialize the process-wide logger.
///
/// Defaults to `info`; `RUST_LOG` overrides. Safe to call more than once.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::error!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}
