//! Fatal pipeline errors.
//!
//! Row-level data-quality problems never surface here; they are routed to
//! quarantine. Everything in this module stops the run before any partial
//! load is committed.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that terminate a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input file does not exist.
    #[error("input file not found: {}", path.display())]
    InputMissing { path: PathBuf },

    /// Input file exists but could not be read.
    #[error("failed to read input file {}: {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Header row is present but lacks a required column.
    #[error("input header is missing required column(s): {}", missing.join(", "))]
    InputSchema { missing: Vec<String> },

    /// Persistence layer failed (unreachable, locked, constraint breach).
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Persisted schema does not match what the pipeline expects.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// Configuration is invalid.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Report or batch summary could not be serialized to JSON.
    #[error("failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Report or quarantine export could not be written.
    #[error("failed to write {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Process exit status classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Unexpected,
    ConfigOrStorage,
    InputMissing,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Unexpected => 1,
            ExitStatus::ConfigOrStorage => 2,
            ExitStatus::InputMissing => 3,
        }
    }
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        PipelineError::Config {
            message: message.into(),
        }
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Name of the external dependency that failed, for operator messages.
    pub fn dependency(&self) -> &'static str {
        match self {
            PipelineError::InputMissing { .. }
            | PipelineError::InputRead { .. }
            | PipelineError::InputSchema { .. } => "input file",
            PipelineError::Storage(_) | PipelineError::SchemaMismatch { .. } => "database",
            PipelineError::Config { .. } => "configuration",
            PipelineError::Serialization(_) | PipelineError::ReportWrite { .. } => "report output",
        }
    }

    pub fn exit_status(&self) -> ExitStatus {
        match self {
            PipelineError::InputMissing { .. } => ExitStatus::InputMissing,
            PipelineError::Storage(_)
            | PipelineError::SchemaMismatch { .. }
            | PipelineError::Config { .. } => ExitStatus::ConfigOrStorage,
            PipelineError::InputRead { .. }
            | PipelineError::InputSchema { .. }
            | PipelineError::Serialization(_)
            | PipelineError::ReportWrite { .. } => ExitStatus::Unexpected,
        }
    }
}
