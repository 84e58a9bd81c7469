//! Pipeline configuration.
//!
//! Built by the binary from CLI arguments and environment fallbacks, then
//! validated before any file or database is touched.

use std::path::PathBuf;

use crate::error::{PipelineError, Result};
use crate::report::ReportFormat;

pub const DEFAULT_Q1_LINE: &str = "gr-np-47";
pub const DEFAULT_TOP_LINES: usize = 1;

/// Where the facts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Sqlite(PathBuf),
    /// In-memory store; nothing survives the process.
    DryRun,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub store: StoreLocation,
    pub input: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub quarantine_path: Option<PathBuf>,
    pub q1_line: String,
    pub top_n: usize,
    pub format: ReportFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store: StoreLocation::DryRun,
            input: None,
            report_path: None,
            quarantine_path: None,
            q1_line: DEFAULT_Q1_LINE.to_string(),
            top_n: DEFAULT_TOP_LINES,
            format: ReportFormat::Text,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.q1_line.trim().is_empty() {
            return Err(PipelineError::config("Q1 line id must not be empty"));
        }
        if self.top_n == 0 {
            return Err(PipelineError::config("top lines must be at least 1"));
        }
        if let StoreLocation::Sqlite(path) = &self.store {
            if path.as_os_str().is_empty() {
                return Err(PipelineError::config("database path must not be empty"));
            }
        }
        Ok(())
    }

    /// Input path, required by operations that load a batch.
    pub fn require_input(&self) -> Result<&PathBuf> {
        self.input
            .as_ref()
            .ok_or_else(|| PipelineError::config("no input file given (--input or LINECYCLE_INPUT)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.q1_line, "gr-np-47");
        assert_eq!(config.top_n, 1);
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let config = PipelineConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config { .. })));
    }

    #[test]
    fn test_blank_q1_line_rejected() {
        let config = PipelineConfig {
            q1_line: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_input() {
        let config = PipelineConfig::default();
        assert!(config.require_input().is_err());
    }
}
