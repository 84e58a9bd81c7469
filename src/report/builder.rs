//! Report assembly.
//!
//! Collects the Q1/Q2/Q3 answers and the load outcome into one value that
//! renders either as text or JSON.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analytics::{Analytics, DowntimeRank, FloorSummary, LineCycles};
use crate::error::{PipelineError, Result};
use crate::event::format_timestamp;
use crate::pipeline::BatchResult;
use crate::report::markdown::{format_markdown_table, format_minutes};

const RULE: &str = "=====================================================";

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Everything the report shows.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    /// `None` when the run did not load a batch.
    pub batch: Option<BatchResult>,
    pub q1_cycles: LineCycles,
    pub q2_floor: FloorSummary,
    pub q3_top_downtime: Vec<DowntimeRank>,
    pub quarantine_total: usize,
}

impl Report {
    pub fn build(
        run_id: &str,
        analytics: &Analytics,
        q1_line: &str,
        top_n: usize,
        batch: Option<BatchResult>,
        quarantine_total: usize,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            run_id: run_id.to_string(),
            batch,
            q1_cycles: analytics.cycles_for_line(q1_line),
            q2_floor: analytics.floor_summary(),
            q3_top_downtime: analytics.top_downtime_lines(top_n),
            quarantine_total,
        }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = vec![
            RULE.to_string(),
            "=== Production Floor Pipeline Execution Log ===".to_string(),
            format!(
                "=== Execution Date: {} ===",
                self.generated_at.format("%Y-%m-%d %H:%M:%S")
            ),
            format!("=== Run: {} ===", self.run_id),
            RULE.to_string(),
        ];

        match &self.batch {
            Some(batch) => {
                out.push("\nLoad Status: SUCCESS".to_string());
                out.push(format!(
                    "Rows received: {} | accepted: {} | resubmitted: {} | quarantined: {}",
                    batch.received_count,
                    batch.accepted_count,
                    batch.resubmitted_count,
                    batch.quarantined_count()
                ));
                out.push(format!(
                    "Facts inserted: {} | already present: {} | lines registered: {}\n",
                    batch.load.inserted, batch.load.already_present, batch.load.lines_registered
                ));
            }
            None => out.push("\nLoad Status: SKIPPED\n".to_string()),
        }

        out.push(RULE.to_string());
        out.push("=== ANALYTICS REPORTING ===".to_string());
        out.push(RULE.to_string());
        out.push(self.render_q1());
        out.push(self.render_q2());
        out.push(self.render_q3());
        out.push(format!(
            "\nQuarantined rows (all runs): {}",
            self.quarantine_total
        ));
        out.join("\n")
    }

    fn render_q1(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .q1_cycles
            .completed
            .iter()
            .chain(&self.q1_cycles.in_progress)
            .map(|c| {
                vec![
                    format_timestamp(&c.start),
                    c.stop
                        .as_ref()
                        .map(format_timestamp)
                        .unwrap_or_else(|| "in progress".to_string()),
                    c.duration_secs
                        .map(format_minutes)
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();

        format!(
            "--- Q1: Process Cycles for Line '{}' ---\n{}\nCompleted cycles: {} | total: {}",
            self.q1_cycles.line_id,
            format_markdown_table(&["start_timestamp", "stop_timestamp", "duration"], &rows),
            self.q1_cycles.completed.len(),
            format_minutes(self.q1_cycles.total_completed_secs())
        )
    }

    fn render_q2(&self) -> String {
        let q2 = &self.q2_floor;
        let summary = format_markdown_table(
            &["Total Up/Down-time", "Total", "In Full Cycles"],
            &[
                vec![
                    "Total Uptime".to_string(),
                    format_minutes(q2.total_uptime_secs),
                    format_minutes(q2.full_cycle_uptime_secs),
                ],
                vec![
                    "Total Downtime".to_string(),
                    format_minutes(q2.total_downtime_secs),
                    format_minutes(q2.total_downtime_secs),
                ],
            ],
        );
        let per_line: Vec<Vec<String>> = q2
            .per_line
            .iter()
            .map(|t| {
                vec![
                    t.line_id.clone(),
                    format_minutes(t.uptime_secs),
                    format_minutes(t.downtime_secs),
                    t.completed_cycles.to_string(),
                    t.open_cycles.to_string(),
                ]
            })
            .collect();

        format!(
            "\n--- Q2: Total Floor Uptime and Downtime ---\n{}\n\n{}",
            summary,
            format_markdown_table(
                &["production_line_id", "uptime", "downtime", "cycles", "open_cycles"],
                &per_line
            )
        )
    }

    fn render_q3(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .q3_top_downtime
            .iter()
            .map(|r| vec![r.line_id.clone(), format_minutes(r.downtime_secs)])
            .collect();
        format!(
            "\n--- Q3: Production Line with Most Downtime ---\n{}",
            format_markdown_table(&["production_line_id", "downtime"], &rows)
        )
    }
}

/// Write rendered report content to `path`.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|source| PipelineError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("REPORT_WRITTEN path={}", path.display());
    Ok(())
}
