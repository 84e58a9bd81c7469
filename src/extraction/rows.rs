//! Tabular row extraction.
//!
//! Turns the raw input text into typed rows. Rows that cannot be typed
//! (wrong field count, empty line id, unparsable timestamp, unknown status)
//! are rejected here and never reach the sequential validator.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{PipelineError, Result};
use crate::event::{ProductionEvent, QuarantineReason, QuarantinedEvent, Status};
use crate::extraction::timestamp::parse_timestamp;
use crate::log_warn;
use crate::logging::structured::LogContext;

/// Accepted header names for each column.
const LINE_COLUMNS: &[&str] = &["production_line_id", "line_id"];
const STATUS_COLUMNS: &[&str] = &["status", "status_name"];
const TIME_COLUMNS: &[&str] = &["timestamp", "event_time"];

/// A row exactly as it appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Zero-based position among data rows; used as the stable tie-breaker.
    pub position: usize,
    pub line_id: String,
    pub status: String,
    pub timestamp: String,
}

/// A row whose fields all parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub raw: RawRow,
    pub event: ProductionEvent,
}

/// Result of extracting a whole input.
#[derive(Debug, Default)]
pub struct ExtractedBatch {
    pub received: usize,
    pub rows: Vec<ParsedRow>,
    pub rejected: Vec<QuarantinedEvent>,
}

/// Column positions of the three required fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    line: usize,
    status: usize,
    time: usize,
    width: usize,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            line: 0,
            status: 1,
            time: 2,
            width: 3,
        }
    }
}

/// Byte-order mark some spreadsheet exports put before the first row.
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Read the input file as raw bytes, distinguishing a missing file from
/// other I/O errors. Decoding happens per row in [`extract_rows`].
pub fn read_input_file(path: &Path) -> Result<Vec<u8>> {
    match std::fs::read(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PipelineError::InputMissing {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(PipelineError::InputRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// One non-blank input line. `Err` holds the lossy text of a line that is
/// not valid UTF-8.
type DecodedLine<'a> = std::result::Result<&'a str, String>;

fn decode_lines(input: &[u8]) -> Vec<DecodedLine<'_>> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    input
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(&b"\r"[..]).unwrap_or(line))
        .map(|line| std::str::from_utf8(line).map_err(|_| String::from_utf8_lossy(line).into_owned()))
        .filter(|line| match line {
            Ok(text) => !text.trim().is_empty(),
            Err(_) => true,
        })
        .collect()
}

/// Extract typed rows from comma-separated input.
///
/// A header is optional. When present it may list the columns in any order,
/// but must name all three; otherwise the whole input is rejected. A row
/// that is not valid UTF-8 is quarantined as malformed; the rest of the
/// batch is still extracted.
pub fn extract_rows(
    input: impl AsRef<[u8]>,
    rejected_at: DateTime<Utc>,
    ctx: &LogContext,
) -> Result<ExtractedBatch> {
    let mut lines = decode_lines(input.as_ref()).into_iter().peekable();
    let mut batch = ExtractedBatch::default();

    let columns = match lines.peek() {
        Some(Ok(first)) if looks_like_header(first) => {
            let header = split_fields(first);
            lines.next();
            let map = map_header(&header)?;
            log::debug!("{} INPUT_HEADER columns={:?}", ctx, header);
            map
        }
        _ => ColumnMap::default(),
    };

    for (position, line) in lines.enumerate() {
        batch.received += 1;
        let (raw, parsed) = match &line {
            Ok(text) => {
                let fields = split_fields(text);
                let raw = raw_row(position, &fields, &columns);
                let parsed = parse_row(&raw, fields.len(), &columns);
                (raw, parsed)
            }
            Err(lossy) => {
                let raw = raw_row(position, &split_fields(lossy), &columns);
                (raw, Err(QuarantineReason::MalformedInput))
            }
        };

        match parsed {
            Ok(event) => batch.rows.push(ParsedRow { raw, event }),
            Err(reason) => {
                log_warn!(
                    ctx.with_row(position),
                    "ROW_REJECTED",
                    reason = reason.as_str(),
                    line_id = raw.line_id,
                    status = raw.status,
                    timestamp = raw.timestamp,
                );
                batch.rejected.push(QuarantinedEvent::new(
                    &raw.line_id,
                    &raw.status,
                    &raw.timestamp,
                    reason,
                    rejected_at,
                ));
            }
        }
    }

    log::info!(
        "{} EXTRACT_COMPLETE received={} parsed={} rejected={}",
        ctx,
        batch.received,
        batch.rows.len(),
        batch.rejected.len()
    );

    Ok(batch)
}

fn parse_row(raw: &RawRow, field_count: usize, columns: &ColumnMap) -> std::result::Result<ProductionEvent, QuarantineReason> {
    if field_count != columns.width || raw.line_id.is_empty() {
        return Err(QuarantineReason::MalformedInput);
    }
    let event_time = parse_timestamp(&raw.timestamp).ok_or(QuarantineReason::MalformedInput)?;
    let status: Status = raw
        .status
        .parse()
        .map_err(|_| QuarantineReason::UnknownStatus)?;
    Ok(ProductionEvent::new(raw.line_id.clone(), status, event_time))
}

fn raw_row(position: usize, fields: &[String], columns: &ColumnMap) -> RawRow {
    let field = |idx: usize| fields.get(idx).cloned().unwrap_or_default();
    RawRow {
        position,
        line_id: field(columns.line),
        status: field(columns.status),
        timestamp: field(columns.time),
    }
}

/// Split a record on commas, honouring double-quoted fields (`""` is an
/// escaped quote) and trimming whitespace around each field.
pub(crate) fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn looks_like_header(line: &str) -> bool {
    split_fields(line).iter().any(|f| {
        let f = normalize(f);
        LINE_COLUMNS.contains(&f.as_str())
            || STATUS_COLUMNS.contains(&f.as_str())
            || TIME_COLUMNS.contains(&f.as_str())
    })
}

fn map_header(header: &[String]) -> Result<ColumnMap> {
    let find = |names: &[&str]| {
        header
            .iter()
            .position(|h| names.contains(&normalize(h).as_str()))
    };

    let line = find(LINE_COLUMNS);
    let status = find(STATUS_COLUMNS);
    let time = find(TIME_COLUMNS);

    match (line, status, time) {
        (Some(line), Some(status), Some(time)) => Ok(ColumnMap {
            line,
            status,
            time,
            width: header.len(),
        }),
        _ => {
            let mut missing = Vec::new();
            if line.is_none() {
                missing.push(LINE_COLUMNS[0].to_string());
            }
            if status.is_none() {
                missing.push(STATUS_COLUMNS[0].to_string());
            }
            if time.is_none() {
                missing.push(TIME_COLUMNS[0].to_string());
            }
            Err(PipelineError::InputSchema { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(input: &str) -> ExtractedBatch {
        extract_rows(input, Utc::now(), &LogContext::new("test-run")).unwrap()
    }

    #[test]
    fn test_extract_with_header() {
        let batch = extract(
            "production_line_id,status,timestamp\n\
             L1,START,2024-01-01 08:00:00\n\
             L1,STOP,2024-01-01 08:10:00\n",
        );
        assert_eq!(batch.received, 2);
        assert_eq!(batch.rows.len(), 2);
        assert!(batch.rejected.is_empty());
        assert_eq!(batch.rows[1].event.status, Status::Stop);
        assert_eq!(batch.rows[1].raw.position, 1);
    }

    #[test]
    fn test_extract_without_header() {
        let batch = extract("L1,START,2024-01-01 08:00:00\n");
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].event.line_id, "L1");
    }

    #[test]
    fn test_extract_reordered_header() {
        let batch = extract("timestamp,production_line_id,status\n2024-01-01 08:00:00,L9,ON\n");
        assert_eq!(batch.rows[0].event.line_id, "L9");
        assert_eq!(batch.rows[0].event.status, Status::On);
    }

    #[test]
    fn test_header_missing_column_is_fatal() {
        let err = extract_rows(
            "production_line_id,timestamp\nL1,2024-01-01 08:00:00\n",
            Utc::now(),
            &LogContext::new("test-run"),
        )
        .unwrap_err();
        match err {
            PipelineError::InputSchema { missing } => assert_eq!(missing, vec!["status"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        let batch = extract("L1,PAUSED,2024-01-01 08:00:00\n");
        assert!(batch.rows.is_empty());
        assert_eq!(batch.rejected[0].reason, QuarantineReason::UnknownStatus);
        assert_eq!(batch.rejected[0].status, "PAUSED");
    }

    #[test]
    fn test_malformed_rows_rejected() {
        let batch = extract(
            "L1,START,not-a-time\n\
             L1,START\n\
             ,START,2024-01-01 08:00:00\n",
        );
        assert_eq!(batch.received, 3);
        assert_eq!(batch.rejected.len(), 3);
        assert!(batch
            .rejected
            .iter()
            .all(|q| q.reason == QuarantineReason::MalformedInput));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let batch = extract("\nL1,START,2024-01-01 08:00:00\n\n");
        assert_eq!(batch.received, 1);
    }

    #[test]
    fn test_leading_bom_stripped_without_header() {
        let batch = extract("\u{feff}L1,START,2024-01-01 08:00:00\nL1,STOP,2024-01-01 08:10:00\n");
        assert_eq!(batch.rows.len(), 2);
        assert!(batch.rows.iter().all(|r| r.event.line_id == "L1"));
    }

    #[test]
    fn test_leading_bom_before_header() {
        let batch = extract("\u{feff}production_line_id,status,timestamp\nL1,START,2024-01-01 08:00:00\n");
        assert_eq!(batch.received, 1);
        assert_eq!(batch.rows[0].event.line_id, "L1");
    }

    #[test]
    fn test_invalid_utf8_row_quarantined() {
        let mut input = b"L1,START,2024-01-01 08:00:00\n".to_vec();
        input.extend_from_slice(b"L\xff2,ON,2024-01-01 08:05:00\r\n");
        input.extend_from_slice(b"L1,STOP,2024-01-01 08:10:00\n");

        let batch = extract_rows(&input, Utc::now(), &LogContext::new("test-run")).unwrap();
        assert_eq!(batch.received, 3);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].reason, QuarantineReason::MalformedInput);
        assert_eq!(batch.rejected[0].line_id, "L\u{fffd}2");
        assert_eq!(batch.rejected[0].event_time, "2024-01-01 08:05:00");
    }

    #[test]
    fn test_quoted_comma_kept_in_field() {
        let batch = extract("\"Line, A\",START,2024-01-01 08:00:00\n");
        assert!(batch.rejected.is_empty());
        assert_eq!(batch.rows[0].event.line_id, "Line, A");
    }

    #[test]
    fn test_split_fields_quoting() {
        assert_eq!(split_fields(r#" "a ""b""", c ,"""#), vec!["a \"b\"", "c", ""]);
        assert_eq!(split_fields("x,,y"), vec!["x", "", "y"]);
        assert_eq!(split_fields(r#"L"1,ON"#), vec!["L\"1", "ON"]);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_input_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::InputMissing { .. }));
    }
}
