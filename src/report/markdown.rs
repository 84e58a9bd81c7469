//! Markdown table rendering.

/// Minimum column width, so short headers still line up.
const MIN_COLUMN_WIDTH: usize = 10;

/// Render rows as a left-aligned markdown table.
///
/// Returns "No results found." when there are no rows.
pub fn format_markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "No results found.".to_string();
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain([h.chars().count(), MIN_COLUMN_WIDTH])
                .max()
                .unwrap_or(MIN_COLUMN_WIDTH)
        })
        .collect();

    let render = |cells: Vec<&str>| {
        let parts: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("| {} |", parts.join(" | "))
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(render(headers.to_vec()));
    let separator: Vec<String> = widths.iter().map(|w| format!(":{}", "-".repeat(w + 1))).collect();
    out.push(format!("|{}|", separator.join("|")));
    for row in rows {
        out.push(render(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

/// Seconds rendered as minutes with two decimals.
pub fn format_minutes(secs: i64) -> String {
    format!("{:.2} minutes", secs as f64 / 60.0)
}
