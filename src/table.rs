//! Plain-text table rendering for console output and the text report.

use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// Renders `rows` under `headers`, padding each column to its widest cell.
///
/// `align` is matched to columns by position; missing entries are left
/// aligned. Every line starts with `indent`.
pub fn render_table(
    headers: &[&str],
    rows: &[Vec<String>],
    align: &[Align],
    indent: &str,
) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let alignment = |idx: usize| align.get(idx).copied().unwrap_or_default();
    let mut output = String::new();

    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let _ = writeln!(
        output,
        "{indent}{}",
        format_row(&header_cells, &widths, alignment)
    );

    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(
        output,
        "{indent}{}",
        format_row(&separator, &widths, |_| Align::Left)
    );

    for row in rows {
        let _ = writeln!(output, "{indent}{}", format_row(row, &widths, alignment));
    }

    output
}

fn format_row(values: &[String], widths: &[usize], alignment: impl Fn(usize) -> Align) -> String {
    let mut cells = Vec::with_capacity(widths.len());
    for (idx, width) in widths.iter().enumerate() {
        let value = values.get(idx).map(|v| v.as_str()).unwrap_or("");
        let sanitized = sanitize_cell(value);
        let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
        cells.push(match alignment(idx) {
            Align::Left => format!("{sanitized}{padding}"),
            Align::Right => format!("{padding}{sanitized}"),
        });
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
