//! Plain-text rendering of a preview page.

use std::borrow::Cow;
use std::fmt::Write as _;

use itertools::Itertools;

use crate::{
    paginate::Paginator,
    preview::{PreviewTable, TableStatus},
    value::Row,
};

const ROW_NUMBER_HEADER: &str = "#";

/// Renders `rows` under the table's headers as aligned columns. A leading
/// `#` column shows row numbers when any row carries one.
pub fn render_page(table: &PreviewTable, rows: &[Row]) -> String {
    let numbered = rows.iter().any(|row| row.row_number().is_some());

    let mut headers: Vec<Cow<'_, str>> = Vec::with_capacity(table.headers().len() + 1);
    if numbered {
        headers.push(Cow::Borrowed(ROW_NUMBER_HEADER));
    }
    headers.extend(table.headers().iter().map(|h| sanitize_cell(h)));

    let body = rows
        .iter()
        .map(|row| {
            let mut cells = Vec::with_capacity(headers.len());
            if numbered {
                cells.push(Cow::Owned(
                    row.row_number().map(|n| n.to_string()).unwrap_or_default(),
                ));
            }
            cells.extend(table.headers().iter().map(|header| {
                Cow::Owned(sanitize_cell(&row.cell_text(header)).into_owned())
            }));
            cells
        })
        .collect::<Vec<Vec<Cow<'_, str>>>>();

    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(1))
        .collect::<Vec<_>>();
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(&headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let rule_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&rule, &rule_widths));
    for cells in &body {
        let _ = writeln!(output, "{}", format_line(cells, &widths));
    }
    output
}

/// One-line summary: visible rows, logical total, page position, status.
pub fn status_line(table: &PreviewTable, paginator: &Paginator, visible: usize) -> String {
    let status = match table.status() {
        TableStatus::Fallback { policy, reason } => {
            format!("fallback ({policy}; {reason})")
        }
        other => other.label().to_string(),
    };
    format!(
        "Showing {visible} of {} row(s) ({} total) | page {}/{} | status: {status}",
        table.row_count(),
        table.total_rows(),
        paginator.current_page(),
        paginator.total_pages()
    )
}

fn format_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .join("  ");
    line.trim_end().to_string()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
