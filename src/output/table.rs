//! Text layouts for result sets.
//!
//! Renders rows in the bordered style of the mysql client, and in its `\G`
//! vertical style. Both return plain lines; coloring is up to the caller.

use crate::db::{Row, Value};

/// Number of `*` on each side of a vertical row banner.
const ROW_BANNER_WIDTH: usize = 20;

fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn cell_text(row: &Row, index: usize) -> String {
    row.get(index)
        .map(Value::to_display_string)
        .unwrap_or_else(|| Value::Null.to_display_string())
}

/// Renders a bordered table.
///
/// ```text
/// +----+-------+
/// | id | name  |
/// +----+-------+
/// | 1  | alice |
/// +----+-------+
/// ```
pub fn bordered_lines(columns: &[String], rows: &[Row]) -> Vec<String> {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| (0..columns.len()).map(|i| cell_text(row, i)).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| display_width(c)).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let border = border_line(&widths);
    let mut lines = Vec::with_capacity(cells.len() + 4);
    lines.push(border.clone());
    lines.push(content_line(columns, &widths));
    lines.push(border.clone());
    for row in &cells {
        lines.push(content_line(row, &widths));
    }
    lines.push(border);
    lines
}

fn border_line(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line
}

fn content_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, &width) in cells.iter().zip(widths) {
        let padding = width.saturating_sub(display_width(cell));
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(padding + 1));
        line.push('|');
    }
    line
}

/// Renders rows as `*** N. row ***` blocks with right-aligned column names.
pub fn vertical_lines(columns: &[String], rows: &[Row]) -> Vec<String> {
    let name_width = columns.iter().map(|c| display_width(c)).max().unwrap_or(0);
    let banner = "*".repeat(ROW_BANNER_WIDTH);

    let mut lines = Vec::with_capacity(rows.len() * (columns.len() + 1));
    for (i, row) in rows.iter().enumerate() {
        lines.push(format!("{banner} {}. row {banner}", i + 1));
        for (j, name) in columns.iter().enumerate() {
            let padding = name_width.saturating_sub(display_width(name));
            lines.push(format!("{}{name}: {}", " ".repeat(padding), cell_text(row, j)));
        }
    }
    lines
}

/// Renders rows as tab-separated lines.
pub fn tab_separated_lines(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect()
}
