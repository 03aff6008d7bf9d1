//! Plain-text rendering of tables and charts.

use std::io::{self, Write};

use schoolsoft_admin::components::{DataTableConfig, Page};
use schoolsoft_admin::widgets::{Chart, NO_DATA};
use serde::Serialize;
use serde_json::Value;

/// Look up a dotted column key (`Class.name`) in a serialized row.
fn cell(row: &Value, key: &str) -> String {
    let value = key
        .split('.')
        .try_fold(row, |value, part| value.get(part));
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render rows through the screen's column definitions.
pub fn write_table<T: Serialize>(
    out: &mut impl Write,
    config: &DataTableConfig,
    rows: &[T],
) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "{}", config.empty_title);
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let value = serde_json::to_value(row).unwrap_or(Value::Null);
            config
                .columns
                .iter()
                .map(|column| cell(&value, &column.key))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = config
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(column.label.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let header: Vec<&str> = config.columns.iter().map(|c| c.label.as_str()).collect();
    write_row(out, &header, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(out, &rule, &widths)?;
    for row in &cells {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row<S: AsRef<str>>(out: &mut impl Write, cells: &[S], widths: &[usize]) -> io::Result<()> {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref()))
        .collect();
    writeln!(out, "{}", line.join("  ").trim_end())
}

/// Page footer, e.g. `Page 2 of 5`.
pub fn write_page_footer<T>(out: &mut impl Write, page_number: u32, page: &Page<T>) -> io::Result<()> {
    writeln!(out, "Page {page_number} of {}", page.total_pages.max(1))
}

/// One line per labelled slice, or the empty-chart message.
pub fn write_chart(out: &mut impl Write, title: &str, chart: &Chart) -> io::Result<()> {
    writeln!(out, "{title}")?;
    if chart.is_empty() {
        return writeln!(out, "  {NO_DATA}");
    }
    for slice in chart.slices() {
        match &slice.label {
            Some(label) => writeln!(out, "  {label}")?,
            None => writeln!(out, "  {} : 0", slice.name)?,
        }
    }
    Ok(())
}
