use std::fmt::Write;

use crate::models::ReportTable;

pub const SERIOUS_DELIMITER: &str = "Status: SERIOUS";
pub const NOT_SERIOUS_SENTINEL: &str = "Status: NOT SERIOUS";

/// Instruction sent with every batch of reports. The reply format here is
/// what `analyzer::parse_issues` reads back.
pub fn serious_issue_prompt(table: &ReportTable) -> String {
    format!(
        "\nAnalyze the following water body reports and highlight all serious ones.\n\
         For each serious issue, return in this format (plain text, no JSON):\n\
         \n\
         {SERIOUS_DELIMITER}\n\
         Location: <Location>\n\
         Problem: <Problem description>\n\
         Reason: <Short reason>\n\
         \n\
         If no serious issue is found, write:\n\
         {NOT_SERIOUS_SENTINEL}\n\
         \n\
         Reports:\n\
         {}\n",
        render_table(table)
    )
}

pub fn question_prompt(question: &str) -> String {
    format!(
        "User query: {}. Provide advice based on WHO water health guidance.",
        question.trim()
    )
}

/// Plain-text grid of the table, header first, columns padded to the
/// widest cell. Embedded newlines are flattened so each report stays on
/// one line.
pub fn render_table(table: &ReportTable) -> String {
    let rows: Vec<Vec<String>> = table
        .reports
        .iter()
        .map(|report| table.fields(report).map(|(_, value)| flatten(value)).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    write_row(&mut output, table.columns.iter().map(String::as_str), &widths);
    for row in &rows {
        write_row(&mut output, row.iter().map(String::as_str), &widths);
    }
    output
}

fn write_row<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::new();
    for (idx, cell) in cells.enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let _ = write!(line, "{:<width$}", cell, width = widths[idx]);
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn flatten(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
