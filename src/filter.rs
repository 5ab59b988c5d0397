use chrono::{Local, NaiveDate};

use crate::config::AreaMatch;
use crate::models::{Report, ReportTable};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Rows submitted on `day` that belong to `area`, in sheet order.
///
/// With [`AreaMatch::RowText`] a row belongs to an area when the area name
/// appears anywhere in its serialised text, column names included. An area
/// mentioned inside another field (say a problem description) therefore
/// matches too.
pub fn filter_day_area(table: &ReportTable, area: &str, day: NaiveDate, mode: &AreaMatch) -> ReportTable {
    let needle = area.to_lowercase();
    let column_idx = match mode {
        AreaMatch::RowText => None,
        AreaMatch::Column(name) => match table.column_index(name) {
            Some(idx) => Some(idx),
            None => return table.with_reports(Vec::new()),
        },
    };

    let reports = table
        .reports
        .iter()
        .filter(|report| report.date() == day)
        .filter(|report| match column_idx {
            None => row_text(table, report).contains(&needle),
            Some(idx) => report
                .values
                .get(idx)
                .is_some_and(|value| value.trim().to_lowercase() == needle.trim()),
        })
        .cloned()
        .collect();

    table.with_reports(reports)
}

pub fn filter_today_area(table: &ReportTable, area: &str, mode: &AreaMatch) -> ReportTable {
    filter_day_area(table, area, today(), mode)
}

/// Lowercased `column value` lines for one row.
fn row_text(table: &ReportTable, report: &Report) -> String {
    let mut text = String::new();
    for (column, value) in table.fields(report) {
        text.push_str(column);
        text.push(' ');
        text.push_str(value);
        text.push('\n');
    }
    text.to_lowercase()
}
