use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::Serialize;

/// Placeholder for an issue field the model reply did not fill in.
pub const MISSING_FIELD: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Area {
    Delhi,
    Noida,
    Mumbai,
}

impl Area {
    pub const ALL: [Area; 3] = [Area::Delhi, Area::Noida, Area::Mumbai];

    pub fn name(self) -> &'static str {
        match self {
            Area::Delhi => "Delhi",
            Area::Noida => "Noida",
            Area::Mumbai => "Mumbai",
        }
    }

    pub fn from_name(name: &str) -> Option<Area> {
        let name = name.trim();
        Area::ALL
            .into_iter()
            .find(|area| area.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One submitted form row. `values` lines up with the owning table's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub timestamp: NaiveDateTime,
    pub values: Vec<String>,
}

impl Report {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub reports: Vec<Report>,
}

impl ReportTable {
    pub fn new(columns: Vec<String>, reports: Vec<Report>) -> Self {
        Self { columns, reports }
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.columns
            .iter()
            .position(|column| column.trim().eq_ignore_ascii_case(name))
    }

    pub fn fields<'a>(&'a self, report: &'a Report) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.columns.iter().enumerate().map(move |(idx, column)| {
            let value = report.values.get(idx).map(String::as_str).unwrap_or("");
            (column.as_str(), value)
        })
    }

    pub fn with_reports(&self, reports: Vec<Report>) -> ReportTable {
        ReportTable {
            columns: self.columns.clone(),
            reports,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub location: String,
    pub problem: String,
    pub reason: String,
}

impl Default for Issue {
    fn default() -> Self {
        Self {
            location: MISSING_FIELD.to_string(),
            problem: MISSING_FIELD.to_string(),
            reason: MISSING_FIELD.to_string(),
        }
    }
}
