//! Read-only access to the form responses sheet, one full CSV snapshot
//! per fetch.

use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Report, ReportTable};

pub const TIMESTAMP_COLUMN: &str = "Timestamp";
const EXPORT_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Accepted timestamp layouts, tried in order. Month-first wins when a
/// slash date is ambiguous.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%d/%m/%Y", "%Y-%m-%d"];

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sheet export returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("sheet has no \"Timestamp\" column")]
    MissingTimestampColumn,
}

#[async_trait]
pub trait ReportSource: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<ReportTable, SheetError>;
}

pub struct SheetClient {
    client: reqwest::Client,
    base_url: String,
    sheet_id: String,
    token: Option<String>,
}

impl SheetClient {
    pub fn new(sheet_id: String, token: Option<String>) -> Self {
        Self::with_base_url(EXPORT_BASE_URL.to_string(), sheet_id, token)
    }

    pub fn with_base_url(base_url: String, sheet_id: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            sheet_id,
            token,
        }
    }

    fn export_url(&self) -> String {
        format!("{}/{}/export?format=csv", self.base_url, self.sheet_id)
    }
}

#[async_trait]
impl ReportSource for SheetClient {
    fn describe(&self) -> String {
        format!("sheet {}", self.sheet_id)
    }

    async fn fetch(&self) -> Result<ReportTable, SheetError> {
        let url = self.export_url();
        info!(url = %url, "fetching report sheet");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let table = parse_table(bytes.as_ref())?;
        info!(rows = table.len(), "fetched report sheet");
        Ok(table)
    }
}

pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ReportSource for CsvFileSource {
    fn describe(&self) -> String {
        format!("csv {}", self.path.display())
    }

    async fn fetch(&self) -> Result<ReportTable, SheetError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SheetError::File {
                path: self.path.clone(),
                source,
            })?;
        let table = parse_table(bytes.as_slice())?;
        info!(path = %self.path.display(), rows = table.len(), "loaded report csv");
        Ok(table)
    }
}

/// Rows whose timestamp does not parse, or that are not valid UTF-8, are
/// dropped rather than failing the snapshot.
pub fn parse_table<R: Read>(input: R) -> Result<ReportTable, SheetError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    if columns.iter().all(String::is_empty) {
        return Ok(ReportTable::default());
    }

    let timestamp_idx = columns
        .iter()
        .position(|column| column.eq_ignore_ascii_case(TIMESTAMP_COLUMN))
        .ok_or(SheetError::MissingTimestampColumn)?;

    let mut reports = Vec::new();
    let mut dropped = 0usize;
    let mut undecodable = 0usize;

    for record in reader.byte_records() {
        let record = record?;
        let values: Vec<String> = match record
            .iter()
            .map(|field| std::str::from_utf8(field).map(str::to_string))
            .collect::<Result<_, _>>()
        {
            Ok(values) => values,
            Err(_) => {
                undecodable += 1;
                continue;
            }
        };

        let raw = values.get(timestamp_idx).map(String::as_str).unwrap_or("");
        match parse_timestamp(raw) {
            Some(timestamp) => reports.push(Report { timestamp, values }),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped rows with unparseable timestamps");
    }
    if undecodable > 0 {
        debug!(undecodable, "dropped rows that are not valid UTF-8");
    }

    Ok(ReportTable::new(columns, reports))
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local).naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(raw, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_timestamps() {
        let ts = parse_timestamp("10/16/2026 9:05:01").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());

        let day_first = parse_timestamp("16/10/2026 09:05:01").unwrap();
        assert_eq!(day_first.date(), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());

        let iso = parse_timestamp("2026-10-16 21:00:00").unwrap();
        assert_eq!(iso.date(), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());

        let date_only = parse_timestamp("2026-10-16").unwrap();
        assert_eq!(date_only.date(), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
    }

    #[test]
    fn ambiguous_slash_dates_read_month_first() {
        let ts = parse_timestamp("03/04/2026 10:00:00").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("13/13/2026 10:00:00").is_none());
    }

    #[test]
    fn drops_rows_with_bad_timestamps() {
        let csv = "Timestamp,Location,Problem\n\
                   10/16/2026 08:00:00,Yamuna Ghat Delhi,foam on surface\n\
                   not a date,Powai Lake Mumbai,dead fish\n\
                   10/15/2026 18:30:00,Okhla Noida,plastic waste\n";
        let table = parse_table(csv.as_bytes()).unwrap();

        assert_eq!(table.columns, vec!["Timestamp", "Location", "Problem"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.reports[0].values[1], "Yamuna Ghat Delhi");
        assert_eq!(table.reports[1].values[1], "Okhla Noida");
    }

    #[test]
    fn drops_rows_with_invalid_utf8() {
        let mut csv = b"Timestamp,Location,Problem\n".to_vec();
        csv.extend_from_slice(b"10/16/2026 08:00:00,Yamuna,foam\n");
        csv.extend_from_slice(b"10/16/2026 09:00:00,Powai \xff\xfe,dead fish\n");
        csv.extend_from_slice(b"10/16/2026 10:00:00,Okhla,plastic\n");

        let table = parse_table(csv.as_slice()).unwrap();
        let locations: Vec<&str> = table.reports.iter().map(|r| r.values[1].as_str()).collect();
        assert_eq!(locations, vec!["Yamuna", "Okhla"]);
    }

    #[test]
    fn requires_timestamp_column() {
        let csv = "When,Location\n10/16/2026 08:00:00,Delhi\n";
        assert!(matches!(
            parse_table(csv.as_bytes()),
            Err(SheetError::MissingTimestampColumn)
        ));
    }

    #[test]
    fn empty_export_is_empty_table() {
        let table = parse_table("".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn export_url_uses_sheet_id() {
        let client = SheetClient::with_base_url("http://localhost:9000/d/".into(), "abc".into(), None);
        assert_eq!(client.export_url(), "http://localhost:9000/d/abc/export?format=csv");
        assert_eq!(client.describe(), "sheet abc");
    }

    #[tokio::test]
    async fn csv_file_source_reports_missing_file() {
        let source = CsvFileSource::new(PathBuf::from("/nonexistent/responses.csv"));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SheetError::File { .. }));
    }
}
