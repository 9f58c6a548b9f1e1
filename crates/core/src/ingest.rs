//! Campaign file ingest: parses an uploaded CSV and cleans it into
//! [`MediaPost`] rows ready for filtering and charting.
//!
//! Cleaning rules:
//! - column names are trimmed, spaces become `_`, and names are lowercased
//! - `date` is parsed from a set of common layouts; unparseable rows are dropped
//! - `engagements` is coerced to an integer, defaulting to 0
//! - missing categorical values become `"Unknown"`

use crate::error::{MediaError, MediaResult};
use crate::types::{MediaPost, REQUIRED_COLUMNS, UNKNOWN_LABEL};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};
use utoipa::ToSchema;

/// Cell values treated as missing, matching common spreadsheet exports.
const MISSING_MARKERS: [&str; 11] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>",
];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const CATEGORICAL_COLUMNS: [&str; 6] = [
    "platform",
    "sentiment",
    "location",
    "media_type",
    "influencer_brand",
    "post_type",
];

/// Counters describing what cleaning did to the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CleaningReport {
    /// Data rows in the file, before any were dropped.
    pub original_records: usize,
    /// Rows that survived cleaning.
    pub valid_records: usize,
    pub dropped_invalid_dates: usize,
    pub engagements_defaulted: usize,
    pub categories_defaulted: usize,
}

/// Cleaned posts plus the normalized column list of the source file.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub posts: Vec<MediaPost>,
    pub columns: Vec<String>,
    pub report: CleaningReport,
}

/// Normalize a header cell: trim, spaces to underscores, lowercase.
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .replace(' ', "_")
        .to_lowercase()
}

/// Parse a date cell using the accepted layouts. Slash dates are month-first.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Coerce an engagements cell to an integer. `None` means the value was
/// not numeric and the caller should substitute 0.
pub fn parse_engagements(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    }
}

fn is_missing(raw: &str) -> bool {
    let value = raw.trim();
    MISSING_MARKERS.contains(&value)
}

/// Parse and clean a campaign CSV from any reader.
pub fn parse_and_clean<R: Read>(reader: R) -> MediaResult<CleanedDataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(normalize_column_name).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(MediaError::EmptyFile);
    }

    // Blank headers (trailing spreadsheet columns) are ignored rather than indexed.
    let mut index: HashMap<String, usize> = HashMap::with_capacity(headers.len());
    for (i, name) in headers.iter().enumerate().filter(|(_, name)| !name.is_empty()) {
        if index.insert(name.clone(), i).is_some() {
            return Err(MediaError::DuplicateColumn(name.clone()));
        }
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !index.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(MediaError::MissingColumns(missing));
    }

    let extra_columns: Vec<(String, usize)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty() && !REQUIRED_COLUMNS.contains(&name.as_str()))
        .map(|(i, name)| (name.clone(), i))
        .collect();

    let col = |name: &str| index[name];
    let date_idx = col("date");
    let engagements_idx = col("engagements");

    let mut report = CleaningReport::default();
    let mut posts = Vec::new();

    for record in rdr.records() {
        let record = record?;
        report.original_records += 1;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let Some(date) = parse_date(cell(date_idx)) else {
            report.dropped_invalid_dates += 1;
            continue;
        };

        let engagements = match parse_engagements(cell(engagements_idx)) {
            Some(n) => n,
            None => {
                report.engagements_defaulted += 1;
                0
            }
        };

        let mut categories: [String; 6] = Default::default();
        for (slot, name) in categories.iter_mut().zip(CATEGORICAL_COLUMNS) {
            let raw = cell(col(name));
            *slot = if is_missing(raw) {
                report.categories_defaulted += 1;
                UNKNOWN_LABEL.to_string()
            } else {
                raw.trim().to_string()
            };
        }
        let [platform, sentiment, location, media_type, influencer_brand, post_type] = categories;

        let extra: BTreeMap<String, String> = extra_columns
            .iter()
            .map(|(name, i)| (name.clone(), cell(*i).trim().to_string()))
            .collect();

        posts.push(MediaPost {
            date,
            platform,
            sentiment,
            location,
            engagements,
            media_type,
            influencer_brand,
            post_type,
            extra,
        });
    }

    report.valid_records = posts.len();
    if report.dropped_invalid_dates > 0 {
        debug!(
            dropped = report.dropped_invalid_dates,
            "Dropped rows with unparseable dates"
        );
    }
    info!(
        original = report.original_records,
        valid = report.valid_records,
        "Campaign file cleaned"
    );

    let columns = crate::types::column_names(
        &extra_columns.into_iter().map(|(name, _)| name).collect::<Vec<_>>(),
    );

    Ok(CleanedDataset {
        posts,
        columns,
        report,
    })
}

/// Parse and clean an in-memory upload.
pub fn parse_and_clean_bytes(bytes: &[u8]) -> MediaResult<CleanedDataset> {
    parse_and_clean(bytes)
}

/// Parse and clean a campaign CSV on disk.
pub fn parse_and_clean_path(path: impl AsRef<Path>) -> MediaResult<CleanedDataset> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_and_clean(std::io::BufReader::new(file))
}
