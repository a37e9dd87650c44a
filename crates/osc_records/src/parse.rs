//! Field-level parsers for source table cells.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use url::Url;

use crate::types::{Released, RELEASED_PLANNED};

const PROJECT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%Y/%m/%d"];

/// Parses `YYYY`, `YYYY.M` (zero-based month) or `YYYY.M.D`.
pub fn parse_decimal_date(source: &str) -> Result<NaiveDate, String> {
    let parts: Vec<&str> = source.trim().split('.').collect();
    let number = |s: &str| -> Result<u32, String> {
        s.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid decimal date `{}`", source))
    };
    let year = parts
        .first()
        .ok_or_else(|| format!("invalid decimal date `{}`", source))?
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("invalid decimal date `{}`", source))?;
    let date = match parts.len() {
        1 => NaiveDate::from_ymd_opt(year, 1, 1),
        2 => NaiveDate::from_ymd_opt(year, number(parts[1])? + 1, 1),
        3 => NaiveDate::from_ymd_opt(year, number(parts[1])?, number(parts[2])?),
        _ => None,
    };
    date.ok_or_else(|| format!("invalid decimal date `{}`", source))
}

/// Product `Start`/`End` cells: ISO dates or decimal dates.
pub fn parse_product_date(source: &str) -> Result<NaiveDate, String> {
    let source = source.trim();
    if source.contains('-') {
        return NaiveDate::parse_from_str(source, "%Y-%m-%d")
            .or_else(|_| rfc3339_date(source))
            .map_err(|_| format!("invalid date `{}`", source));
    }
    parse_decimal_date(source)
}

/// Project `Start_Date_Project`/`End_Date_Project` cells.
pub fn parse_project_date(source: &str) -> Result<NaiveDate, String> {
    let source = source.trim();
    for format in PROJECT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(source, format) {
            return Ok(date);
        }
    }
    rfc3339_date(source).map_err(|_| format!("invalid date `{}`", source))
}

fn rfc3339_date(source: &str) -> Result<NaiveDate, chrono::ParseError> {
    DateTime::parse_from_rfc3339(source).map(|dt| dt.with_timezone(&Utc).date_naive())
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// 23:59:59 UTC of `date`; interval ends are inclusive.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::seconds(86_399)
}

/// Every calendar year between `start` and `end`, inclusive.
pub fn years_between(start: &DateTime<Utc>, end: &DateTime<Utc>) -> std::ops::RangeInclusive<i32> {
    start.year()..=end.year()
}

/// Splits a multi-valued cell, trimming entries and dropping empty ones.
pub fn split_list(source: &str, separator: char) -> Vec<String> {
    source
        .split(separator)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// A DOI cell holds either a bare DOI or a resolver URL; URLs are reduced to their path.
pub fn parse_doi(source: &str) -> Option<String> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }
    match Url::parse(source) {
        Ok(url) if url.has_host() => {
            let path = url.path().trim_start_matches('/');
            if path.is_empty() {
                None
            } else {
                Some(path.to_string())
            }
        }
        _ => Some(source.to_string()),
    }
}

pub fn parse_released(source: &str) -> Result<Option<Released>, String> {
    let source = source.trim();
    if source.is_empty() {
        return Ok(None);
    }
    if source.eq_ignore_ascii_case(RELEASED_PLANNED) {
        return Ok(Some(Released::Planned));
    }
    parse_project_date(source).map(|date| Some(Released::Date(date)))
}
