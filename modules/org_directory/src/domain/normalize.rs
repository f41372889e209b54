//! Per-field parsing and normalization.
//!
//! Every function here is pure and returns either the normalized value or a
//! human-readable reason; the validator decides which field the reason is
//! attached to. Nothing in this module touches the database.

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use tabular::sheet::Cell;

use crate::contract::model::Gender;

/// Short job-level code grammar: 1-3 letters plus an optional digit.
static SHORT_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{1,3}[0-9]?$").unwrap());

/// `"CODE - long title"` prefix form.
static CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]{1,3}[0-9]?)\s*-\s*\S").unwrap());

/// Static title → short-code alias dictionary, matched on folded titles.
static TITLE_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("alcalde", "AL"),
        ("alcaldesa", "AL"),
        ("concejal", "CON"),
        ("concejal titular", "CON"),
        ("director", "DIR"),
        ("directora", "DIR"),
        ("director municipal", "DIR"),
        ("jefe de departamento", "JD"),
        ("jefa de departamento", "JD"),
        ("profesional", "PRO"),
        ("tecnico", "TEC"),
        ("técnico", "TEC"),
        ("asistente", "ASI"),
        ("operativo", "OP"),
    ])
});

/// Spreadsheet serial date epoch (the usual 1900-system base).
static SERIAL_EPOCH: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1899, 12, 30).unwrap());

/// Normalized identifier plus whether whitespace had to be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedIdentifier {
    pub digits: String,
    pub had_whitespace: bool,
}

/// Strip all whitespace and require 10-20 numeric digits.
pub fn identifier(raw: &str) -> Result<NormalizedIdentifier, String> {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Err("identifier is empty".to_string());
    }
    if digits.len() < 10 || digits.len() > 20 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "identifier must be 10-20 numeric digits, got '{digits}'"
        ));
    }
    Ok(NormalizedIdentifier {
        had_whitespace: digits != trimmed,
        digits,
    })
}

/// Birth date: any accepted input form, normalized to an 8-digit DDMMYYYY
/// string that is guaranteed to be a real calendar date.
pub fn birth_date(cell: &Cell) -> Result<String, String> {
    let date = flexible_date(cell)?;
    Ok(date.format("%d%m%Y").to_string())
}

/// Hire date: same format family, ISO target. Optional: unparsable input
/// yields `None`, never an error.
pub fn hire_date(cell: &Cell) -> Option<NaiveDate> {
    flexible_date(cell).ok()
}

/// Parse a date cell from any of the accepted shapes:
/// 8-digit DDMMYYYY, delimiter-separated triples (`/`, `-`, `.`, space)
/// disambiguated by the position of the 4-digit token, or a spreadsheet
/// numeric serial. Every path goes through `NaiveDate` construction, so an
/// impossible day/month combination always fails.
fn flexible_date(cell: &Cell) -> Result<NaiveDate, String> {
    match cell {
        Cell::Empty => Err("date is empty".to_string()),
        Cell::Number(serial) => serial_date(*serial),
        Cell::Text(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err("date is empty".to_string());
            }
            if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
                return eight_digit_date(raw);
            }
            if let Some(parts) = split_date_tokens(raw) {
                return delimited_date(raw, parts);
            }
            // A serial date arriving as text (CSV export of a workbook).
            if let Ok(serial) = raw.parse::<f64>() {
                return serial_date(serial);
            }
            Err(format!("unrecognized date format '{raw}'"))
        }
    }
}

fn eight_digit_date(raw: &str) -> Result<NaiveDate, String> {
    let day: u32 = raw[0..2].parse().map_err(|_| bad_digits(raw))?;
    let month: u32 = raw[2..4].parse().map_err(|_| bad_digits(raw))?;
    let year: i32 = raw[4..8].parse().map_err(|_| bad_digits(raw))?;
    build_date(raw, day, month, year)
}

fn bad_digits(raw: &str) -> String {
    format!("unrecognized date format '{raw}'")
}

fn split_date_tokens(raw: &str) -> Option<Vec<&str>> {
    for delim in ['/', '-', '.', ' '] {
        let parts: Vec<&str> = raw.split(delim).map(str::trim).collect();
        if parts.len() == 3 && parts.iter().all(|p| !p.is_empty()) {
            return Some(parts);
        }
    }
    None
}

fn delimited_date(raw: &str, parts: Vec<&str>) -> Result<NaiveDate, String> {
    // The 4-digit token decides DD/MM/YYYY vs YYYY/MM/DD.
    let (d, m, y) = if parts[0].len() == 4 {
        (parts[2], parts[1], parts[0])
    } else if parts[2].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else {
        return Err(format!("ambiguous date '{raw}': no 4-digit year token"));
    };
    let day: u32 = d
        .parse()
        .map_err(|_| format!("invalid day '{d}' in date '{raw}'"))?;
    let month: u32 = m
        .parse()
        .map_err(|_| format!("invalid month '{m}' in date '{raw}'"))?;
    let year: i32 = y
        .parse()
        .map_err(|_| format!("invalid year '{y}' in date '{raw}'"))?;
    build_date(raw, day, month, year)
}

fn serial_date(serial: f64) -> Result<NaiveDate, String> {
    if !(1.0..=120_000.0).contains(&serial) {
        return Err(format!("spreadsheet serial date {serial} out of range"));
    }
    let date = *SERIAL_EPOCH + Duration::days(serial.trunc() as i64);
    Ok(date)
}

/// Construct and re-check: the round-trip through `NaiveDate` plus the field
/// equality comparison rejects impossible dates such as day 31 in a 30-day
/// month, naming the offending day and month.
fn build_date(raw: &str, day: u32, month: u32, year: i32) -> Result<NaiveDate, String> {
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        format!("invalid calendar date '{raw}': day {day} does not exist in month {month} of {year}")
    })?;
    if date.day() != day || date.month() != month || date.year() != year {
        return Err(format!(
            "invalid calendar date '{raw}': day {day} does not exist in month {month} of {year}"
        ));
    }
    Ok(date)
}

/// Job-level normalization: short code passthrough, alias resolution,
/// `"CODE - "` prefix stripping, or the uppercased input unchanged for later
/// rejection against the live directory.
pub fn job_level_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if SHORT_CODE.is_match(trimmed) {
        return trimmed.to_uppercase();
    }
    let folded = trimmed.to_lowercase();
    if let Some(code) = TITLE_ALIASES.get(folded.as_str()) {
        return (*code).to_string();
    }
    if let Some(caps) = CODE_PREFIX.captures(trimmed) {
        return caps[1].to_uppercase();
    }
    trimmed.to_uppercase()
}

/// First whitespace token = given name; remainder joined = family name.
pub fn split_name(raw: &str) -> Result<(String, String), String> {
    let mut tokens = raw.split_whitespace();
    let given = tokens
        .next()
        .ok_or_else(|| "name is empty".to_string())?
        .to_string();
    let family = tokens.collect::<Vec<_>>().join(" ");
    Ok((given, family))
}

/// Gender classification outcome. Unrecognized input is reported as such,
/// never guessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenderOutcome {
    Recognized(Gender),
    Blank,
    Unrecognized(String),
}

pub fn gender(raw: &str) -> GenderOutcome {
    let folded = raw.trim().to_lowercase();
    if folded.is_empty() {
        return GenderOutcome::Blank;
    }
    if folded == "m" || folded.starts_with("masc") || folded.contains("hombre") {
        return GenderOutcome::Recognized(Gender::Male);
    }
    if folded == "f" || folded.starts_with("fem") || folded.contains("mujer") {
        return GenderOutcome::Recognized(Gender::Female);
    }
    GenderOutcome::Unrecognized(raw.trim().to_string())
}
