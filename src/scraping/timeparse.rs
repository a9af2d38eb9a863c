//! Clock times and loosely written German/English dates.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid time format: {0}")]
pub struct FormatError(pub String);

static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}):?(\d{2})?").expect("valid clock regex"));
static NUMERIC_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})?").expect("valid numeric date regex")
});
static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\.?\s+(\p{L}{3,})\.?(?:\s+(\d{4}))?")
        .expect("valid day month regex")
});
static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\p{L}{3,})\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b,?(?:\s+(\d{4}))?")
        .expect("valid month day regex")
});
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:[:.](\d{2}))?\s*(uhr|h\b|am\b|pm\b)?").expect("valid time regex")
});

const MONTHS: &[(&str, u32)] = &[
    ("januar", 1),
    ("jänner", 1),
    ("january", 1),
    ("februar", 2),
    ("february", 2),
    ("märz", 3),
    ("maerz", 3),
    ("mrz", 3),
    ("march", 3),
    ("april", 4),
    ("mai", 5),
    ("may", 5),
    ("juni", 6),
    ("june", 6),
    ("juli", 7),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("sept", 9),
    ("oktober", 10),
    ("october", 10),
    ("november", 11),
    ("dezember", 12),
    ("december", 12),
];

/// Extracts `(hour, minute)` from text like `"15"`, `"15:34"` or `"Beginn 1530"`.
pub fn parse_clock(text: &str) -> Result<(u32, u32), FormatError> {
    let captures = CLOCK_RE
        .captures(text)
        .ok_or_else(|| FormatError(text.to_string()))?;
    let hour = captures[1]
        .parse()
        .map_err(|_| FormatError(text.to_string()))?;
    let minute = match captures.get(2) {
        Some(m) => m.as_str().parse().map_err(|_| FormatError(text.to_string()))?,
        None => 0,
    };
    Ok((hour, minute))
}

/// Places the clock time found in `text` on `date`.
pub fn clock_on(date: NaiveDate, text: &str) -> Result<NaiveDateTime, FormatError> {
    let (hour, minute) = parse_clock(text)?;
    date.and_hms_opt(hour, minute, 0)
        .ok_or_else(|| FormatError(text.to_string()))
}

/// Moves `end` forward one day at a time until it is no longer before `start`.
pub fn roll_forward(start: NaiveDateTime, mut end: NaiveDateTime) -> NaiveDateTime {
    while end < start {
        end += Duration::days(1);
    }
    end
}

/// Parses a human written date and/or time, filling what is missing from `base`.
///
/// Understands `13.10.2024`, `13.10.`, `So, 13. Oktober 2024, 02:00`,
/// `Sunday, October 13th 2:00 am` and a bare `02:00 Uhr`. A missing time is midnight.
pub fn parse_natural(text: &str, base: NaiveDate) -> Result<NaiveDateTime, FormatError> {
    let lowered = text.to_lowercase();
    let (date, rest) = match find_date(&lowered, base) {
        Some((date, span)) => {
            let mut rest = lowered.clone();
            rest.replace_range(span, " ");
            (Some(date), rest)
        }
        None => (None, lowered.clone()),
    };
    let time = find_time(&rest);

    match (date, time) {
        (None, None) => Err(FormatError(text.to_string())),
        (date, time) => Ok(NaiveDateTime::new(
            date.unwrap_or(base),
            time.unwrap_or(NaiveTime::MIN),
        )),
    }
}

fn find_date(text: &str, base: NaiveDate) -> Option<(NaiveDate, std::ops::Range<usize>)> {
    if let Some(caps) = NUMERIC_DATE_RE.captures(text) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = year_or(caps.get(3).map(|m| m.as_str()), base);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some((date, caps.get(0)?.range()));
        }
    }

    for caps in DAY_MONTH_RE.captures_iter(text) {
        let Some(month) = month_number(&caps[2]) else {
            continue;
        };
        let day = caps[1].parse().ok()?;
        let year = year_or(caps.get(3).map(|m| m.as_str()), base);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some((date, caps.get(0)?.range()));
        }
    }

    for caps in MONTH_DAY_RE.captures_iter(text) {
        let Some(month) = month_number(&caps[1]) else {
            continue;
        };
        let day = caps[2].parse().ok()?;
        let year = year_or(caps.get(3).map(|m| m.as_str()), base);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some((date, caps.get(0)?.range()));
        }
    }

    None
}

fn find_time(text: &str) -> Option<NaiveTime> {
    for caps in TIME_RE.captures_iter(text) {
        let has_minutes = caps.get(2).is_some();
        let suffix = caps.get(3).map(|m| m.as_str());
        // A lone number is only a time when something marks it as one.
        if !has_minutes && suffix.is_none() {
            continue;
        }
        let mut hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        match suffix {
            Some("pm") if hour < 12 => hour += 12,
            Some("am") if hour == 12 => hour = 0,
            _ => {}
        }
        if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
            return Some(time);
        }
    }
    None
}

fn month_number(word: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(name, _)| *name == word || name.starts_with(word))
        .map(|(_, month)| *month)
}

fn year_or(text: Option<&str>, base: NaiveDate) -> i32 {
    match text.and_then(|t| t.parse::<i32>().ok()) {
        Some(year) if year < 100 => 2000 + year,
        Some(year) => year,
        None => base.year(),
    }
}
