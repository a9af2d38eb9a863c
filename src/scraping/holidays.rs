use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};

/// Calendar days on which regular schedules do not take place.
pub trait HolidayCalendar: Send + Sync {
    fn holidays(&self) -> HashSet<NaiveDate>;
}

/// Austrian public holidays for a range of years.
pub struct AustrianHolidays {
    first_year: i32,
    last_year: i32,
}

impl AustrianHolidays {
    pub fn new(first_year: i32, last_year: i32) -> Self {
        Self {
            first_year,
            last_year,
        }
    }

    /// Every year touched by the `weeks` starting at `today`.
    pub fn covering(today: NaiveDate, weeks: u32) -> Self {
        let last_day = today + Duration::weeks(i64::from(weeks));
        Self::new(today.year(), last_day.year())
    }
}

impl HolidayCalendar for AustrianHolidays {
    fn holidays(&self) -> HashSet<NaiveDate> {
        (self.first_year..=self.last_year)
            .flat_map(holidays_in)
            .collect()
    }
}

const FIXED: &[(u32, u32)] = &[
    (1, 1),   // Neujahr
    (1, 6),   // Heilige Drei Könige
    (5, 1),   // Staatsfeiertag
    (8, 15),  // Mariä Himmelfahrt
    (10, 26), // Nationalfeiertag
    (11, 1),  // Allerheiligen
    (12, 8),  // Mariä Empfängnis
    (12, 25), // Christtag
    (12, 26), // Stefanitag
];

// Ostermontag, Christi Himmelfahrt, Pfingstmontag, Fronleichnam
const EASTER_OFFSETS: &[i64] = &[1, 39, 50, 60];

fn holidays_in(year: i32) -> Vec<NaiveDate> {
    let fixed = FIXED
        .iter()
        .filter_map(|(month, day)| NaiveDate::from_ymd_opt(year, *month, *day));
    let movable = easter_sunday(year)
        .into_iter()
        .flat_map(|easter| EASTER_OFFSETS.iter().map(move |days| easter + Duration::days(*days)));
    fixed.chain(movable).collect()
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn easter_dates() {
        assert_eq!(easter_sunday(2024), Some(date(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(date(2025, 4, 20)));
        assert_eq!(easter_sunday(2026), Some(date(2026, 4, 5)));
    }

    #[test]
    fn includes_fixed_and_movable_days() {
        let days = AustrianHolidays::new(2025, 2025).holidays();
        assert_eq!(days.len(), 13);
        assert!(days.contains(&date(2025, 10, 26)));
        assert!(days.contains(&date(2025, 4, 21))); // Ostermontag
        assert!(days.contains(&date(2025, 6, 19))); // Fronleichnam
        assert!(!days.contains(&date(2025, 4, 20)));
    }

    #[test]
    fn covering_spans_year_change() {
        let days = AustrianHolidays::covering(date(2024, 12, 20), 4).holidays();
        assert!(days.contains(&date(2024, 12, 25)));
        assert!(days.contains(&date(2025, 1, 6)));
    }

    #[test]
    fn covering_spans_two_year_changes() {
        let days = AustrianHolidays::covering(date(2024, 11, 4), 70).holidays();
        assert!(days.contains(&date(2026, 1, 1)));
        assert!(days.contains(&date(2026, 1, 6)));
        assert!(!days.contains(&date(2027, 1, 1)));
    }
}
