use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::models::DanceEvent;

/// Everything about a weekly event except the date it happens on.
#[derive(Debug, Clone)]
pub struct EventTemplate {
    pub starts: NaiveTime,
    pub ends: Option<NaiveTime>,
    pub name: String,
    pub price_euro_cent: Option<u32>,
    pub description: String,
    pub dancing_school: String,
    pub website: String,
}

impl EventTemplate {
    pub fn on(&self, date: NaiveDate) -> DanceEvent {
        let starts_at = NaiveDateTime::new(date, self.starts);
        DanceEvent {
            starts_at,
            ends_at: None,
            name: self.name.clone(),
            price_euro_cent: self.price_euro_cent,
            description: self.description.clone(),
            dancing_school: self.dancing_school.clone(),
            website: self.website.clone(),
        }
        .with_end(self.ends.map(|ends| NaiveDateTime::new(date, ends)))
    }
}

/// One event per `weekday` in the `weeks` weeks starting at `today` (inclusive).
pub fn weekly_event(
    weekday: Weekday,
    template: &EventTemplate,
    today: NaiveDate,
    weeks: u32,
) -> Vec<DanceEvent> {
    let ahead = (weekday.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    let first = today + Duration::days(i64::from(ahead));
    (0..weeks)
        .map(|week| template.on(first + Duration::weeks(i64::from(week))))
        .collect()
}

/// Expands `template` for each of `weekdays`, dropping holidays.
pub fn weekly_schedule(
    weekdays: &[Weekday],
    template: &EventTemplate,
    today: NaiveDate,
    weeks: u32,
    holidays: &HashSet<NaiveDate>,
) -> Vec<DanceEvent> {
    weekdays
        .iter()
        .flat_map(|weekday| weekly_event(*weekday, template, today, weeks))
        .filter(|event| !holidays.contains(&event.starts_at.date()))
        .collect()
}
