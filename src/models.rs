use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One entry of the merged schedule. Times are Vienna wall-clock times.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DanceEvent {
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub name: String,
    pub price_euro_cent: Option<u32>, // None means unknown, not free
    pub description: String,
    pub dancing_school: String,
    pub website: String,
}

impl DanceEvent {
    /// An event as it comes off a listing page, before any detail page was read.
    pub fn skeletal(
        starts_at: NaiveDateTime,
        name: impl Into<String>,
        description: impl Into<String>,
        dancing_school: impl Into<String>,
        website: impl Into<String>,
    ) -> Self {
        Self {
            starts_at,
            ends_at: None,
            name: name.into(),
            price_euro_cent: None,
            description: description.into(),
            dancing_school: dancing_school.into(),
            website: website.into(),
        }
    }

    /// Sets the end, pushing it forward by whole days until it is not before the start.
    pub fn with_end(mut self, ends_at: Option<NaiveDateTime>) -> Self {
        self.ends_at = ends_at.map(|end| crate::scraping::timeparse::roll_forward(self.starts_at, end));
        self
    }

    /// Keeps the cheaper of the known price and `candidate`.
    pub fn with_lower_price(mut self, candidate: Option<u32>) -> Self {
        self.price_euro_cent = match (self.price_euro_cent, candidate) {
            (Some(current), Some(price)) => Some(current.min(price)),
            (current, price) => current.or(price),
        };
        self
    }

    pub fn with_name_suffix(mut self, suffix: &str) -> Self {
        self.name.push_str(suffix);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    #[test]
    fn end_before_start_rolls_to_next_day() {
        let event = DanceEvent::skeletal(at(1, 23, 0), "Ball", "", "Ballsaal", "https://x")
            .with_end(Some(at(1, 0, 30)));
        assert_eq!(event.ends_at, Some(at(2, 0, 30)));
    }

    #[test]
    fn lower_price_keeps_minimum() {
        let event = DanceEvent::skeletal(at(1, 20, 0), "Ball", "", "Ballsaal", "https://x")
            .with_lower_price(Some(1200))
            .with_lower_price(None)
            .with_lower_price(Some(900))
            .with_lower_price(Some(1500));
        assert_eq!(event.price_euro_cent, Some(900));
    }
}
