use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{info, warn};

use super::base::{self, PageFetcher, ScrapeError};
use super::enrich::enrich_all;
use super::holidays::HolidayCalendar;
use super::recurring::{self, EventTemplate};
use super::timeparse;
use super::DanceSchool;
use crate::config::AppConfig;
use crate::models::DanceEvent;

const SITE: &str = "https://www.tanzschulechris.at";
const URL: &str = "https://www.tanzschulechris.at/perfektionen/tanzcafe_wien_1";
const SCHOOL_ID: &str = "chris";
const SCHOOL_NAME: &str = "Chris";
const BASE_DATE_FORMAT: &str = "%d.%m.%Y";

// The only event whose price is known without a ticket shop.
const PRICED_TITLE: &str = "Perfektion";
const PRICED_TITLE_CENTS: u32 = 700;

const TANZCAFE_URL: &str = "https://www.tanzschulechris.at/perfektionen/tanzcafe_wien";
const TANZCAFE_DESCRIPTION: &str = "Wehlistraße 150, 1020 Wien
5-Uhr-Tee in Wien
Standard, Latein, Boogie Woogie
klimatisierte Räumlichkeiten
genieße bei Schönwetter unsere Terrasse
ausgenommen an Feiertagen";
const TANZCAFE_DAYS: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sun,
];

static ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".news-list-item").expect("chris item selector"));
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("chris link"));
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".news-list-date").expect("chris date"));
static START_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".event-starttime").expect("chris start time"));
static END_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".event-endtime").expect("chris end time"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".header > h2:nth-child(1)").expect("chris title"));
static TEXT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".news-text-wrap").expect("chris text"));

pub struct Chris {
    horizon_weeks: u32,
    max_parallel_fetches: Option<usize>,
    holidays: Box<dyn HolidayCalendar>,
}

impl Chris {
    pub fn new(config: &AppConfig, holidays: Box<dyn HolidayCalendar>) -> Self {
        Self {
            horizon_weeks: config.horizon_weeks,
            max_parallel_fetches: config.max_parallel_fetches,
            holidays,
        }
    }

    pub(crate) fn fetch_on(&self, fetcher: &dyn PageFetcher, today: NaiveDate) -> Result<Vec<DanceEvent>> {
        let overview = fetcher.get(URL).context("chris overview unavailable")?;
        let links = parse_overview(&overview);
        info!("Found {} event pages on the Chris overview", links.len());

        let workers = base::pool_size(links.len(), self.max_parallel_fetches);
        let mut events: Vec<DanceEvent> = enrich_all(links, workers, |url: String| -> Result<DanceEvent, ScrapeError> {
            let html = fetcher.get(&url)?;
            parse_detail(&html, &url)
        })
        .into_iter()
        .filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(err) => {
                warn!("dropping chris event: {err}");
                None
            }
        })
        .collect();

        events.extend(self.tanzcafe(today));
        Ok(events)
    }

    /// The weekly Tanzcafé is not listed online; it runs every day but Saturday.
    pub(crate) fn tanzcafe(&self, today: NaiveDate) -> Vec<DanceEvent> {
        let template = EventTemplate {
            starts: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            ends: NaiveTime::from_hms_opt(18, 0, 0),
            name: "Tanzcafe".to_string(),
            price_euro_cent: Some(500),
            description: TANZCAFE_DESCRIPTION.to_string(),
            dancing_school: SCHOOL_NAME.to_string(),
            website: TANZCAFE_URL.to_string(),
        };
        recurring::weekly_schedule(
            &TANZCAFE_DAYS,
            &template,
            today,
            self.horizon_weeks,
            &self.holidays.holidays(),
        )
    }
}

impl DanceSchool for Chris {
    fn school_id(&self) -> &'static str {
        SCHOOL_ID
    }

    fn school_name(&self) -> &'static str {
        SCHOOL_NAME
    }

    fn school_url(&self) -> &'static str {
        URL
    }

    fn fetch(&self, fetcher: &dyn PageFetcher) -> Result<Vec<DanceEvent>> {
        self.fetch_on(fetcher, base::today())
    }
}

pub(crate) fn parse_overview(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ITEM_SELECTOR)
        .filter_map(|item| base::absolute_url(SITE, base::first_attr(&item, &LINK_SELECTOR, "href")))
        .collect()
}

/// Builds the event on one detail page. Without a date, start time or title
/// the event cannot be scheduled and is rejected.
pub(crate) fn parse_detail(html: &str, url: &str) -> Result<DanceEvent, ScrapeError> {
    let document = Html::parse_document(html);
    let missing = |what: &str| ScrapeError::Format(format!("{url}: {what}"));

    let base_date = base::document_text(&document, &DATE_SELECTOR)
        .and_then(|text| parse_base_date(&text))
        .ok_or_else(|| missing("no date"))?;
    let starts_at = base::document_text(&document, &START_SELECTOR)
        .and_then(|text| timeparse::clock_on(base_date, &text).ok())
        .ok_or_else(|| missing("no start time"))?;
    let ends_at = base::document_text(&document, &END_SELECTOR)
        .and_then(|text| timeparse::clock_on(base_date, &text).ok());
    let name = base::document_text(&document, &TITLE_SELECTOR).ok_or_else(|| missing("no title"))?;

    let price = (name == PRICED_TITLE).then_some(PRICED_TITLE_CENTS);
    let description = base::document_text(&document, &TEXT_SELECTOR).unwrap_or_default();

    Ok(DanceEvent::skeletal(starts_at, name, description, SCHOOL_NAME, url)
        .with_end(ends_at)
        .with_lower_price(price))
}

// chrono reads `%Y` from as few as one digit, so "15.11.24" would land in year 24.
fn parse_base_date(text: &str) -> Option<NaiveDate> {
    let year = text.rsplit('.').next()?;
    if year.len() != 4 {
        return None;
    }
    NaiveDate::parse_from_str(text, BASE_DATE_FORMAT).ok()
}
