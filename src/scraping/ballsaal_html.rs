use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::base::{self, PageFetcher, ScrapeError};
use super::enrich::enrich_all;
use super::names::clean_name;
use super::prices::{self, EuroSign};
use super::timeparse;
use super::DanceSchool;
use crate::config::AppConfig;
use crate::models::DanceEvent;

const URL: &str = "https://www.ballsaal.at/termine_tickets/?no_cache=1";
const SCHOOL_ID: &str = "ballsaal";
const SCHOOL_NAME: &str = "Ballsaal";
const LISTING_DATE_FORMAT: &str = "%d.%m.%Y, %H:%M Uhr";
const SOLD_OUT_MARKER: &str = "Ausgebucht";
const SOLD_OUT_SUFFIX: &str = " [ausgebucht]";

static EVENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".event").expect("ballsaal event selector"));
static NAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".name").expect("ballsaal name"));
static DESCRIPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".short-description").expect("ballsaal description"));
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".date").expect("ballsaal date"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".button").expect("ballsaal ticket link"));

static START_TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.event-start-time").expect("ticketing start time"));
static BOLD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.fw-bold").expect("ticketing bold text"));
static END_DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.end-date").expect("ticketing end date"));
static PRICE_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".ticket-price-cell").expect("ticketing price cell"));

pub struct Ballsaal {
    max_parallel_fetches: Option<usize>,
}

impl Ballsaal {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            max_parallel_fetches: config.max_parallel_fetches,
        }
    }
}

impl DanceSchool for Ballsaal {
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
        let html = fetcher.get(URL).context("ballsaal listing unavailable")?;
        let events = parse_listing(&html);
        info!("Found {} events on the Ballsaal listing", events.len());

        // End time and price are only on the ticketing page of each event.
        let workers = base::pool_size(events.len(), self.max_parallel_fetches);
        let enriched = enrich_all(events, workers, |event| enrich_event(event, fetcher))
            .into_iter()
            .map(|result| match result {
                Ok(event) => event,
                Err((event, err)) => {
                    warn!("keeping {:?} without ticket details: {err}", event.name);
                    event
                }
            })
            .collect();
        Ok(enriched)
    }
}

pub(crate) fn parse_listing(html: &str) -> Vec<DanceEvent> {
    let document = Html::parse_document(html);
    let mut events = Vec::new();

    for card in document.select(&EVENT_SELECTOR) {
        let name = match base::first_text(&card, &NAME_SELECTOR) {
            Some(text) => clean_name(&text),
            None => continue,
        };
        let date_text = match base::first_text(&card, &DATE_SELECTOR) {
            Some(text) => text,
            None => continue,
        };
        let starts_at = match parse_listing_date(&date_text) {
            Some(dt) => dt,
            None => {
                warn!("skipping {name:?}: unreadable date {date_text:?}");
                continue;
            }
        };
        let website = match base::absolute_url(URL, base::first_attr(&card, &LINK_SELECTOR, "href")) {
            Some(url) => url,
            None => {
                warn!("skipping {name:?}: no ticket link");
                continue;
            }
        };
        let description = base::first_text(&card, &DESCRIPTION_SELECTOR).unwrap_or_default();

        events.push(DanceEvent::skeletal(
            starts_at,
            name,
            description,
            SCHOOL_NAME,
            website,
        ));
    }

    events
}

/// `"Sa, 12.10.2024, 20:00 Uhr"`; the weekday prefix is always four characters.
fn parse_listing_date(text: &str) -> Option<NaiveDateTime> {
    let without_weekday: String = text.chars().skip(4).collect();
    NaiveDateTime::parse_from_str(without_weekday.trim(), LISTING_DATE_FORMAT).ok()
}

fn enrich_event(
    event: DanceEvent,
    fetcher: &dyn PageFetcher,
) -> Result<DanceEvent, (DanceEvent, ScrapeError)> {
    let html = match fetcher.get(&event.website) {
        Ok(html) => html,
        Err(err) => return Err((event, err)),
    };
    let document = Html::parse_document(&html);
    let layout = TicketLayout::detect(&document);
    debug!("{} uses the {:?} ticketing layout", event.website, layout);
    Ok(layout.apply(event, &document))
}

/// The ticketing site exists in two generations with different markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketLayout {
    Current,
    Legacy,
}

impl TicketLayout {
    pub fn detect(document: &Html) -> Self {
        if document.select(&START_TIME_SELECTOR).next().is_some() {
            TicketLayout::Current
        } else {
            TicketLayout::Legacy
        }
    }

    pub fn apply(self, event: DanceEvent, document: &Html) -> DanceEvent {
        match self {
            TicketLayout::Current => apply_current(event, document),
            TicketLayout::Legacy => apply_legacy(event, document),
        }
    }
}

fn apply_current(event: DanceEvent, document: &Html) -> DanceEvent {
    // "Sa, 12. Oktober 2024, 20:00 - So, 13. Oktober 2024, 02:00"
    let end_text = base::document_text(document, &START_TIME_SELECTOR)
        .and_then(|text| text.rsplit('-').next().map(|end| end.trim().to_string()));
    let ends_at = end_text.and_then(|text| parse_end(&event, &text));

    // Prices have no dedicated markup, only bold text with a euro sign.
    let price = prices::lowest_price(
        base::document_texts(document, &BOLD_SELECTOR)
            .into_iter()
            .filter(|text| text.contains('€')),
        EuroSign::AfterAmount,
    );

    // TODO: append the sold out suffix once a sold out event shows up in this layout.
    event.with_end(ends_at).with_lower_price(price)
}

fn apply_legacy(event: DanceEvent, document: &Html) -> DanceEvent {
    let ends_at = base::document_text(document, &END_DATE_SELECTOR)
        .and_then(|text| parse_end(&event, &text));
    let tiers = TicketTiers::from_cells(base::document_texts(document, &PRICE_CELL_SELECTOR));

    let event = event.with_end(ends_at).with_lower_price(tiers.lowest);
    if tiers.available == Some(false) {
        event.with_name_suffix(SOLD_OUT_SUFFIX)
    } else {
        event
    }
}

fn parse_end(event: &DanceEvent, text: &str) -> Option<NaiveDateTime> {
    match timeparse::parse_natural(text, event.starts_at.date()) {
        Ok(end) => Some(end),
        Err(err) => {
            debug!("no end time for {:?}: {err}", event.name);
            None
        }
    }
}

/// Price cells of the legacy layout.
#[derive(Debug, Default, PartialEq, Eq)]
struct TicketTiers {
    lowest: Option<u32>,
    /// `None` until a priced cell was seen. Once any priced cell is not sold
    /// out this stays `Some(true)`.
    available: Option<bool>,
}

impl TicketTiers {
    fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tiers = TicketTiers::default();
        for cell in cells {
            let cell = cell.as_ref();
            let Some(price) = prices::price_in(cell, EuroSign::BeforeAmount) else {
                continue;
            };
            tiers.lowest = Some(tiers.lowest.map_or(price, |lowest| lowest.min(price)));
            if tiers.available != Some(true) {
                tiers.available = Some(!cell.contains(SOLD_OUT_MARKER));
            }
        }
        tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::base::testing::StaticFetcher;
    use chrono::NaiveDate;

    const LISTING_HTML: &str = r#"
    <div class="events">
        <div class="event">
            <h3 class="name">"Tanzabend MIT Live-Band"</h3>
            <div class="date">Sa, 12.10.2024, 20:00 Uhr</div>
            <p class="short-description">Standard und Latein mit der Ballsaal Band.</p>
            <a class="button" href="https://tickets.ballsaal.at/event/tanzabend">Tickets</a>
        </div>
        <div class="event">
            <h3 class="name">Vienna Salsa Splash</h3>
            <div class="date">Sa, 19.10.2024, 21:00 Uhr</div>
            <p class="short-description">Salsa, Bachata, Kizomba.</p>
            <a class="button" href="https://tickets.ballsaal.at/event/salsa">Tickets</a>
        </div>
        <div class="event">
            <h3 class="name">Halloween Party...</h3>
            <div class="date">Do, 31.10.2024, 20:30 Uhr</div>
            <a class="button" href="https://tickets.ballsaal.at/event/halloween">Tickets</a>
        </div>
        <div class="event">
            <h3 class="name">Silvesterball</h3>
            <div class="date">Di, 31.12.2024, 21:00 Uhr</div>
            <a class="button" href="https://tickets.ballsaal.at/event/silvester">Tickets</a>
        </div>
        <div class="event">
            <h3 class="name">Termin folgt</h3>
            <div class="date">demnächst</div>
            <a class="button" href="https://tickets.ballsaal.at/event/tba">Tickets</a>
        </div>
    </div>
    "#;

    const CURRENT_DETAIL_HTML: &str = r#"
    <div class="event-header">
        <div class="event-start-time">Sa, 12. Oktober 2024, 20:00 - So, 13. Oktober 2024, 02:00</div>
    </div>
    <div class="tickets">
        <div class="fw-bold">Kategorie A 39,00 €</div>
        <div class="fw-bold">Kategorie B 29,50 €</div>
        <div class="fw-bold">Garderobe inklusive</div>
    </div>
    "#;

    const LEGACY_DETAIL_HTML: &str = r#"
    <p>Ende: <span class="end-date">So. 20.10. 01:00 Uhr</span></p>
    <table>
        <tr><td>Standard</td><td class="ticket-price-cell">€ 25,00 Ausgebucht</td></tr>
        <tr><td>Ermäßigt</td><td class="ticket-price-cell">€ 18,50</td></tr>
        <tr><td>Loge</td><td class="ticket-price-cell">€ 45,00 Ausgebucht</td></tr>
    </table>
    "#;

    const SOLD_OUT_DETAIL_HTML: &str = r#"
    <p>Ende: <span class="end-date">Fr. 01.11. 02:00 Uhr</span></p>
    <table>
        <tr><td class="ticket-price-cell">€ 15,00 Ausgebucht</td></tr>
        <tr><td class="ticket-price-cell">€ 12,00 Ausgebucht</td></tr>
    </table>
    "#;

    fn at(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    fn fetcher() -> StaticFetcher {
        StaticFetcher::default()
            .with_page(URL, LISTING_HTML)
            .with_page("https://tickets.ballsaal.at/event/tanzabend", CURRENT_DETAIL_HTML)
            .with_page("https://tickets.ballsaal.at/event/salsa", LEGACY_DETAIL_HTML)
            .with_page("https://tickets.ballsaal.at/event/halloween", SOLD_OUT_DETAIL_HTML)
    }

    #[test]
    fn parses_listing_into_skeletal_events() {
        let events = parse_listing(LISTING_HTML);
        assert_eq!(events.len(), 4, "the undated entry is skipped");

        let first = &events[0];
        assert_eq!(first.name, "Tanzabend Mit Live-Band");
        assert_eq!(first.starts_at, at(2024, 10, 12, 20, 0));
        assert_eq!(first.ends_at, None);
        assert_eq!(first.price_euro_cent, None);
        assert_eq!(first.description, "Standard und Latein mit der Ballsaal Band.");
        assert_eq!(first.dancing_school, "Ballsaal");
        assert_eq!(first.website, "https://tickets.ballsaal.at/event/tanzabend");

        assert_eq!(events[1].name, "Salsa Splash");
        assert_eq!(events[2].name, "Halloween Party");
        assert_eq!(events[2].description, "");
    }

    #[test]
    fn enriches_every_listed_event() {
        let events = Ballsaal { max_parallel_fetches: None }
            .fetch(&fetcher())
            .expect("fetch ballsaal");
        assert_eq!(events.len(), 4);

        let current = &events[0];
        assert_eq!(current.ends_at, Some(at(2024, 10, 13, 2, 0)));
        assert_eq!(current.price_euro_cent, Some(2950));

        let legacy = &events[1];
        assert_eq!(legacy.name, "Salsa Splash");
        assert_eq!(legacy.ends_at, Some(at(2024, 10, 20, 1, 0)));
        assert_eq!(legacy.price_euro_cent, Some(1850));

        let sold_out = &events[2];
        assert_eq!(sold_out.name, "Halloween Party [ausgebucht]");
        assert_eq!(sold_out.price_euro_cent, Some(1200));
        assert_eq!(sold_out.ends_at, Some(at(2024, 11, 1, 2, 0)));

        // No ticketing page: the listing data survives on its own.
        let missing = &events[3];
        assert_eq!(missing.name, "Silvesterball");
        assert_eq!(missing.ends_at, None);
        assert_eq!(missing.price_euro_cent, None);
    }

    #[test]
    fn listing_failure_fails_the_school() {
        let result = Ballsaal { max_parallel_fetches: Some(2) }.fetch(&StaticFetcher::default());
        assert!(result.is_err());
    }

    #[test]
    fn detects_layout_by_start_time_block() {
        assert_eq!(
            TicketLayout::detect(&Html::parse_document(CURRENT_DETAIL_HTML)),
            TicketLayout::Current
        );
        assert_eq!(
            TicketLayout::detect(&Html::parse_document(LEGACY_DETAIL_HTML)),
            TicketLayout::Legacy
        );
        assert_eq!(TicketLayout::detect(&Html::parse_document("")), TicketLayout::Legacy);
    }

    #[test]
    fn end_without_year_rolls_into_next_year() {
        let event = DanceEvent::skeletal(at(2024, 12, 31, 21, 0), "Silvesterball", "", SCHOOL_NAME, "x");
        let document = Html::parse_document(r#"<span class="end-date">Mi. 01.01. 03:00 Uhr</span>"#);
        let event = TicketLayout::Legacy.apply(event, &document);
        assert_eq!(event.ends_at, Some(at(2025, 1, 1, 3, 0)));
        assert_eq!(event.name, "Silvesterball");
    }

    #[test]
    fn missing_fields_stay_unknown() {
        let event = DanceEvent::skeletal(at(2024, 10, 12, 20, 0), "Ball", "", SCHOOL_NAME, "x")
            .with_lower_price(Some(3000));
        let document = Html::parse_document(
            r#"<div class="event-start-time">Einlass ab abends</div><div class="fw-bold">gratis</div>"#,
        );
        let event = TicketLayout::Current.apply(event, &document);
        assert_eq!(event.ends_at, None);
        assert_eq!(event.price_euro_cent, Some(3000));
    }

    #[test]
    fn availability_only_flips_towards_available() {
        let tiers = TicketTiers::from_cells(["€ 20,00 Ausgebucht", "€ 30,00", "€ 10,00 Ausgebucht"]);
        assert_eq!(tiers, TicketTiers { lowest: Some(1000), available: Some(true) });

        let tiers = TicketTiers::from_cells(["€ 20,00 Ausgebucht", "Ausgebucht", "kein Preis"]);
        assert_eq!(tiers, TicketTiers { lowest: Some(2000), available: Some(false) });

        assert_eq!(TicketTiers::from_cells(["Ausgebucht"]), TicketTiers::default());
    }
}
