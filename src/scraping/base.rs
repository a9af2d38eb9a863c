use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::config::AppConfig;

pub const TIMEZONE: Tz = chrono_tz::Europe::Vienna;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request failed for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("format error: {0}")]
    Format(String),
}

impl ScrapeError {
    fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        ScrapeError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Source of raw page markup.
pub trait PageFetcher: Send + Sync {
    fn get(&self, url: &str) -> Result<String, ScrapeError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| ScrapeError::transport(url, err))?;
        let response = response
            .error_for_status()
            .map_err(|err| ScrapeError::transport(url, err))?;
        response
            .text()
            .map_err(|err| ScrapeError::transport(url, err))
    }
}

pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(inner_text)
        .filter(|text| !text.is_empty())
}

pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// Text of the first match anywhere in the document.
pub fn document_text(document: &Html, selector: &Selector) -> Option<String> {
    first_text(&document.root_element(), selector)
}

/// Texts of every match in the document, empty ones included.
pub fn document_texts(document: &Html, selector: &Selector) -> Vec<String> {
    document.select(selector).map(inner_text).collect()
}

pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href);
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(&href).ok().map(|u| u.to_string())
}

pub fn today() -> NaiveDate {
    Utc::now().with_timezone(&TIMEZONE).date_naive()
}

/// Number of workers for a fan-out over `items` detail pages.
pub fn pool_size(items: usize, cap: Option<usize>) -> usize {
    let wanted = items.max(1);
    cap.map_or(wanted, |cap| wanted.min(cap.max(1)))
}
