pub mod ballsaal_html;
pub mod base;
pub mod chris_html;
pub mod enrich;
pub mod holidays;
pub mod names;
pub mod prices;
pub mod recurring;
pub mod timeparse;

use anyhow::Error;
use tracing::warn;

use crate::config::AppConfig;
use crate::models::DanceEvent;
use base::PageFetcher;

pub trait DanceSchool: Send + Sync {
    fn school_id(&self) -> &'static str;
    fn school_name(&self) -> &'static str;
    fn school_url(&self) -> &'static str;
    fn fetch(&self, fetcher: &dyn PageFetcher) -> anyhow::Result<Vec<DanceEvent>>;
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct SchoolInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

fn active_schools(config: &AppConfig) -> Vec<Box<dyn DanceSchool>> {
    let holidays = holidays::AustrianHolidays::covering(base::today(), config.horizon_weeks);
    vec![
        Box::new(ballsaal_html::Ballsaal::new(config)),
        Box::new(chris_html::Chris::new(config, Box::new(holidays))),
    ]
}

pub fn list_schools(config: &AppConfig) -> Vec<SchoolInfo> {
    active_schools(config)
        .into_iter()
        .map(|school| SchoolInfo {
            id: school.school_id().to_string(),
            name: school.school_name().to_string(),
            url: school.school_url().to_string(),
        })
        .collect()
}

fn find_school(config: &AppConfig, id: &str) -> Option<Box<dyn DanceSchool>> {
    active_schools(config)
        .into_iter()
        .find(|school| school.school_id() == id)
}

/// Runs every school. Fails only if no school produced anything.
pub fn run_all(config: &AppConfig, fetcher: &dyn PageFetcher) -> anyhow::Result<Vec<DanceEvent>> {
    run_schools(active_schools(config), fetcher)
}

fn run_schools(
    schools: Vec<Box<dyn DanceSchool>>,
    fetcher: &dyn PageFetcher,
) -> anyhow::Result<Vec<DanceEvent>> {
    let mut events = Vec::new();
    let mut errors: Vec<(String, Error)> = Vec::new();

    for school in schools {
        let school_id = school.school_id().to_string();
        match school.fetch(fetcher) {
            Ok(mut scraped) => events.append(&mut scraped),
            Err(err) => {
                warn!("{school_id} failed: {err:#}");
                errors.push((school_id, err));
            }
        }
    }

    if events.is_empty() && !errors.is_empty() {
        let joined = errors
            .into_iter()
            .map(|(id, err)| format!("{id}: {err:#}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(anyhow::anyhow!("schools failed: {joined}"));
    }

    Ok(events)
}

pub fn run_single(
    id: &str,
    config: &AppConfig,
    fetcher: &dyn PageFetcher,
) -> anyhow::Result<Vec<DanceEvent>> {
    let school =
        find_school(config, id).ok_or_else(|| anyhow::anyhow!("unknown school id: {id}"))?;
    school.fetch(fetcher)
}
