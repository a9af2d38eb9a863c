pub mod config;
pub mod models;
pub mod scraping;
mod utils;

pub use config::AppConfig;
pub use models::DanceEvent;
