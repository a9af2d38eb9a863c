use dirs::data_dir;
use std::path::PathBuf;

pub fn data_root() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
        .join("dance-scrape")
}

pub fn config_path() -> PathBuf {
    data_root().join("config.json")
}
