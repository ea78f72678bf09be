use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid schedule time '{0}', expected HH:MM")]
    ScheduleTime(String),
    #[error("Invalid utc offset of {0} hours")]
    UtcOffset(i32),
    #[error("No job board enabled")]
    NoSites,
    #[error(transparent)]
    Collector(#[from] job_scraper::Error),
    #[error(transparent)]
    Notifier(#[from] notifier::Error),
    #[error(transparent)]
    Snapshot(#[from] persistence::Error),
}
