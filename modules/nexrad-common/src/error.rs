use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommonError>;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid site id: {0:?}")]
    InvalidSite(String),

    #[error("Invalid time of day: {0:?} (expected HHMM)")]
    InvalidTime(String),

    #[error("Invalid time window: start {start} is not before end {end}")]
    EmptyWindow {
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
