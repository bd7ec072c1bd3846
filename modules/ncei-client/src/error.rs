use thiserror::Error;

pub type Result<T> = std::result::Result<T, NceiError>;

#[derive(Debug, Error)]
pub enum NceiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error (status {status}) for {url}")]
    Http { status: u16, url: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("{url} failed after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last_error: Box<NceiError>,
    },
}

impl From<reqwest::Error> for NceiError {
    fn from(err: reqwest::Error) -> Self {
        NceiError::Network(err.to_string())
    }
}
