use async_trait::async_trait;
use job_filter::{Platform, Posting};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Request error: '{0}'")]
    Request(#[from] reqwest::Error),
    #[error("Request to '{url}' not successful, status code: {status}")]
    RequestNotOk { url: String, status: u16 },
    #[error("Failed to deserialize response from '{url}': {source}")]
    Deserialize {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Authentication failed: '{0}'")]
    Auth(String),
}

impl Error {
    /// Network failures, rate limiting and server errors are worth another try.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Request(_) => true,
            Error::RequestNotOk { status, .. } => *status == 429 || *status >= 500,
            Error::Deserialize { .. } | Error::Auth(_) => false,
        }
    }
}

/// Search criteria handed to every collector.
#[derive(Debug, Clone, Default)]
pub struct CollectQuery {
    pub job_levels: Vec<String>,
    pub tech_terms: Vec<String>,
    pub location: String,
}

/// A job board that can be searched for postings.
#[async_trait]
pub trait Collector: Send + Sync {
    fn platform(&self) -> Platform;

    async fn collect(&self, query: &CollectQuery) -> Result<Vec<Posting>>;
}
