pub mod discord;

use async_trait::async_trait;
use job_filter::Posting;
use thiserror::Error;

pub use discord::DiscordNotifier;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Webhook url not configured, set DISCORD_WEBHOOK_URL")]
    NotConfigured,
    #[error("Request error: '{0}'")]
    Request(#[from] reqwest::Error),
    #[error("Webhook rejected message, status code: {0}")]
    Rejected(u16),
    #[error("None of the {0} postings could be delivered")]
    NothingDelivered(usize),
}

/// Announces the postings found in one cycle.
///
/// Called exactly once per cycle, also with an empty slice.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, postings: &[Posting]) -> Result<()>;
}
