use std::time::Duration;

use rand::Rng;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::api::{Error, Result};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Knobs of the HTTP session shared by all requests of one collector.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// lower bound of the random pause before every request
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// additional attempts after a transient failure
    pub max_retries: u32,
    /// wait before retry n is `backoff_base_secs * 2^n`
    pub backoff_base_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            max_retries: 2,
            backoff_base_secs: 1,
        }
    }
}

/// `reqwest::Client` with a per-request timeout, pacing and retries.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    settings: HttpSettings,
}

impl HttpSession {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    fn delay(&self) -> Duration {
        let HttpSettings {
            min_delay_ms,
            max_delay_ms,
            ..
        } = self.settings;
        if max_delay_ms <= min_delay_ms {
            return Duration::from_millis(min_delay_ms);
        }
        let millis = rand::rng().random_range(min_delay_ms..=max_delay_ms);
        Duration::from_millis(millis)
    }

    async fn send_once(&self, request: RequestBuilder) -> Result<Response> {
        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let url = resp.url().to_string();
            let body = resp.text().await.unwrap_or_default();
            log::error!(
                "Request not successful, status code: {}, url: {}, body: {}",
                status,
                url,
                body.chars().take(200).collect::<String>()
            );
            return Err(Error::RequestNotOk {
                url,
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }

    /// Sends the request built by `request`, retrying transient failures with
    /// exponential backoff. Only successful responses are returned.
    pub async fn send<F>(&self, request: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            match self.send_once(request(&self.client)).await {
                Ok(resp) => return Ok(resp),
                Err(err) if err.is_transient() && attempt < self.settings.max_retries => {
                    let backoff = self
                        .settings
                        .backoff_base_secs
                        .saturating_mul(1u64 << attempt.min(32));
                    log::warn!(
                        "transient error on attempt {}/{}, retrying in {}s: {}",
                        attempt + 1,
                        self.settings.max_retries + 1,
                        backoff,
                        err
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn get_text<F>(&self, request: F) -> Result<String>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let resp = self.send(request).await?;
        Ok(resp.text().await?)
    }

    pub async fn get_json<T, F>(&self, request: F) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let resp = self.send(request).await?;
        let url = resp.url().to_string();
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|source| Error::Deserialize { url, source })
    }
}

#[cfg(test)]
pub(crate) fn test_session() -> HttpSession {
    HttpSession::new(HttpSettings {
        timeout_secs: 5,
        min_delay_ms: 0,
        max_delay_ms: 0,
        max_retries: 0,
        backoff_base_secs: 0,
        ..HttpSettings::default()
    })
    .expect("failed to build test session")
}
