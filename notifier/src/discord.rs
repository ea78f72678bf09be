use std::time::Duration;

use async_trait::async_trait;
use job_filter::Posting;
use reqwest::Client;
use serde_json::{json, Value};

use crate::{Error, Notifier, Result};

/// At most this many postings get their own embed per cycle.
const MAX_EMBEDS: usize = 8;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SUMMARY_COLOR: u32 = 0x00ff00;
const JOB_COLOR: u32 = 0x3498db;

pub const NO_NEW_POSTINGS: &str = "📭 Nenhuma vaga nova encontrada na última busca.";

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn or_na(text: &str) -> &str {
    if text.is_empty() {
        "N/A"
    } else {
        text
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn summary_payload(postings: &[Posting], location: &str) -> Value {
    let mut platforms: Vec<&str> = Vec::new();
    for posting in postings {
        let name = posting.platform.name();
        if !platforms.contains(&name) {
            platforms.push(name);
        }
    }
    json!({
        "content": format!("🚀 **{} NOVAS VAGAS DE TI ENCONTRADAS!**", postings.len()),
        "embeds": [{
            "title": "📊 Resumo da Busca",
            "color": SUMMARY_COLOR,
            "fields": [
                { "name": "Total de Vagas", "value": postings.len().to_string(), "inline": true },
                { "name": "Plataformas", "value": platforms.join(", "), "inline": true },
                { "name": "Localização", "value": location, "inline": true }
            ],
            "timestamp": timestamp()
        }]
    })
}

fn posting_payload(posting: &Posting, location: &str) -> Value {
    let title = if posting.title.chars().count() > 200 {
        format!("{}...", truncate(&posting.title, 200))
    } else {
        posting.title.clone()
    };
    let url = if posting.url.is_empty() { "#" } else { posting.url.as_str() };
    json!({
        "embeds": [{
            "title": format!("🏢 {}", title),
            "color": JOB_COLOR,
            "fields": [
                { "name": "Empresa", "value": truncate(or_na(&posting.company), 100), "inline": true },
                { "name": "Localização", "value": truncate(or_na(&posting.location), 50), "inline": true },
                { "name": "Plataforma", "value": posting.platform.name(), "inline": true }
            ],
            "url": url,
            "footer": { "text": format!("🤖 Vagas TI Bot - {}", location) },
            "timestamp": timestamp()
        }]
    })
}

/// Posts postings to a Discord channel webhook: a summary, one embed per
/// posting (up to [`MAX_EMBEDS`]) and a remainder line.
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    location: String,
    embed_pause: Duration,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>, location: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
            location: location.into(),
            embed_pause: Duration::from_secs(1),
        })
    }

    /// Pause between two posting embeds, Discord rate limits bursts.
    pub fn with_embed_pause(mut self, pause: Duration) -> Self {
        self.embed_pause = pause;
        self
    }

    async fn post(&self, payload: &Value) -> Result<()> {
        let resp = self.client.post(&self.webhook_url).json(payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            log::error!(
                "webhook rejected message, status code: {}, body: {}",
                status,
                resp.text().await.unwrap_or_else(|_| "empty".to_owned())
            );
            return Err(Error::Rejected(status.as_u16()));
        }
        Ok(())
    }

    async fn send_message(&self, message: &str) -> Result<()> {
        self.post(&json!({ "content": message })).await
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, postings: &[Posting]) -> Result<()> {
        if self.webhook_url.is_empty() {
            return Err(Error::NotConfigured);
        }
        if postings.is_empty() {
            log::info!("{}", NO_NEW_POSTINGS);
            return self.send_message(NO_NEW_POSTINGS).await;
        }

        log::info!("sending {} postings to discord", postings.len());
        self.post(&summary_payload(postings, &self.location)).await?;

        let mut sent = 0;
        for (i, posting) in postings.iter().take(MAX_EMBEDS).enumerate() {
            if i > 0 && !self.embed_pause.is_zero() {
                tokio::time::sleep(self.embed_pause).await;
            }
            match self.post(&posting_payload(posting, &self.location)).await {
                Ok(()) => sent += 1,
                Err(e) => log::error!("failed to send posting '{}': {}", posting.title, e),
            }
        }
        if postings.len() > MAX_EMBEDS {
            let remaining = postings.len() - MAX_EMBEDS;
            if let Err(e) = self
                .send_message(&format!("📊 ... e mais {} vagas!", remaining))
                .await
            {
                log::error!("failed to send remainder message: {}", e);
            }
        }

        log::info!("{}/{} postings sent to discord", sent, postings.len());
        if sent == 0 {
            return Err(Error::NothingDelivered(postings.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use job_filter::Platform;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn posting(i: usize) -> Posting {
        Posting::new(
            format!("Estágio TI {}", i),
            "Acme",
            "Salvador, BA",
            "Recent",
            if i % 2 == 0 { Platform::Gupy } else { Platform::Linkedin },
            format!("https://portal.gupy.io/job/{}", i),
            None,
        )
    }

    fn notifier(server: &MockServer) -> DiscordNotifier {
        DiscordNotifier::new(format!("{}/webhook", server.uri()), "Salvador, BA")
            .unwrap()
            .with_embed_pause(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_empty_cycle_sends_single_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .and(body_partial_json(json!({ "content": NO_NEW_POSTINGS })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server).notify(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_summary_embeds_and_remainder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let postings = (0..10).map(posting).collect::<Vec<_>>();
        notifier(&server).notify(&postings).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1 + MAX_EMBEDS + 1);
        let summary: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(summary["content"], "🚀 **10 NOVAS VAGAS DE TI ENCONTRADAS!**");
        assert_eq!(summary["embeds"][0]["fields"][1]["value"], "Gupy, LinkedIn");
        let first: Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(first["embeds"][0]["title"], "🏢 Estágio TI 0");
        assert_eq!(first["embeds"][0]["url"], "https://portal.gupy.io/job/0");
        let remainder: Value = serde_json::from_slice(&requests[9].body).unwrap();
        assert_eq!(remainder["content"], "📊 ... e mais 2 vagas!");
    }

    #[tokio::test]
    async fn test_missing_webhook_is_not_configured() {
        let notifier = DiscordNotifier::new("", "Salvador, BA").unwrap();
        let result = notifier.notify(&[posting(1)]).await;
        assert!(matches!(result, Err(Error::NotConfigured)));
    }

    #[tokio::test]
    async fn test_failed_summary_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let result = notifier(&server).notify(&[posting(1), posting(2)]).await;
        assert!(matches!(result, Err(Error::Rejected(400))));
    }

    #[tokio::test]
    async fn test_no_delivered_embed_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = notifier(&server).notify(&[posting(1)]).await;
        assert!(matches!(result, Err(Error::NothingDelivered(1))));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let mut long = posting(1);
        long.title = "a".repeat(250);
        let payload = posting_payload(&long, "Salvador, BA");
        let title = payload["embeds"][0]["title"].as_str().unwrap();
        assert_eq!(title.chars().count(), "🏢 ".chars().count() + 200 + 3);
        assert!(title.ends_with("..."));
    }
}
