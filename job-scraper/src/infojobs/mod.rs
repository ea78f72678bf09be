use async_trait::async_trait;
use job_filter::{all_of, filter_postings, Keywords, Platform, Posting, PostingFilter, TechFilter};
use serde::{Deserialize, Serialize};

use crate::api::{CollectQuery, Collector, Error, Result};
use crate::http::HttpSession;

pub const AUTH_URL: &str = "https://www.infojobs.net";
pub const API_URL: &str = "https://api.infojobs.net";

const MAX_RESULTS: &str = "20";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct Author {
    name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Offer {
    title: Option<String>,
    #[serde(default)]
    author: Author,
    city: Option<String>,
    link: Option<String>,
    updated: Option<String>,
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OfferSearch {
    #[serde(default)]
    offers: Vec<serde_json::Value>,
}

fn convert_offer(value: serde_json::Value) -> Option<Posting> {
    let offer: Offer = match serde_json::from_value(value) {
        Ok(offer) => offer,
        Err(e) => {
            log::debug!("dropping malformed infojobs offer: {}", e);
            return None;
        }
    };
    let title = offer.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let company = offer
        .author
        .name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("N/A");
    Some(Posting::new(
        title,
        company,
        format!("{}, BA", offer.city.as_deref().unwrap_or("Salvador")),
        offer.updated.unwrap_or_else(|| "Recent".to_owned()),
        Platform::Infojobs,
        offer.link.unwrap_or_else(|| "#".to_owned()),
        Some(offer.content.unwrap_or_default()),
    ))
}

/// InfoJobs offer API, authenticated with OAuth client credentials.
pub struct InfojobsCollector {
    session: HttpSession,
    credentials: Credentials,
    auth_url: String,
    api_url: String,
}

impl InfojobsCollector {
    pub fn new(session: HttpSession, credentials: Credentials) -> Self {
        Self::with_base_urls(session, credentials, AUTH_URL, API_URL)
    }

    pub fn with_base_urls(
        session: HttpSession,
        credentials: Credentials,
        auth_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            session,
            credentials,
            auth_url: auth_url.into().trim_end_matches('/').to_owned(),
            api_url: api_url.into().trim_end_matches('/').to_owned(),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let url = format!("{}/oauth/authorize", self.auth_url);
        let token: TokenResponse = self
            .session
            .get_json(|client| {
                client
                    .post(&url)
                    .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
                    .form(&[("grant_type", "client_credentials")])
            })
            .await
            .map_err(|e| match e {
                Error::RequestNotOk { status, .. } => {
                    Error::Auth(format!("token request rejected with status {}", status))
                }
                other => other,
            })?;
        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Auth("token response without access_token".to_owned()))
    }

    async fn search(&self, token: &str, level: &str, location: &str) -> Result<Vec<Posting>> {
        let url = format!("{}/api/7/offer", self.api_url);
        let q = format!("{} TI {}", level, location);
        log::debug!("requesting offers from infojobs, search: {}", q);
        let search: OfferSearch = self
            .session
            .get_json(|client| {
                client
                    .get(&url)
                    .bearer_auth(token)
                    .header("Content-Type", "application/json")
                    .query(&[("q", q.as_str()), ("city", location), ("maxResults", MAX_RESULTS)])
            })
            .await?;
        let postings = search
            .offers
            .into_iter()
            .filter_map(convert_offer)
            .collect::<Vec<_>>();
        log::info!("found {} infojobs postings for '{}'", postings.len(), level);
        Ok(postings)
    }
}

#[async_trait]
impl Collector for InfojobsCollector {
    fn platform(&self) -> Platform {
        Platform::Infojobs
    }

    async fn collect(&self, query: &CollectQuery) -> Result<Vec<Posting>> {
        let token = self.access_token().await?;
        let mut postings = Vec::new();
        let mut first_error = None;
        let mut failures = 0;
        for level in &query.job_levels {
            match self.search(&token, level, &query.location).await {
                Ok(found) => postings.extend(found),
                Err(e) => {
                    log::error!("infojobs search for '{}' failed: {}", level, e);
                    failures += 1;
                    first_error.get_or_insert(e);
                }
            }
        }
        if failures == query.job_levels.len() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        let tech = TechFilter::new(Keywords::new(&query.tech_terms));
        let level = TechFilter::new(Keywords::new(&query.job_levels));
        let filters: Vec<&dyn PostingFilter> = vec![&tech, &level];
        Ok(filter_postings(postings, &all_of(filters)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::http::test_session;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn collector(server: &MockServer) -> InfojobsCollector {
        InfojobsCollector::with_base_urls(
            test_session(),
            Credentials {
                client_id: "id".to_owned(),
                client_secret: "secret".to_owned(),
            },
            server.uri(),
            server.uri(),
        )
    }

    fn query() -> CollectQuery {
        CollectQuery {
            job_levels: vec!["junior".to_owned()],
            tech_terms: vec!["suporte".to_owned(), "developer".to_owned()],
            location: "Salvador".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_collect_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/authorize"))
            .and(header("Authorization", "Basic aWQ6c2VjcmV0"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/7/offer"))
            .and(header("Authorization", "Bearer tok"))
            .and(query_param("q", "junior TI Salvador"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "offers": [
                    {
                        "title": "Suporte Junior",
                        "author": { "name": "Acme" },
                        "city": "Salvador",
                        "link": "https://www.infojobs.com.br/vaga-1.aspx",
                        "updated": "2 horas",
                        "content": "Atendimento N1"
                    },
                    { "title": "Vendedor Junior", "author": { "name": "Beta" } },
                    { "author": { "name": "No title" } }
                ]
            })))
            .mount(&server)
            .await;

        let postings = collector(&server).collect(&query()).await.unwrap();
        assert_eq!(postings.len(), 1);
        let posting = &postings[0];
        assert_eq!(posting.title, "Suporte Junior");
        assert_eq!(posting.company, "Acme");
        assert_eq!(posting.location, "Salvador, BA");
        assert_eq!(posting.date_posted, "2 horas");
        assert_eq!(posting.platform, Platform::Infojobs);
        assert_eq!(posting.description(), "Atendimento N1");
    }

    #[tokio::test]
    async fn test_rejected_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/authorize"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = collector(&server).collect(&query()).await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[tokio::test]
    async fn test_missing_access_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let result = collector(&server).collect(&query()).await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }
}
