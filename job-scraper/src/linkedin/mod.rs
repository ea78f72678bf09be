use std::collections::HashSet;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use job_filter::{filter_postings, Keywords, Platform, Posting, TechFilter};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use crate::api::{CollectQuery, Collector, Result};
use crate::http::HttpSession;

pub const BASE_URL: &str = "https://www.linkedin.com";

/// Combined with every job level to build the search keywords.
const DOMAIN_QUERIES: [&str; 2] = ["ti", "tecnologia"];

lazy_static! {
    static ref CARD: Selector = Selector::parse("li").unwrap();
    static ref TITLE: Selector = Selector::parse(".base-search-card__title").unwrap();
    static ref COMPANY: Selector = Selector::parse(".base-search-card__subtitle").unwrap();
    static ref LOCATION: Selector = Selector::parse(".job-search-card__location").unwrap();
    static ref POSTED: Selector = Selector::parse("time").unwrap();
    static ref LINK: Selector = Selector::parse("a.base-card__full-link").unwrap();
}

fn job_search_url(base_url: &str, query: &str, location: &str, offset: u32) -> String {
    format!(
        "{}/jobs-guest/jobs/api/seeMoreJobPostings/search?keywords={}&location={}&f_TPR=r86400&start={}",
        base_url,
        urlencoding::encode(query),
        urlencoding::encode(location),
        offset
    )
}

fn search_queries(job_levels: &[String]) -> Vec<String> {
    job_levels
        .iter()
        .flat_map(|level| DOMAIN_QUERIES.iter().map(move |domain| format!("{} {}", level, domain)))
        .collect()
}

fn text_of(card: ElementRef, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
}

fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", base_url, href)
    } else {
        href.to_owned()
    }
}

/// Turns the job cards of a guest search page into postings.
/// Cards without a title are skipped.
fn parse_cards(body: &str, base_url: &str, location: &str) -> Vec<Posting> {
    let doc = Html::parse_document(body);
    doc.select(&CARD)
        .filter_map(|card| {
            let Some(title) = text_of(card, &TITLE) else {
                log::debug!("skipping linkedin card without title");
                return None;
            };
            let company = text_of(card, &COMPANY).unwrap_or_else(|| "N/A".to_owned());
            let job_location = text_of(card, &LOCATION).unwrap_or_else(|| location.to_owned());
            let date_posted = card
                .select(&POSTED)
                .next()
                .and_then(|el| el.value().attr("datetime"))
                .unwrap_or("Recent")
                .to_owned();
            let url = card
                .select(&LINK)
                .next()
                .and_then(|el| el.value().attr("href"))
                .map(|href| absolute_url(base_url, href))
                .unwrap_or_else(|| "#".to_owned());
            Some(Posting::new(
                title,
                company,
                job_location,
                date_posted,
                Platform::Linkedin,
                url,
                None,
            ))
        })
        .collect()
}

/// LinkedIn guest job search, restricted to the last 24 hours.
pub struct LinkedinCollector {
    session: HttpSession,
    base_url: String,
}

impl LinkedinCollector {
    pub fn new(session: HttpSession) -> Self {
        Self::with_base_url(session, BASE_URL)
    }

    pub fn with_base_url(session: HttpSession, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    async fn search(&self, query: &str, location: &str) -> Result<Vec<Posting>> {
        let url = job_search_url(&self.base_url, query, location, 0);
        log::info!("GET {}", url);
        let body = self.session.get_text(|client| client.get(&url)).await?;
        let postings = parse_cards(&body, &self.base_url, location);
        log::info!("found {} linkedin postings for '{}'", postings.len(), query);
        Ok(postings)
    }
}

#[async_trait]
impl Collector for LinkedinCollector {
    fn platform(&self) -> Platform {
        Platform::Linkedin
    }

    async fn collect(&self, query: &CollectQuery) -> Result<Vec<Posting>> {
        let queries = search_queries(&query.job_levels);
        let results = stream::iter(queries.iter())
            .then(|keywords| self.search(keywords, &query.location))
            .collect::<Vec<_>>()
            .await;

        let mut postings = Vec::new();
        let mut first_error = None;
        let mut failures = 0;
        for (keywords, result) in queries.iter().zip(results) {
            match result {
                Ok(found) => postings.extend(found),
                Err(e) => {
                    log::error!("linkedin search for '{}' failed: {}", keywords, e);
                    failures += 1;
                    first_error.get_or_insert(e);
                }
            }
        }
        if failures == queries.len() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        let tech = TechFilter::new(Keywords::new(&query.tech_terms));
        let postings = filter_postings(postings, &tech);
        let mut seen = HashSet::new();
        Ok(postings
            .into_iter()
            .filter(|p| seen.insert(format!("{}_{}", p.title, p.company)))
            .collect())
    }
}
