pub(crate) mod types;

use async_stream::stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use job_filter::{all_of, filter_postings, Keywords, Platform, Posting, PostingFilter, TechFilter};

use crate::api::{CollectQuery, Collector, Result};
use crate::http::HttpSession;
use types::{ApiResponse, Job};

pub const BASE_URL: &str = "https://api.gupy.io";
pub const PORTAL_URL: &str = "https://portal.gupy.io";

const RESULTS_PER_PAGE: usize = 50;
const MAX_PAGES: usize = 4;

fn convert_job(value: serde_json::Value) -> Option<Posting> {
    let job: Job = match serde_json::from_value(value) {
        Ok(job) => job,
        Err(e) => {
            log::debug!("dropping malformed gupy job: {}", e);
            return None;
        }
    };
    let title = job.name.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let company = job
        .company
        .name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("N/A");
    let location = format!(
        "{}, {}",
        job.city.as_deref().unwrap_or("Salvador"),
        job.state.as_deref().unwrap_or("BA")
    );
    let url = job
        .id
        .map(|id| format!("{}/job/{}", PORTAL_URL, id))
        .unwrap_or_else(|| "#".to_owned());
    Some(Posting::new(
        title,
        company,
        location,
        job.published_date.unwrap_or_else(|| "Recent".to_owned()),
        Platform::Gupy,
        url,
        Some(job.description.unwrap_or_default()),
    ))
}

/// Gupy public job search API.
pub struct GupyCollector {
    session: HttpSession,
    base_url: String,
}

impl GupyCollector {
    pub fn new(session: HttpSession) -> Self {
        Self::with_base_url(session, BASE_URL)
    }

    pub fn with_base_url(session: HttpSession, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    async fn scrape_page(&self, query: &str, city: &str, offset: usize) -> Result<ApiResponse> {
        let url = format!("{}/api/v1/jobs", self.base_url);
        log::debug!("requesting jobs from gupy, offset: {}, search: {}", offset, query);
        let limit = RESULTS_PER_PAGE.to_string();
        let offset = offset.to_string();
        self.session
            .get_json(|client| {
                client
                    .get(&url)
                    .header("Accept", "application/json")
                    .query(&[
                        ("jobName", query),
                        ("city", city),
                        ("limit", limit.as_str()),
                        ("offset", offset.as_str()),
                    ])
            })
            .await
    }

    /// Pages of raw jobs until a short page or [`MAX_PAGES`].
    /// The first failing page ends the stream with its error.
    fn scrape_pages<'a>(
        &'a self,
        query: &'a str,
        city: &'a str,
    ) -> impl Stream<Item = Result<Vec<serde_json::Value>>> + Send + 'a {
        stream! {
            for page in 0..MAX_PAGES {
                match self.scrape_page(query, city, page * RESULTS_PER_PAGE).await {
                    Ok(resp) => {
                        let last = resp.data.len() < RESULTS_PER_PAGE;
                        yield Ok(resp.data);
                        if last {
                            break;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        }
    }

    async fn search(&self, query: &str, city: &str) -> Result<Vec<Posting>> {
        let pages = self.scrape_pages(query, city).collect::<Vec<_>>().await;
        let mut postings = Vec::new();
        for page in pages {
            postings.extend(page?.into_iter().filter_map(convert_job));
        }
        log::info!("found {} gupy postings for '{}'", postings.len(), query);
        Ok(postings)
    }
}

fn city_of(location: &str) -> &str {
    location.split(',').next().unwrap_or(location).trim()
}

#[async_trait]
impl Collector for GupyCollector {
    fn platform(&self) -> Platform {
        Platform::Gupy
    }

    async fn collect(&self, query: &CollectQuery) -> Result<Vec<Posting>> {
        let city = city_of(&query.location);
        let mut postings = Vec::new();
        let mut first_error = None;
        let mut failures = 0;
        for level in &query.job_levels {
            match self.search(level, city).await {
                Ok(found) => postings.extend(found),
                Err(e) => {
                    log::error!("gupy search for '{}' failed: {}", level, e);
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
