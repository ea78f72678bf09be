use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, NaiveTime};
use job_filter::{Keywords, LevelFilter, Platform};
use job_scraper::infojobs::Credentials;
use job_scraper::{CollectQuery, HttpSettings};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const JOB_LEVELS: [&str; 7] = [
    "auxiliar",
    "estágio",
    "estagio",
    "assistente",
    "junior",
    "trainer",
    "jr",
];

const EXCLUDE_KEYWORDS: [&str; 6] = [
    "sênior",
    "senior",
    "pleno",
    "especialista",
    "coordinator",
    "manager",
];

const TECH_KEYWORDS: [&str; 23] = [
    "ti",
    "tecnologia",
    "tecnológico",
    "tecnologica",
    "tecnologicos",
    "tecnológica",
    "tecnologia da informação",
    "tecnologia da informacao",
    "tecnologia da informaçao",
    "sistemas",
    "informática",
    "informatica",
    "programação",
    "programacao",
    "desenvolvedor",
    "developer",
    "software",
    "dados",
    "data",
    "suporte",
    "infraestrutura",
    "redes",
    "devops",
];

const SCHEDULE_TIMES: [&str; 4] = ["09:00", "12:00", "15:00", "19:00"];

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|term| term.to_string()).collect()
}

/// Everything a run needs, assembled once at startup.
///
/// Every field is optional in the JSON config file, missing ones keep the
/// built-in value.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    pub job_levels: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub tech_keywords: Vec<String>,
    pub location: String,
    /// daily trigger times, `HH:MM`
    pub schedule_times: Vec<String>,
    pub utc_offset_hours: i32,
    pub sites: Vec<Platform>,
    pub snapshot_path: PathBuf,
    pub webhook_url: String,
    pub infojobs: Option<Credentials>,
    pub http: HttpSettings,
    pub source_timeout_secs: u64,
    pub embed_pause_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            job_levels: owned(&JOB_LEVELS),
            exclude_keywords: owned(&EXCLUDE_KEYWORDS),
            tech_keywords: owned(&TECH_KEYWORDS),
            location: "Salvador, Bahia".to_owned(),
            schedule_times: owned(&SCHEDULE_TIMES),
            utc_offset_hours: -3,
            sites: vec![Platform::Linkedin, Platform::Gupy, Platform::Infojobs],
            snapshot_path: PathBuf::from(persistence::DEFAULT_SNAPSHOT_PATH),
            webhook_url: String::new(),
            infojobs: None,
            http: HttpSettings::default(),
            source_timeout_secs: 300,
            embed_pause_ms: 1000,
        }
    }
}

impl Settings {
    /// Built-in defaults, overlaid with `config_file` when given.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let settings = match config_file {
            None => Settings::default(),
            Some(path) => {
                let data = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
                    path: path.to_owned(),
                    source,
                })?;
                let settings: Settings =
                    serde_json::from_str(&data).map_err(|source| Error::ConfigParse {
                        path: path.to_owned(),
                        source,
                    })?;
                log::info!("loaded settings from {}", path.display());
                settings
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.daily_times()?;
        self.utc_offset()?;
        if self.sites.is_empty() {
            return Err(Error::NoSites);
        }
        Ok(())
    }

    /// Schedule times, sorted and without duplicates.
    pub fn daily_times(&self) -> Result<Vec<NaiveTime>> {
        let mut times = self
            .schedule_times
            .iter()
            .map(|time| {
                NaiveTime::parse_from_str(time.trim(), "%H:%M")
                    .map_err(|_| Error::ScheduleTime(time.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        times.sort();
        times.dedup();
        Ok(times)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or(Error::UtcOffset(self.utc_offset_hours))
    }

    pub fn collect_query(&self) -> CollectQuery {
        CollectQuery {
            job_levels: self.job_levels.clone(),
            tech_terms: self.tech_keywords.clone(),
            location: self.location.clone(),
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::new(
            Keywords::new(&self.job_levels),
            Keywords::new(&self.exclude_keywords),
        )
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn embed_pause(&self) -> Duration {
        Duration::from_millis(self.embed_pause_ms)
    }
}
