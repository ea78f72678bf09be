use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Job board a posting was collected from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    #[serde(rename = "LinkedIn")]
    Linkedin,
    Gupy,
    #[serde(rename = "InfoJobs")]
    Infojobs,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linkedin => "LinkedIn",
            Platform::Gupy => "Gupy",
            Platform::Infojobs => "InfoJobs",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "linkedin" => Ok(Platform::Linkedin),
            "gupy" => Ok(Platform::Gupy),
            "infojobs" => Ok(Platform::Infojobs),
            other => Err(format!("unknown job board '{}'", other)),
        }
    }
}

/// One normalized job listing.
///
/// `date_posted` is kept exactly as the board reported it ("2 horas",
/// "3 dias", an ISO timestamp or "Recent"), see [`crate::recency`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub date_posted: String,
    pub platform: Platform,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Posting {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        date_posted: impl Into<String>,
        platform: Platform,
        url: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: location.into(),
            date_posted: date_posted.into(),
            platform,
            url: url.into(),
            description,
        }
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
