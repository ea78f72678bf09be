use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
pub(crate) struct Company {
    pub(crate) name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Job {
    pub(crate) id: Option<u64>,
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) company: Company,
    pub(crate) city: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) published_date: Option<String>,
    pub(crate) description: Option<String>,
}

/// Items are kept raw so that one malformed job does not fail the page.
#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub(crate) data: Vec<serde_json::Value>,
}
