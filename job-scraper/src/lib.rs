pub mod api;
pub mod gupy;
pub mod http;
pub mod infojobs;
pub mod linkedin;

pub use api::{CollectQuery, Collector, Error, Result};
pub use http::{HttpSession, HttpSettings};
pub use job_filter::{Platform, Posting};
