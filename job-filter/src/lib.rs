//! Classification and deduplication of job postings.
//!
//! Everything here is pure: postings go in, decisions come out. Collection,
//! persistence and notification live in the other workspace crates.

pub mod dedup;
pub mod keywords;
pub mod posting;
pub mod recency;

pub use dedup::{identity_key, new_postings, unique_by_identity};
pub use keywords::{all_of, Keywords, LevelFilter, PostingFilter, TechFilter};
pub use posting::{Platform, Posting};
pub use recency::{is_recent, RecencyFilter};

/// Keeps the postings `filter` accepts.
pub fn filter_postings<F: PostingFilter + ?Sized>(postings: Vec<Posting>, filter: &F) -> Vec<Posting> {
    postings
        .into_iter()
        .filter(|posting| filter.accepts(posting))
        .collect()
}
