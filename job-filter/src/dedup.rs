use std::collections::HashSet;

use crate::posting::Posting;

/// Key that identifies "the same posting" across runs.
///
/// Title and company are concatenated without a separator, so
/// `("Dev", "X")` and `("De", "vX")` share a key.
pub fn identity_key(posting: &Posting) -> String {
    format!("{}{}", posting.title, posting.company)
}

/// Postings from `current` whose identity key does not appear in `previous`,
/// in their original order.
pub fn new_postings(current: &[Posting], previous: &[Posting]) -> Vec<Posting> {
    let seen = previous.iter().map(identity_key).collect::<HashSet<_>>();
    current
        .iter()
        .filter(|posting| !seen.contains(&identity_key(posting)))
        .cloned()
        .collect()
}

/// Keeps the first posting of every identity key.
pub fn unique_by_identity(postings: Vec<Posting>) -> Vec<Posting> {
    let mut keys = HashSet::with_capacity(postings.len());
    let before = postings.len();
    let unique = postings
        .into_iter()
        .filter(|posting| keys.insert(identity_key(posting)))
        .collect::<Vec<_>>();
    if unique.len() < before {
        log::debug!("dropped {} duplicated postings", before - unique.len());
    }
    unique
}
