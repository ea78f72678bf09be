use lazy_static::lazy_static;
use regex::Regex;

use crate::keywords::PostingFilter;
use crate::posting::Posting;

/// Postings younger than this many hours count as recent.
pub const MAX_AGE_HOURS: u64 = 24;

enum Pattern {
    Hours,
    Days,
    Date,
}

lazy_static! {
    static ref PATTERNS: [(Pattern, Regex); 3] = [
        (Pattern::Hours, Regex::new(r"([0-9]+)\s*(horas?|h)\s*").unwrap()),
        (Pattern::Days, Regex::new(r"([0-9]+)\s*(dias?|d)\s*").unwrap()),
        (Pattern::Date, Regex::new(r"([0-9]+)/([0-9]+)/([0-9]+)").unwrap()),
    ];
}

/// Whether a free-form "date posted" text is within the freshness window.
///
/// Patterns are tried in order and the first one that yields a number decides:
/// an hour count must be at most [`MAX_AGE_HOURS`], a day count must be zero.
/// Explicit `D/M/Y` dates are not converted to an age and, like empty or
/// unrecognised text, count as recent.
pub fn is_recent(date_posted: &str) -> bool {
    let text = date_posted.to_lowercase();
    for (pattern, re) in PATTERNS.iter() {
        let Some(amount) = re
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
        else {
            continue;
        };
        match pattern {
            Pattern::Hours => return amount <= MAX_AGE_HOURS,
            Pattern::Days => return amount == 0,
            Pattern::Date => break,
        }
    }
    true
}

/// [`is_recent`] applied to `date_posted`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecencyFilter;

impl PostingFilter for RecencyFilter {
    fn accepts(&self, posting: &Posting) -> bool {
        is_recent(&posting.date_posted)
    }
}
