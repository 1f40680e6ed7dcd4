//! Fuzzy scoring for command search, backed by nucleo.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

/// Added when a field equals the query, ignoring case.
pub(crate) const EXACT_MATCH_BONUS: u32 = 10_000;

/// A literal fuzzy query plus reusable matcher buffers.
///
/// Query characters carry no syntax: `!`, `^`, `$` and `'` match themselves.
pub(crate) struct FuzzyQuery {
    needle: String,
    pattern: Pattern,
    matcher: Matcher,
    buf: Vec<char>,
}

impl FuzzyQuery {
    /// `None` for a blank query, which matches everything with score 0.
    pub fn new(query: &str) -> Option<Self> {
        let needle = query.trim();
        if needle.is_empty() {
            return None;
        }
        Some(Self {
            needle: needle.to_lowercase(),
            pattern: Pattern::new(needle, CaseMatching::Ignore, Normalization::Smart, AtomKind::Fuzzy),
            matcher: Matcher::new(Config::DEFAULT),
            buf: Vec::with_capacity(64),
        })
    }

    pub fn score(&mut self, haystack: &str) -> Option<u32> {
        if haystack.is_empty() {
            return None;
        }
        self.buf.clear();
        let utf32 = Utf32Str::new(haystack, &mut self.buf);
        let score = self.pattern.score(utf32, &mut self.matcher)?;
        if haystack.trim().to_lowercase() == self.needle {
            Some(score.saturating_add(EXACT_MATCH_BONUS))
        } else {
            Some(score)
        }
    }

    /// Best score across several fields; `None` if no field matches.
    pub fn best(&mut self, fields: &[&str]) -> Option<u32> {
        fields.iter().filter_map(|field| self.score(field)).max()
    }
}
