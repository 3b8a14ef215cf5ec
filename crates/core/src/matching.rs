//! Free-text keyword matching.
//!
//! Patient data arrives as free text ("Type 2 Diabetes", "PENICILLIN - hives"). Every
//! comparison against the clinical tables goes through [`KeywordMatcher`], so the strategy can
//! change (tokenised, fuzzy, synonym-aware) without touching classification logic.
//!
//! The default, [`SubstringMatcher`], is a case-insensitive substring test. It misses typos and
//! synonyms; that false-negative bias is accepted. Unrecognised text never raises an alert.

/// Strategy for deciding whether free text mentions a keyword.
pub trait KeywordMatcher: Send + Sync {
    /// `keyword` is always lowercase.
    fn matches(&self, text: &str, keyword: &str) -> bool;

    fn matches_any(&self, text: &str, keywords: &[&str]) -> bool {
        keywords.iter().any(|keyword| self.matches(text, keyword))
    }
}

/// Case-insensitive substring matching.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubstringMatcher;

impl KeywordMatcher for SubstringMatcher {
    fn matches(&self, text: &str, keyword: &str) -> bool {
        matches_keyword(text, keyword)
    }
}

/// True if `text` contains `keyword`, ignoring case. Empty keywords never match.
pub fn matches_keyword(text: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return false;
    }
    text.to_lowercase().contains(&keyword.to_lowercase())
}
