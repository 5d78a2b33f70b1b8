use regex::Regex;
use std::sync::OnceLock;

/// Pulls the profile token out of URLs shaped like `.../name/nm0000123/...`.
pub struct IdentifierExtractor;

impl IdentifierExtractor {
    fn pattern() -> &'static Regex {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        PATTERN.get_or_init(|| Regex::new(r"/name/([A-Za-z]+[0-9]+)/").unwrap())
    }

    /// Returns the token between `/name/` and the next `/`, when it is a
    /// letter prefix followed by digits. Absence is the normal outcome for
    /// empty or unrelated input.
    pub fn extract(source_url: &str) -> Option<&str> {
        Self::pattern()
            .captures(source_url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn extract_opt(source_url: Option<&str>) -> Option<&str> {
        source_url.and_then(Self::extract)
    }
}
