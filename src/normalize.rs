//! Text cleanup shared by the HTML and JSON extractors.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse runs of whitespace (including newlines from markup) and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Country of an affiliation address: whatever follows the last comma.
///
/// An address without a comma is taken whole.
pub fn country_from_affiliation(affiliation: &str) -> String {
    affiliation
        .rsplit(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Countries for a list of affiliations, deduplicated in first-seen order.
/// Empty countries are dropped.
pub fn countries_from_affiliations<S: AsRef<str>>(affiliations: &[S]) -> Vec<String> {
    let mut countries: Vec<String> = Vec::new();
    for affiliation in affiliations {
        let country = country_from_affiliation(affiliation.as_ref());
        if !country.is_empty() && !countries.contains(&country) {
            countries.push(country);
        }
    }
    countries
}

/// Page range text without its "Pages" label, e.g. "Pages 3-17" -> "3-17".
pub fn strip_pages_label(text: &str) -> String {
    let cleaned = clean_text(text);
    cleaned
        .strip_prefix("Pages")
        .unwrap_or(&cleaned)
        .trim()
        .to_string()
}

/// DOI embedded in a chapter link, e.g. "/chapter/10.1007/978-3-030-50578-3_1".
pub fn doi_from_chapter_href(href: &str) -> String {
    let path = href
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    match path.find("/chapter/") {
        Some(idx) => path[idx + "/chapter/".len()..].trim_matches('/').to_string(),
        None => String::new(),
    }
}
