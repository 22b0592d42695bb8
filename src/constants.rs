/// Source name constants used by the CLI, config and log output.

// User-friendly pipeline names (used in CLI)
pub const CONFERENCE_PIPELINE: &str = "conference";
pub const JOURNAL_PIPELINE: &str = "journal";

// Venue tags written into every row of the matching pipeline
pub const CONFERENCE_VENUE: &str = "ICWE";
pub const JOURNAL_VENUE: &str = "JWE";

// Conference series on Springer Link
pub const CONFERENCE_SERIES_URL: &str = "https://link.springer.com/conference/icwe";
pub const CONFERENCE_BASE_URL: &str = "https://link.springer.com";

// IEEE Xplore article search
pub const JOURNAL_API_URL: &str = "https://ieeexploreapi.ieee.org/api/v1/search/articles";
pub const JOURNAL_TITLE: &str = "Journal of Web Engineering";
pub const JOURNAL_ISSN: &str = "1544-5976";

// SerpAPI Google Scholar search, used for citation counts
pub const CITATION_API_URL: &str = "https://serpapi.com/search.json";
pub const CITATION_ENGINE: &str = "google_scholar";

// Environment variables holding API keys
pub const CITATION_API_KEY_ENV: &str = "SERP_API_KEY";
pub const JOURNAL_API_KEY_ENV: &str = "IEEE_API_KEY";

pub const DEFAULT_CONFIG_PATH: &str = "pubscrape.toml";
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{venue}_scraped_data_{run_id}.csv";

/// Separator used when a list of values is flattened into one CSV cell
pub const LIST_SEPARATOR: &str = " | ";

pub const CONFERENCE_HEADER: &[&str] = &[
    "Venue",
    "Year",
    "Title",
    "Author",
    "Affiliation",
    "Country",
    "Name of Track/Workshop",
    "Keywords",
    "Citation count",
    "URL",
    "Page number",
    "Abstract",
];

pub const JOURNAL_HEADER: &[&str] = &[
    "Venue",
    "Year",
    "Title",
    "Author",
    "Affiliation",
    "Country",
    "Author Keywords",
    "IEEE Keywords",
    "Volume Number",
    "Issue",
    "Issue Identifier",
    "Citation count",
    "URL",
    "Page number",
    "Abstract",
];

/// Get all supported pipeline names
pub fn get_supported_pipelines() -> Vec<&'static str> {
    vec![CONFERENCE_PIPELINE, JOURNAL_PIPELINE]
}
