use crate::constants::{
    CITATION_API_KEY_ENV, CITATION_API_URL, CITATION_ENGINE, CONFERENCE_BASE_URL,
    CONFERENCE_SERIES_URL, CONFERENCE_VENUE, DEFAULT_CONFIG_PATH, DEFAULT_OUTPUT_TEMPLATE,
    JOURNAL_API_KEY_ENV, JOURNAL_API_URL, JOURNAL_ISSN, JOURNAL_TITLE, JOURNAL_VENUE,
};
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Run configuration handed to each pipeline at construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Year tokens to collect, in processing order.
    pub target_years: Vec<String>,
    pub max_records_per_query: u32,
    pub max_pages_per_book: usize,
    pub output_dir: PathBuf,
    /// Output file name; `{venue}` and `{run_id}` are substituted.
    pub output_path_template: String,
    pub conference: ConferenceConfig,
    pub journal: JournalConfig,
    pub citations: CitationConfig,
    /// Never read from the config file.
    #[serde(skip)]
    pub api_keys: ApiKeys,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConferenceConfig {
    pub venue: String,
    pub series_url: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub venue: String,
    pub api_url: String,
    pub publication_title: String,
    pub issn: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CitationConfig {
    pub api_url: String,
    pub engine: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub citation_lookup: Option<String>,
    pub journal_api: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_years: ["2019", "2020", "2021", "2022", "2023"]
                .iter()
                .map(|y| y.to_string())
                .collect(),
            max_records_per_query: 200,
            max_pages_per_book: 50,
            output_dir: PathBuf::from("."),
            output_path_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            conference: ConferenceConfig::default(),
            journal: JournalConfig::default(),
            citations: CitationConfig::default(),
            api_keys: ApiKeys::default(),
        }
    }
}

impl Default for ConferenceConfig {
    fn default() -> Self {
        Self {
            venue: CONFERENCE_VENUE.to_string(),
            series_url: CONFERENCE_SERIES_URL.to_string(),
            base_url: CONFERENCE_BASE_URL.to_string(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            venue: JOURNAL_VENUE.to_string(),
            api_url: JOURNAL_API_URL.to_string(),
            publication_title: JOURNAL_TITLE.to_string(),
            issn: JOURNAL_ISSN.to_string(),
        }
    }
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            api_url: CITATION_API_URL.to_string(),
            engine: CITATION_ENGINE.to_string(),
        }
    }
}

impl ApiKeys {
    /// Read keys from the process environment. Blank values count as missing.
    pub fn from_env() -> Self {
        Self {
            citation_lookup: non_blank_env(CITATION_API_KEY_ENV),
            journal_api: non_blank_env(JOURNAL_API_KEY_ENV),
        }
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from `path`, or from `pubscrape.toml` if present.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn with_api_keys(mut self, api_keys: ApiKeys) -> Self {
        if api_keys.citation_lookup.is_none() {
            warn!(
                "{} is not set; citation counts will all be 0",
                CITATION_API_KEY_ENV
            );
        }
        if api_keys.journal_api.is_none() {
            warn!(
                "{} is not set; journal queries are sent without a key",
                JOURNAL_API_KEY_ENV
            );
        }
        self.api_keys = api_keys;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_years.is_empty() {
            return Err(ScraperError::Config("target_years must not be empty".into()));
        }
        if self.max_pages_per_book == 0 {
            return Err(ScraperError::Config(
                "max_pages_per_book must be at least 1".into(),
            ));
        }
        if self.max_records_per_query == 0 {
            return Err(ScraperError::Config(
                "max_records_per_query must be at least 1".into(),
            ));
        }
        if !self.output_path_template.contains("{run_id}") {
            return Err(ScraperError::Config(
                "output_path_template must contain {run_id}".into(),
            ));
        }
        Ok(())
    }
}
