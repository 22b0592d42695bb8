use crate::apis::serpapi::CitationLookup;
use crate::app::ports::HttpClientPort;
use crate::config::Config;
use crate::constants::JOURNAL_HEADER;
use crate::error::{Result, ScraperError};
use crate::ingest::fetch_checked;
use crate::normalize::{clean_text, countries_from_affiliations};
use crate::types::{PublicationRecord, PublicationSource, RecordExtras, WorkUnit};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// IEEE Xplore search response; only the fields we map are declared.
///
/// Articles stay as raw values so one malformed article does not sink the
/// rest of the year.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub articles: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Article {
    pub publication_year: Option<Scalar>,
    pub title: Option<String>,
    pub authors: Option<Authors>,
    pub index_terms: Option<IndexTerms>,
    pub html_url: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    pub volume: Option<Scalar>,
    pub issue: Option<Scalar>,
    pub is_number: Option<Scalar>,
    pub start_page: Option<Scalar>,
    pub end_page: Option<Scalar>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Authors {
    #[serde(default)]
    pub authors: Vec<Author>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Author {
    pub full_name: Option<String>,
    pub affiliation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IndexTerms {
    pub author_terms: Option<Terms>,
    pub ieee_terms: Option<Terms>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Terms {
    #[serde(default)]
    pub terms: Vec<String>,
}

/// Fields the API sends either as strings or as numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{}", s.trim()),
            Scalar::Number(n) => write!(f, "{}", n),
        }
    }
}

fn scalar_string(value: &Option<Scalar>) -> String {
    value.as_ref().map(Scalar::to_string).unwrap_or_default()
}

fn terms(terms: Option<&Terms>) -> Vec<String> {
    terms
        .map(|t| t.terms.iter().map(|s| clean_text(s)).collect())
        .unwrap_or_default()
}

impl Article {
    /// Map to a record with a zero citation count; enrichment happens later.
    pub fn to_record(&self, venue: &str) -> PublicationRecord {
        let authors = self
            .authors
            .as_ref()
            .map(|a| a.authors.as_slice())
            .unwrap_or_default();
        let author_names: Vec<String> = authors
            .iter()
            .map(|a| clean_text(a.full_name.as_deref().unwrap_or_default()))
            .collect();
        let affiliations: Vec<String> = authors
            .iter()
            .map(|a| clean_text(a.affiliation.as_deref().unwrap_or_default()))
            .collect();
        let countries = countries_from_affiliations(&affiliations);

        let index_terms = self.index_terms.as_ref();

        PublicationRecord {
            venue: venue.to_string(),
            year: scalar_string(&self.publication_year),
            title: clean_text(self.title.as_deref().unwrap_or_default()),
            authors: author_names,
            affiliations,
            countries,
            citation_count: 0,
            url: self.html_url.clone().unwrap_or_default(),
            page_numbers: format!(
                "{}-{}",
                scalar_string(&self.start_page),
                scalar_string(&self.end_page)
            ),
            abstract_text: self.abstract_text.clone().unwrap_or_default(),
            doi: self.doi.as_deref().unwrap_or_default().trim().to_string(),
            extras: RecordExtras::Journal {
                author_keywords: terms(index_terms.and_then(|t| t.author_terms.as_ref())),
                index_keywords: terms(index_terms.and_then(|t| t.ieee_terms.as_ref())),
                volume: scalar_string(&self.volume),
                issue: scalar_string(&self.issue),
                issue_identifier: scalar_string(&self.is_number),
            },
        }
    }
}

/// Parse a search payload into records (citation counts not yet resolved).
pub fn parse_articles(bytes: &[u8], venue: &str) -> Result<Vec<PublicationRecord>> {
    let response: SearchResponse = serde_json::from_slice(bytes)?;
    let mut records = Vec::with_capacity(response.articles.len());
    for (index, raw) in response.articles.into_iter().enumerate() {
        match serde_json::from_value::<Article>(raw) {
            Ok(article) => records.push(article.to_record(venue)),
            Err(e) => warn!(index, "Skipping malformed article: {}", e),
        }
    }
    Ok(records)
}

/// Journal pipeline over the IEEE Xplore article search API.
pub struct IeeeJournalCrawler {
    http: Arc<dyn HttpClientPort>,
    citations: CitationLookup,
    venue: String,
    api_url: String,
    publication_title: String,
    issn: String,
    api_key: Option<String>,
    target_years: Vec<String>,
    max_records: u32,
}

impl IeeeJournalCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>, config: &Config) -> Self {
        Self {
            citations: CitationLookup::new(http.clone(), config),
            http,
            venue: config.journal.venue.clone(),
            api_url: config.journal.api_url.clone(),
            publication_title: config.journal.publication_title.clone(),
            issn: config.journal.issn.clone(),
            api_key: config.api_keys.journal_api.clone(),
            target_years: config.target_years.clone(),
            max_records: config.max_records_per_query,
        }
    }

    /// Search URL for one publication year.
    pub fn query_url(&self, year: &str) -> Result<String> {
        let max_records = self.max_records.to_string();
        let mut params = vec![
            ("publication_title", self.publication_title.as_str()),
            ("issn", self.issn.as_str()),
            ("publication_year", year),
        ];
        if let Some(key) = self.api_key.as_deref() {
            params.push(("apikey", key));
        }
        params.push(("max_records", max_records.as_str()));

        let url = Url::parse_with_params(&self.api_url, &params)
            .map_err(|e| ScraperError::invalid_url(&self.api_url, e))?;
        Ok(url.to_string())
    }
}

#[async_trait::async_trait]
impl PublicationSource for IeeeJournalCrawler {
    fn venue(&self) -> &str {
        &self.venue
    }

    fn header(&self) -> &'static [&'static str] {
        JOURNAL_HEADER
    }

    async fn work_units(&self) -> Result<Vec<WorkUnit>> {
        self.target_years
            .iter()
            .map(|year| {
                Ok(WorkUnit {
                    year: year.clone(),
                    label: format!("{} {}", self.publication_title, year),
                    target: self.query_url(year)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self, unit), fields(year = %unit.year))]
    async fn collect(&self, unit: &WorkUnit) -> Result<Vec<PublicationRecord>> {
        info!("Scraping publications from Year: {}", unit.year);

        // The query URL carries the API key, so log the label instead
        let Some(resp) = fetch_checked(&*self.http, &unit.target, &unit.label).await else {
            return Ok(Vec::new());
        };
        let mut records = match parse_articles(&resp.bytes, &self.venue) {
            Ok(records) => records,
            Err(e) => {
                warn!("Unreadable search response for {}: {}", unit.label, e);
                return Ok(Vec::new());
            }
        };
        debug!(articles = records.len(), "Parsed search response");

        for record in &mut records {
            record.citation_count = self.citations.get_citation_count(&record.doi).await;
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKeys;
    use crate::infra::in_memory_http::InMemoryHttp;

    const ARTICLE_JSON: &str = r#"{
        "total_records": 2,
        "articles": [
            {
                "publication_year": 2021,
                "title": "Microservice  Smells",
                "authors": {"authors": [
                    {"full_name": "Li Wei", "affiliation": "Tsinghua University, Beijing, China"},
                    {"full_name": "Marta Rossi", "affiliation": "Politecnico di Milano, Milan, Italy"},
                    {"full_name": "Chen Bo", "affiliation": "Peking University, China"}
                ]},
                "index_terms": {
                    "author_terms": {"terms": ["microservices", "smells"]},
                    "ieee_terms": {"terms": ["Software architecture"]}
                },
                "html_url": "https://ieeexplore.ieee.org/document/1",
                "abstract": "An abstract.",
                "doi": "10.13052/jwe1540-9589.2011",
                "volume": "20",
                "issue": "1",
                "is_number": 9428921,
                "start_page": "1",
                "end_page": "24"
            },
            {
                "publication_year": "2021",
                "title": "No Extras",
                "authors": {"authors": [{"full_name": "Solo Author", "affiliation": "Lab"}]},
                "volume": "20",
                "issue": "2",
                "is_number": "9500000",
                "start_page": "25",
                "end_page": "40"
            }
        ]
    }"#;

    #[test]
    fn maps_full_article() {
        let records = parse_articles(ARTICLE_JSON.as_bytes(), "JWE").unwrap();
        assert_eq!(records.len(), 2);

        let r = &records[0];
        assert_eq!(r.venue, "JWE");
        assert_eq!(r.year, "2021");
        assert_eq!(r.title, "Microservice Smells");
        assert_eq!(r.authors, vec!["Li Wei", "Marta Rossi", "Chen Bo"]);
        assert_eq!(r.countries, vec!["China", "Italy"]);
        assert_eq!(r.page_numbers, "1-24");
        assert_eq!(r.doi, "10.13052/jwe1540-9589.2011");
        assert_eq!(
            r.extras,
            RecordExtras::Journal {
                author_keywords: vec!["microservices".into(), "smells".into()],
                index_keywords: vec!["Software architecture".into()],
                volume: "20".into(),
                issue: "1".into(),
                issue_identifier: "9428921".into(),
            }
        );
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let records = parse_articles(ARTICLE_JSON.as_bytes(), "JWE").unwrap();
        let r = &records[1];
        assert_eq!(r.url, "");
        assert_eq!(r.abstract_text, "");
        assert_eq!(r.doi, "");
        assert_eq!(r.countries, vec!["Lab"]);
        match &r.extras {
            RecordExtras::Journal {
                author_keywords,
                index_keywords,
                issue_identifier,
                ..
            } => {
                assert!(author_keywords.is_empty());
                assert!(index_keywords.is_empty());
                assert_eq!(issue_identifier, "9500000");
            }
            other => panic!("unexpected extras: {:?}", other),
        }
    }

    #[test]
    fn payload_without_articles_is_empty() {
        let records = parse_articles(br#"{"total_records": 0}"#, "JWE").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_article_is_skipped_without_losing_the_rest() {
        let payload = br#"{"articles": [
            {"title": "Good One", "publication_year": 2022},
            {"title": 42, "volume": true},
            {"title": "Good Two", "publication_year": "2022", "issue": {"n": 1}},
            {"title": "Good Three", "publication_year": 2022}
        ]}"#;
        let records = parse_articles(payload, "JWE").unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Good One", "Good Three"]);
    }

    #[test]
    fn query_url_carries_search_parameters() {
        let config = Config::default().with_api_keys(ApiKeys {
            citation_lookup: None,
            journal_api: Some("ieee-key".into()),
        });
        let crawler = IeeeJournalCrawler::new(Arc::new(InMemoryHttp::new()), &config);
        let url = Url::parse(&crawler.query_url("2020").unwrap()).unwrap();
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            params,
            vec![
                ("publication_title".into(), "Journal of Web Engineering".into()),
                ("issn".into(), "1544-5976".into()),
                ("publication_year".into(), "2020".into()),
                ("apikey".into(), "ieee-key".into()),
                ("max_records".into(), "200".into()),
            ]
        );
    }

    #[tokio::test]
    async fn work_units_follow_year_order() {
        let mut config = Config::default();
        config.target_years = vec!["2023".into(), "2019".into()];
        let crawler = IeeeJournalCrawler::new(Arc::new(InMemoryHttp::new()), &config);
        let units = crawler.work_units().await.unwrap();
        let years: Vec<&str> = units.iter().map(|u| u.year.as_str()).collect();
        assert_eq!(years, vec!["2023", "2019"]);
    }
}
