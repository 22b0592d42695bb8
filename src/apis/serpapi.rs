use crate::app::ports::HttpClientPort;
use crate::config::Config;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Citation counts from the SerpAPI Google Scholar engine.
///
/// This is a best-effort lookup: the DOI is sent as a free-text query and the
/// first organic result is trusted without checking that it is the same
/// publication. Every failure path resolves to a count of 0.
pub struct CitationLookup {
    http: Arc<dyn HttpClientPort>,
    api_url: String,
    engine: String,
    api_key: Option<String>,
}

impl CitationLookup {
    pub fn new(http: Arc<dyn HttpClientPort>, config: &Config) -> Self {
        Self {
            http,
            api_url: config.citations.api_url.clone(),
            engine: config.citations.engine.clone(),
            api_key: config.api_keys.citation_lookup.clone(),
        }
    }

    /// Number of citations for `doi`, or 0 when it cannot be resolved.
    ///
    /// An empty identifier, or a lookup without an API key, makes no request.
    #[instrument(skip(self))]
    pub async fn get_citation_count(&self, doi: &str) -> u64 {
        let doi = doi.trim();
        if doi.is_empty() {
            return 0;
        }
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No citation API key, skipping lookup");
            return 0;
        };

        let url = match Url::parse_with_params(
            &self.api_url,
            &[("engine", self.engine.as_str()), ("q", doi), ("api_key", api_key)],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!("Invalid citation API URL: {}", e);
                return 0;
            }
        };

        match self.http.get(url.as_str()).await {
            Ok(resp) if resp.is_success() => {
                let count = citation_count_from_payload(&resp.bytes);
                debug!(count, "Citation lookup complete");
                count
            }
            Ok(resp) => {
                warn!(status = resp.status, "Citation lookup failed");
                0
            }
            Err(e) => {
                warn!("Citation lookup failed: {}", e);
                0
            }
        }
    }
}

/// Read `organic_results[0].inline_links.cited_by.total` from a search response.
pub fn citation_count_from_payload(bytes: &[u8]) -> u64 {
    let Ok(payload) = serde_json::from_slice::<Value>(bytes) else {
        return 0;
    };
    payload
        .get("organic_results")
        .and_then(|results| results.get(0))
        .and_then(|first| first.pointer("/inline_links/cited_by/total"))
        .and_then(|total| match total {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(0)
}
