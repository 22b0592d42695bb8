use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::error::{Result, ScraperError};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::debug;

/// Canned-response HTTP client for development/testing.
///
/// A request is answered by the first route whose pattern is a substring of
/// the URL; unmatched URLs get a 404. Every requested URL is recorded.
#[derive(Default)]
pub struct InMemoryHttp {
    routes: Vec<(String, Route)>,
    requests: Mutex<Vec<String>>,
}

enum Route {
    Respond(HttpGetResult),
    TransportError,
}

impl InMemoryHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_html(self, pattern: &str, body: &str) -> Self {
        self.with_response(pattern, 200, "text/html", body)
    }

    pub fn with_json(self, pattern: &str, body: &str) -> Self {
        self.with_response(pattern, 200, "application/json", body)
    }

    pub fn with_status(self, pattern: &str, status: u16) -> Self {
        self.with_response(pattern, status, "text/plain", "")
    }

    pub fn with_transport_error(mut self, pattern: &str) -> Self {
        self.routes.push((pattern.to_string(), Route::TransportError));
        self
    }

    pub fn with_response(mut self, pattern: &str, status: u16, content_type: &str, body: &str) -> Self {
        self.routes.push((
            pattern.to_string(),
            Route::Respond(HttpGetResult {
                status,
                bytes: body.as_bytes().to_vec(),
                content_type: content_type.to_string(),
            }),
        ));
        self
    }

    /// All URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn requests_matching(&self, pattern: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|url| url.contains(pattern))
            .collect()
    }
}

#[async_trait]
impl HttpClientPort for InMemoryHttp {
    async fn get(&self, url: &str) -> Result<HttpGetResult> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());

        let route = self
            .routes
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, route)| route);

        match route {
            Some(Route::Respond(result)) => {
                debug!(status = result.status, "Serving canned response");
                Ok(result.clone())
            }
            Some(Route::TransportError) => Err(ScraperError::Transport(format!(
                "simulated failure for {}",
                url
            ))),
            None => Ok(HttpGetResult {
                status: 404,
                bytes: Vec::new(),
                content_type: "text/plain".to_string(),
            }),
        }
    }
}
