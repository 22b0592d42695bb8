use crate::error::Result;
use async_trait::async_trait;

// Fetch-side port; the reqwest adapter lives in infra::http_client
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    /// Issue a GET. Non-success statuses are returned, not turned into errors;
    /// `Err` means the request never produced a response.
    async fn get(&self, url: &str) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
