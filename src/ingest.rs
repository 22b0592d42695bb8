use crate::app::ports::{HttpClientPort, HttpGetResult};
use tracing::warn;

/// GET `url` and hand back the response only if it succeeded.
///
/// Transport errors and non-success statuses are logged against `label`
/// (never the URL itself, which may carry an API key) and yield `None`.
pub async fn fetch_checked(
    http: &dyn HttpClientPort,
    url: &str,
    label: &str,
) -> Option<HttpGetResult> {
    match http.get(url).await {
        Ok(resp) if resp.is_success() => Some(resp),
        Ok(resp) => {
            warn!(target_label = label, status = resp.status, "Request failed");
            println!("   Failed to retrieve {}. Status code: {}", label, resp.status);
            None
        }
        Err(e) => {
            warn!(target_label = label, error = %e, "Request failed");
            println!("   Failed to retrieve {}: {}", label, e);
            None
        }
    }
}
