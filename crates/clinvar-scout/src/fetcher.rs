//! Light strategy: one HTTP GET, static HTML, no script execution.

use crate::config::USER_AGENT;
use crate::dom::DomSnapshot;
use crate::error::{ExtractError, ExtractResult};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Public ClinVar variation page for a numeric variation ID.
pub fn variation_url(id: u64) -> String {
    format!("https://www.ncbi.nlm.nih.gov/clinvar/variation/{id}/?oq={id}")
}

fn variation_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/variation/(\d+)").expect("variation regex is valid"))
}

/// Rewrite any URL naming `/variation/<id>` to the canonical page URL.
pub fn canonical_variation_url(url: &str) -> String {
    variation_id_pattern()
        .captures(url)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .map(variation_url)
        .unwrap_or_else(|| url.to_string())
}

/// Something that can GET a page and hand back its DOM.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> ExtractResult<DomSnapshot>;
}

/// `reqwest`-backed fetcher with a browser-like user agent.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> ExtractResult<DomSnapshot> {
        let start = Instant::now();
        let target = canonical_variation_url(url);
        tracing::info!("fetching {target}");

        let resp = self
            .client
            .get(&target)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ExtractError::HttpError(format!("request to {target} failed: {e}")))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!("failed to load {target}: status {}", status.as_u16());
            return Err(ExtractError::HttpError(format!(
                "status {} from {target}",
                status.as_u16()
            )));
        }

        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase());
        if let Some(ct) = content_type.as_deref() {
            if !ct.contains("html") && !ct.contains("xml") {
                return Err(ExtractError::ParseError(format!(
                    "expected an HTML document, got {ct}"
                )));
            }
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ExtractError::ParseError(format!("unreadable body: {e}")))?;
        if body.trim().is_empty() {
            return Err(ExtractError::ParseError("empty response body".into()));
        }

        tracing::debug!(
            "fetched {} bytes from {final_url} in {}ms",
            body.len(),
            start.elapsed().as_millis()
        );
        Ok(DomSnapshot::new(final_url, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variation_url() {
        assert_eq!(
            variation_url(12345),
            "https://www.ncbi.nlm.nih.gov/clinvar/variation/12345/?oq=12345"
        );
    }

    #[test]
    fn test_canonical_rewrites_variation_paths() {
        assert_eq!(
            canonical_variation_url("ncbi.nlm.nih.gov/clinvar/variation/17661/?new_evidence=true"),
            variation_url(17661)
        );
        assert_eq!(
            canonical_variation_url("https://www.ncbi.nlm.nih.gov/clinvar/variation/17661"),
            variation_url(17661)
        );
    }

    #[test]
    fn test_canonical_leaves_other_urls() {
        let url = "https://www.ncbi.nlm.nih.gov/clinvar/RCV000031206/";
        assert_eq!(canonical_variation_url(url), url);
    }

    #[test]
    fn test_fetcher_creation() {
        let _ = HttpFetcher::new();
    }
}
