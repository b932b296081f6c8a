//! Website health probe
//!
//! One GET request per link, classified into a [`LinkStatus`] together with
//! whatever metadata the home page exposes.

use crate::crawler::fetcher::decode_body;
use crate::crawler::parser::parse_page;
use crate::state::LinkStatus;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode};
use url::Url;

/// Outcome of probing one website
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// Classification of the probe
    pub status: LinkStatus,

    /// Target of a 3xx answer
    pub redirect_url: Option<String>,

    /// Site description, or empty
    pub description: String,

    /// Absolute icon URL, or empty
    pub icon_url: String,

    /// Absolute URLs of feeds advertised by the page
    pub discovered_feed_urls: Vec<String>,
}

impl Default for ProbeResult {
    fn default() -> Self {
        Self::with_status(LinkStatus::Pending)
    }
}

impl ProbeResult {
    /// A result carrying only a classification
    pub fn with_status(status: LinkStatus) -> Self {
        Self {
            status,
            redirect_url: None,
            description: String::new(),
            icon_url: String::new(),
            discovered_feed_urls: Vec::new(),
        }
    }
}

/// Probes a website
///
/// # Classification
///
/// | Response | Status |
/// |----------|--------|
/// | Connection error or timeout | `timeout` |
/// | 3xx | `survival`, `redirect_url` = `Location` |
/// | 200 | `survival`, metadata extracted |
/// | Any other status | `error` |
/// | 200 with unreadable body | `error` |
///
/// The client must not follow redirects (see
/// [`build_http_client`](crate::crawler::build_http_client)). No retry is
/// attempted; repeated failures are counted across scheduled runs instead.
///
/// # Arguments
///
/// * `client` - The probe HTTP client
/// * `url` - The link's current URL
pub async fn probe(client: &Client, url: &str) -> ProbeResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Probe of {} failed: {}", url, e);
            return ProbeResult::with_status(LinkStatus::Timeout);
        }
    };

    let status = response.status();

    if status.is_redirection() {
        let redirect_url = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(|location| resolve_location(response.url(), location));

        tracing::debug!("{} redirects to {:?}", url, redirect_url);
        return ProbeResult {
            redirect_url,
            ..ProbeResult::with_status(LinkStatus::Survival)
        };
    }

    if status != StatusCode::OK {
        tracing::debug!("{} answered with {}", url, status);
        return ProbeResult::with_status(LinkStatus::Error);
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Failed to read body of {}: {}", url, e);
            return ProbeResult::with_status(LinkStatus::Error);
        }
    };

    let html = decode_body(&bytes, content_type.as_deref());
    let page = parse_page(&html, &final_url);

    ProbeResult {
        status: LinkStatus::Survival,
        redirect_url: None,
        description: page.description,
        icon_url: page.icon_url,
        discovered_feed_urls: page.feed_urls,
    }
}

/// Resolves a `Location` header against the request URL
///
/// Unresolvable values are kept verbatim.
fn resolve_location(request_url: &Url, location: &str) -> String {
    request_url
        .join(location.trim())
        .map(|url| url.to_string())
        .unwrap_or_else(|_| location.to_string())
}
