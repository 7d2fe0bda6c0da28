//! Remote image fetching.
//!
//! TLS relaxation is a property of this client only; it is never applied to
//! any other outbound request in the process.

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use singlehtml_shared::{FetchConfig, Result, SingleHtmlError};

use crate::source::encode_data_uri;

/// User-Agent string for image requests.
const USER_AGENT: &str = concat!("singlehtml/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow for an image.
const MAX_REDIRECTS: usize = 5;

/// MIME label used for remote images unless the response's type is honored.
const REMOTE_MIME: &str = "image/svg+xml";

/// HTTP client that turns remote image URLs into `data:` URIs.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: Client,
    honor_content_type: bool,
}

impl RemoteFetcher {
    /// Build a fetcher from the `[fetch]` configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| SingleHtmlError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            honor_content_type: config.honor_content_type,
        })
    }

    /// Fetch `url` and encode the body as a `data:` URI.
    ///
    /// Any failure (transport, timeout, non-2xx status, body read) is a
    /// `MissingReference`.
    #[instrument(skip(self))]
    pub async fn fetch_data_uri(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SingleHtmlError::missing(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SingleHtmlError::missing(url, format!("HTTP {status}")));
        }

        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase());

        let body = response
            .bytes()
            .await
            .map_err(|e| SingleHtmlError::missing(url, format!("body read failed: {e}")))?;

        debug!(bytes = body.len(), content_type = ?declared, "fetched remote image");

        match declared {
            Some(mime) if self.honor_content_type && mime.starts_with("image/") => {
                Ok(encode_data_uri(&mime, &body, None))
            }
            _ => Ok(encode_data_uri(REMOTE_MIME, &body, Some("utf8"))),
        }
    }
}
