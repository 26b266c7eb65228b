//! Image URL liveness checks
//!
//! URLs are checked with HEAD requests in fixed-size chunks. Each chunk runs
//! to completion before the next starts, with a pause in between so image
//! servers are not hammered.

use crate::config::ValidatorConfig;
use crate::error::{Error, Result};
use futures::future::join_all;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Why a URL failed. `status` is set for HTTP responses, `error` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationFailure {
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: None,
            error: Some(message.into()),
        }
    }

    /// 403 from an image service, usually a size the server refuses to render
    pub fn is_forbidden(&self) -> bool {
        self.status == Some(403)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.error) {
            (Some(status), _) => write!(f, "HTTP {}", status),
            (None, Some(error)) => f.write_str(error),
            (None, None) => f.write_str("unknown failure"),
        }
    }
}

pub struct ImageValidator {
    client: Client,
    concurrency: usize,
    delay: Duration,
}

impl ImageValidator {
    pub fn new(config: &ValidatorConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Validation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            concurrency: config.concurrency.max(1),
            delay: config.delay(),
        })
    }

    /// HEAD one URL. Blank, unparsable or non-HTTP URLs fail without a request.
    pub async fn validate_image_url(&self, url: &str) -> std::result::Result<(), ValidationFailure> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ValidationFailure::error("empty URL"));
        }
        let parsed = Url::parse(trimmed)
            .map_err(|e| ValidationFailure::error(format!("invalid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationFailure::error(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        match self.client.head(parsed).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(ValidationFailure::status(response.status().as_u16())),
            Err(e) if e.is_timeout() => Err(ValidationFailure::error(format!("timed out: {}", e))),
            Err(e) => Err(ValidationFailure::error(e.to_string())),
        }
    }

    /// Check every distinct URL and return only the failures. `on_progress`
    /// receives `(checked, total)` after each chunk.
    pub async fn validate_image_urls<I, S, F>(
        &self,
        urls: I,
        mut on_progress: F,
    ) -> HashMap<String, ValidationFailure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(usize, usize),
    {
        let mut seen = HashSet::new();
        let unique: Vec<String> = urls
            .into_iter()
            .map(|u| u.as_ref().to_string())
            .filter(|u| seen.insert(u.clone()))
            .collect();
        let total = unique.len();
        info!(urls = total, concurrency = self.concurrency, "Validating image URLs");

        let mut failures = HashMap::new();
        let mut checked = 0;
        for (index, chunk) in unique.chunks(self.concurrency).enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let outcomes = join_all(chunk.iter().map(|url| self.validate_image_url(url))).await;
            for (url, outcome) in chunk.iter().zip(outcomes) {
                if let Err(failure) = outcome {
                    debug!(%url, %failure, "Image URL failed");
                    failures.insert(url.clone(), failure);
                }
            }

            checked += chunk.len();
            on_progress(checked, total);
        }

        info!(checked, failed = failures.len(), "Image validation finished");
        failures
    }
}

fn fixed_size_segment() -> Option<&'static Regex> {
    static SEGMENT: OnceLock<Option<Regex>> = OnceLock::new();
    SEGMENT
        .get_or_init(|| {
            Regex::new(
                r"/full/!?(?:\d+,\d*|,\d+|pct:[0-9.]+)/(?P<rotation>!?\d+)/(?P<quality>default|color|gray|bitonal)\.(?P<format>jpe?g|png|gif|webp)(?P<query>\?.*)?$",
            )
            .ok()
        })
        .as_ref()
}

/// Rewrite a fixed-size IIIF rendition to the full-size one. Some image
/// servers answer 403 for sizes they do not pre-render but serve `full`.
/// `None` when the URL has no fixed-size segment.
pub fn repair_iiif_url(url: &str) -> Option<String> {
    let re = fixed_size_segment()?;
    if !re.is_match(url) {
        return None;
    }
    Some(
        re.replace(url, "/full/full/${rotation}/${quality}.${format}${query}")
            .into_owned(),
    )
}
