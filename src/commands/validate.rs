//! Validate-images command implementation

use crate::config::Config;
use crate::error::Result;
use crate::federation::CollectionFederator;
use crate::validate::{repair_iiif_url, ImageValidator, ValidationFailure};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Validate-images options; unset fields fall back to `[validator]`
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub museums: Vec<String>,
    /// Image URLs taken from each store
    pub sample: Option<usize>,
    pub concurrency: Option<usize>,
    pub delay_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    /// Suggest full-size IIIF rewrites for 403s
    pub repair: bool,
}

/// One artwork whose primary image failed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenImage {
    pub global_id: String,
    pub url: String,
    pub failure: ValidationFailure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repaired_url: Option<String>,
}

/// Validation report
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub adapters: Vec<String>,
    pub artworks: usize,
    pub unique_urls: usize,
    pub broken: Vec<BrokenImage>,
}

/// Check the primary image of stored artworks. `on_progress` receives
/// `(checked, total)` distinct URLs.
pub async fn cmd_validate_images<F>(
    config: &Config,
    federator: &CollectionFederator,
    options: ValidateOptions,
    on_progress: F,
) -> Result<ValidationReport>
where
    F: FnMut(usize, usize),
{
    let mut validator_config = config.validator.clone();
    if let Some(concurrency) = options.concurrency {
        validator_config.concurrency = concurrency;
    }
    if let Some(delay_ms) = options.delay_ms {
        validator_config.delay_ms = delay_ms;
    }
    if let Some(timeout_ms) = options.timeout_ms {
        validator_config.timeout_ms = timeout_ms;
    }
    let validator = ImageValidator::new(&validator_config)?;

    let mut report = ValidationReport::default();
    let mut by_url: HashMap<String, Vec<String>> = HashMap::new();
    let mut urls = Vec::new();

    for adapter in federator.select(&options.museums) {
        report.adapters.push(adapter.id().to_string());
        let pairs = match adapter.image_urls(options.sample).await {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!(adapter = adapter.id(), error = %e, "Could not list image URLs, skipping");
                continue;
            }
        };
        info!(adapter = adapter.id(), urls = pairs.len(), "Collected image URLs");

        report.artworks += pairs.len();
        for (global_id, url) in pairs {
            let owners = by_url.entry(url.clone()).or_default();
            if owners.is_empty() {
                urls.push(url);
            }
            owners.push(global_id);
        }
    }
    report.unique_urls = urls.len();

    let failures = validator.validate_image_urls(&urls, on_progress).await;

    for (url, failure) in failures {
        let repaired_url = if options.repair && failure.is_forbidden() {
            repair_iiif_url(&url)
        } else {
            None
        };
        for global_id in by_url.remove(&url).unwrap_or_default() {
            report.broken.push(BrokenImage {
                global_id,
                url: url.clone(),
                failure: failure.clone(),
                repaired_url: repaired_url.clone(),
            });
        }
    }
    report.broken.sort_by(|a, b| a.global_id.cmp(&b.global_id));

    Ok(report)
}

/// Print validation report
pub fn print_validation_report(report: &ValidationReport) {
    println!("\n🔗 Image Validation\n");
    println!("Museums: {}", report.adapters.join(", "));
    println!("Artworks checked: {}", report.artworks);
    println!("Distinct URLs: {}", report.unique_urls);

    if report.broken.is_empty() {
        println!("\n✓ All image URLs responded");
        return;
    }

    println!("\n✗ {} broken images:\n", report.broken.len());
    for broken in &report.broken {
        println!("• {} [{}]", broken.global_id, broken.failure);
        println!("  {}", broken.url);
        if let Some(repaired) = &broken.repaired_url {
            println!("  ⚠ try: {}", repaired);
        }
    }
}
