//! Search command implementation

use crate::config::Config;
use crate::federation::CollectionFederator;
use crate::models::{ArtworkResult, SearchOptions};
use serde::Serialize;
use tracing::{debug, info};

/// Search result for CLI display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub query: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub adapters: Vec<String>,
    pub results: Vec<ArtworkResult>,
}

/// Apply the configured default page size and cap it at `search.max_limit`
pub fn effective_limit(config: &Config, requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(config.search.default_limit)
        .clamp(1, config.search.max_limit.max(1))
}

/// Execute a federated search
pub async fn cmd_search(
    config: &Config,
    federator: &CollectionFederator,
    mut options: SearchOptions,
) -> SearchReport {
    let limit = effective_limit(config, options.limit);
    if options.limit.is_some_and(|requested| requested != limit) {
        debug!(requested = ?options.limit, limit, "Search limit adjusted");
    }
    options.limit = Some(limit);

    let adapters: Vec<String> = federator
        .select(&options.museums)
        .iter()
        .map(|a| a.id().to_string())
        .collect();
    info!(query = ?options.query_text(), adapters = ?adapters, "Searching");

    let results = federator.search(&options).await;

    SearchReport {
        query: options.query_text().map(str::to_string),
        page: options.page(),
        limit,
        adapters,
        results,
    }
}

/// One-line artist summary for listings
pub(crate) fn artist_line(result: &ArtworkResult) -> String {
    let names: Vec<&str> = result.artists.iter().map(|a| a.name.as_str()).collect();
    names.join(", ")
}

/// Print search results to console
pub fn print_search_results(report: &SearchReport) {
    println!(
        "\n🔍 Search: {}\n",
        report.query.as_deref().unwrap_or("(all works)")
    );
    println!(
        "Searched: {}",
        if report.adapters.is_empty() {
            "no museums".to_string()
        } else {
            report.adapters.join(", ")
        }
    );
    println!(
        "Page {} (up to {} per museum), {} results:\n",
        report.page,
        report.limit,
        report.results.len()
    );

    for (i, r) in report.results.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, r.global_id, r.title);

        let artists = artist_line(r);
        if !artists.is_empty() {
            println!("   Artist: {}", artists);
        }
        if let Some(date) = &r.date_display {
            println!("   Date: {}", date);
        }
        if let Some(medium) = &r.medium_display {
            println!("   Medium: {}", medium);
        }
        if r.has_image() {
            println!("   Image: {}", r.image_url);
        }
        println!();
    }

    if report.results.is_empty() {
        println!("No artworks matched. Run 'musefed status' to check which stores are loaded.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AdapterKind;
    use tempfile::TempDir;

    #[test]
    fn test_effective_limit() {
        let config = Config::default();
        assert_eq!(effective_limit(&config, None), 25);
        assert_eq!(effective_limit(&config, Some(10)), 10);
        assert_eq!(effective_limit(&config, Some(5_000)), 100);
        assert_eq!(effective_limit(&config, Some(0)), 1);
    }

    #[tokio::test]
    async fn test_search_against_loaded_store() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("data.json");
        std::fs::write(
            &source,
            r#"[
                {"id": 10, "title": "Harbor at Dawn", "creators": [{"description": "Jane Doe (American, 1901-1980)"}],
                 "images": {"web": {"url": "https://example.org/10.jpg"}}},
                {"id": 11, "title": "Harbor at Dusk", "images": {"full": {"url": "https://example.org/11.tif"}}},
                {"id": 12, "title": "Harbor Sketch"}
            ]"#,
        )
        .unwrap();
        let db_path = tmp.path().join("cleveland.sqlite");
        AdapterKind::Cleveland.load(&source, &db_path, 100).await.unwrap();

        let mut federator = CollectionFederator::new();
        federator.register(AdapterKind::Cleveland.open(&db_path).await.unwrap());

        let report = cmd_search(
            &Config::default(),
            &federator,
            SearchOptions {
                query: Some(" harbor ".to_string()),
                limit: Some(500),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(report.query.as_deref(), Some("harbor"));
        assert_eq!(report.limit, 100);
        assert_eq!(report.adapters, vec!["cleveland"]);
        let ids: Vec<&str> = report.results.iter().map(|r| r.global_id.as_str()).collect();
        assert_eq!(ids, vec!["cleveland:10", "cleveland:11"]);
        assert_eq!(artist_line(&report.results[0]), "Jane Doe");
    }

    #[tokio::test]
    async fn test_unknown_museum_searches_nothing() {
        let report = cmd_search(
            &Config::default(),
            &CollectionFederator::new(),
            SearchOptions {
                museums: vec!["louvre".to_string()],
                ..Default::default()
            },
        )
        .await;

        assert!(report.adapters.is_empty());
        assert!(report.results.is_empty());
        assert_eq!(report.limit, 25);
    }
}
