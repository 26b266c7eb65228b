//! Load command implementation

use crate::adapters::AdapterKind;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::etl::LoadStats;
use std::path::PathBuf;
use tracing::info;

/// Load options
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Override the dump location (single target only)
    pub source: Option<PathBuf>,
    /// Override `etl.batch_size`
    pub batch_size: Option<usize>,
}

/// Resolve a `load` target: an adapter id or alias, or `all` for every
/// enabled adapter
pub fn resolve_targets(config: &Config, target: &str) -> Result<Vec<AdapterKind>> {
    if target.trim().eq_ignore_ascii_case("all") {
        let enabled = config.enabled_adapters();
        if enabled.is_empty() {
            return Err(Error::Config(
                "No museums are enabled in [museums]".to_string(),
            ));
        }
        return Ok(enabled);
    }
    Ok(vec![target.parse()?])
}

/// Rebuild the stores for `targets` one after another
pub async fn cmd_load(
    config: &Config,
    targets: &[AdapterKind],
    options: LoadOptions,
) -> Result<Vec<LoadStats>> {
    if options.source.is_some() && targets.len() > 1 {
        return Err(Error::Config(
            "--source can only be used when loading a single museum".to_string(),
        ));
    }

    let batch_size = options.batch_size.unwrap_or(config.etl.batch_size);
    if batch_size == 0 {
        return Err(Error::Config("Batch size must be positive".to_string()));
    }

    let mut all_stats = Vec::with_capacity(targets.len());
    for kind in targets {
        let source = options
            .source
            .clone()
            .unwrap_or_else(|| config.source_path(*kind));
        let db_path = config.db_path(*kind);
        info!(adapter = %kind, source = %source.display(), db = %db_path.display(), "Loading");

        let stats = kind.load(&source, &db_path, batch_size).await?;
        all_stats.push(stats);
    }

    Ok(all_stats)
}

/// Print load statistics
pub fn print_load_stats(all_stats: &[LoadStats]) {
    println!("\n📥 Load Complete\n");

    for stats in all_stats {
        println!("• {}", stats.adapter_id);
        println!("  Store: {}", stats.db_path);
        println!("  Inserted: {}", stats.inserted);
        println!("  Skipped: {}", stats.skipped);
        println!("  Child rows: {}", stats.child_rows);
        println!("  Batches: {}", stats.batches);
        println!("  Elapsed: {:.2}s", stats.elapsed().as_secs_f64());
        println!("  Fingerprint: {}", stats.source_fingerprint);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.data_dir = tmp.path().to_path_buf();
        for kind in AdapterKind::ALL {
            let museum = config.museums.get_mut(kind);
            museum.db_path = Some(tmp.path().join(format!("{}.sqlite", kind.id())));
            museum.source_path = Some(tmp.path().join(format!("{}-dump", kind.id())));
        }
        config
    }

    #[test]
    fn test_resolve_targets() {
        let mut config = Config::default();
        assert_eq!(
            resolve_targets(&config, "cma").unwrap(),
            vec![AdapterKind::Cleveland]
        );
        assert_eq!(resolve_targets(&config, "ALL").unwrap(), AdapterKind::ALL.to_vec());

        config.museums.aic.enabled = false;
        assert_eq!(
            resolve_targets(&config, "all").unwrap(),
            vec![AdapterKind::Cleveland, AdapterKind::Nga]
        );
        assert!(matches!(
            resolve_targets(&config, "louvre"),
            Err(Error::UnknownAdapter(_))
        ));
    }

    #[tokio::test]
    async fn test_load_uses_source_override_and_batch_size() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let source = tmp.path().join("elsewhere.json");
        std::fs::write(
            &source,
            r#"[
                {"id": 1, "title": "One", "images": {"web": {"url": "https://example.org/1.jpg"}}},
                {"id": 2, "title": "Two"},
                {"id": 3, "title": "Three"}
            ]"#,
        )
        .unwrap();

        let stats = cmd_load(
            &config,
            &[AdapterKind::Cleveland],
            LoadOptions {
                source: Some(source),
                batch_size: Some(2),
            },
        )
        .await
        .unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].inserted, 3);
        assert_eq!(stats[0].batches, 2);
        assert!(config.db_path(AdapterKind::Cleveland).exists());
    }

    #[tokio::test]
    async fn test_load_missing_dump_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);

        let err = cmd_load(&config, &[AdapterKind::Nga], LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceMissing(_)));
    }

    #[tokio::test]
    async fn test_source_override_needs_single_target() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let options = LoadOptions {
            source: Some(tmp.path().join("dump")),
            batch_size: None,
        };

        let err = cmd_load(&config, &AdapterKind::ALL, options).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
