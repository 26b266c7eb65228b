//! Status command implementation

use crate::adapters::{AdapterKind, StoreStats};
use crate::config::Config;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Store state for one museum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuseumStatus {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub source_path: String,
    pub source_exists: bool,
    pub db_path: String,
    pub store_exists: bool,
    pub stats: Option<StoreStats>,
    pub error: Option<String>,
}

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: Option<String>,
    pub data_dir: String,
    pub museums: Vec<MuseumStatus>,
}

/// Get per-museum store status. Unreadable stores are reported, not fatal.
pub async fn cmd_status(config: &Config) -> Result<StatusInfo> {
    info!("Getting status");

    let mut museums = Vec::with_capacity(AdapterKind::ALL.len());
    for kind in AdapterKind::ALL {
        let db_path = config.db_path(kind);
        let source_path = config.source_path(kind);
        let store_exists = db_path.is_file();

        let (stats, error) = if store_exists {
            match kind.open(&db_path).await {
                Ok(adapter) => match adapter.stats().await {
                    Ok(stats) => (Some(stats), None),
                    Err(e) => {
                        debug!(adapter = %kind, "Stats error: {:?}", e);
                        (None, Some(e.to_string()))
                    }
                },
                Err(e) => {
                    debug!(adapter = %kind, "Open error: {:?}", e);
                    (None, Some(e.to_string()))
                }
            }
        } else {
            (None, None)
        };

        museums.push(MuseumStatus {
            id: kind.id().to_string(),
            name: kind.display_name().to_string(),
            enabled: config.museums.get(kind).enabled,
            source_path: source_path.display().to_string(),
            source_exists: source_path.exists(),
            db_path: db_path.display().to_string(),
            store_exists,
            stats,
            error,
        });
    }

    Ok(StatusInfo {
        config_path: config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string()),
        data_dir: config.data_dir.display().to_string(),
        museums,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 musefed Status\n");
    println!(
        "Configuration: {}",
        status.config_path.as_deref().unwrap_or("(defaults)")
    );
    println!("Data directory: {}", status.data_dir);

    for museum in &status.museums {
        println!("\n{} [{}]", museum.name, museum.id);
        if !museum.enabled {
            println!("  Disabled in [museums.{}]", museum.id);
        }

        let source_status = if museum.source_exists { "✓" } else { "✗" };
        println!("  Source: {} {}", source_status, museum.source_path);

        let store_status = match (&museum.stats, &museum.error) {
            (Some(_), _) => "✓ Loaded".to_string(),
            (None, Some(error)) => format!("✗ Unreadable ({})", error),
            (None, None) => format!("⚠ Not loaded (run 'musefed load {}')", museum.id),
        };
        println!("  Store: {}", museum.db_path);
        println!("  Status: {}", store_status);

        if let Some(stats) = &museum.stats {
            println!("  Artworks: {}", stats.artworks);
            println!("  With image: {}", stats.with_image);
            println!("  Public domain: {}", stats.public_domain);
            println!("  Child rows: {}", stats.child_rows);
        }
    }
}
