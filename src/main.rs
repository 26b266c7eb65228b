//! musefed CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use museum_federation::{
    commands::{
        cmd_get, cmd_load, cmd_search, cmd_status, cmd_validate_images, print_artwork,
        print_load_stats, print_search_results, print_status, print_validation_report,
        resolve_targets, LoadOptions, ValidateOptions,
    },
    config::Config,
    error::Result,
    federation::CollectionFederator,
    models::SearchOptions,
    progress::{CheckProgress, LogWriterFactory},
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "musefed")]
#[command(version, about = "Federated search over museum open-data dumps", long_about = None)]
struct Cli {
    /// Path to config file (defaults to ./musefed.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild a museum's SQLite store from its open-data dump
    Load {
        /// Museum id (aic, cleveland, nga) or 'all'
        target: String,

        /// Dump location, overriding the configured one
        #[arg(long)]
        source: Option<PathBuf>,

        /// Records committed per transaction
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Search every loaded museum at once
    Search {
        /// Free-text query over titles and descriptions
        query: Option<String>,

        /// Only search these museums
        #[arg(long = "museum")]
        museums: Vec<String>,

        /// Artist name words
        #[arg(long)]
        artist: Option<String>,

        /// Object type or style
        #[arg(long = "genre")]
        genres: Vec<String>,

        /// Medium, e.g. "oil"
        #[arg(long = "medium")]
        mediums: Vec<String>,

        /// Classification text
        #[arg(long = "classification")]
        classifications: Vec<String>,

        /// Earliest year the work may overlap
        #[arg(long = "from", allow_hyphen_values = true)]
        date_start: Option<i32>,

        /// Latest year the work may overlap
        #[arg(long = "to", allow_hyphen_values = true)]
        date_end: Option<i32>,

        /// Only public-domain works
        #[arg(long)]
        public_domain: bool,

        /// Include works with no image
        #[arg(long)]
        include_without_image: bool,

        /// Zero-based page number
        #[arg(long)]
        page: Option<u32>,

        /// Results per museum
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Fetch one artwork by global id, e.g. nga:46451
    Get {
        global_id: String,
    },

    /// Check that stored image URLs still respond
    ValidateImages {
        /// Only check these museums
        #[arg(long = "museum")]
        museums: Vec<String>,

        /// Image URLs taken from each store
        #[arg(long)]
        sample: Option<usize>,

        /// Requests in flight per chunk
        #[arg(long)]
        concurrency: Option<usize>,

        /// Pause between chunks in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Per-request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Suggest full-size IIIF URLs for images the server refuses
        #[arg(long)]
        repair: bool,
    },

    /// Show store locations and row counts
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory))
        .with(filter)
        .init();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "musefed", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Load {
            target,
            source,
            batch_size,
        } => {
            let targets = resolve_targets(&config, &target)?;
            let stats = cmd_load(&config, &targets, LoadOptions { source, batch_size }).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_load_stats(&stats);
            }
        }

        Commands::Search {
            query,
            museums,
            artist,
            genres,
            mediums,
            classifications,
            date_start,
            date_end,
            public_domain,
            include_without_image,
            page,
            limit,
        } => {
            let federator = CollectionFederator::open_configured(&config).await?;
            let options = SearchOptions {
                query,
                artist,
                museums,
                genres,
                mediums,
                classifications,
                date_start,
                date_end,
                public_domain_only: public_domain,
                has_image_only: Some(!include_without_image),
                page,
                limit,
            };

            let report = cmd_search(&config, &federator, options).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_search_results(&report);
            }
        }

        Commands::Get { global_id } => {
            let federator = CollectionFederator::open_configured(&config).await?;
            let artwork = cmd_get(&federator, &global_id).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&artwork)?);
            } else {
                print_artwork(&global_id, artwork.as_ref());
            }
        }

        Commands::ValidateImages {
            museums,
            sample,
            concurrency,
            delay_ms,
            timeout_ms,
            repair,
        } => {
            let federator = CollectionFederator::open_configured(&config).await?;
            let options = ValidateOptions {
                museums,
                sample,
                concurrency,
                delay_ms,
                timeout_ms,
                repair,
            };

            let progress = CheckProgress::new("images");
            let report = cmd_validate_images(&config, &federator, options, |checked, total| {
                progress.update(checked, total)
            })
            .await?;
            progress.finish(&format!("{} broken", report.broken.len()));

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_validation_report(&report);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}
