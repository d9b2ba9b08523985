use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ladder_tracker::analysis::{create_generator, AnalysisCache, TextGenerator};
use ladder_tracker::api::state::AppState;
use ladder_tracker::config::AppConfig;
use ladder_tracker::fetch::FetchClient;
use ladder_tracker::models::Region;
use ladder_tracker::parse_duration;
use ladder_tracker::rank;
use ladder_tracker::seed::seed_region;
use ladder_tracker::storage::LeaderboardStore;
use ladder_tracker::sync::riot::{LadderSource, RiotLadderSource};
use ladder_tracker::sync::RefreshOrchestrator;

#[derive(Parser)]
#[command(name = "ladder-tracker")]
#[command(about = "Ranked ladder tracker with AI-powered match analysis")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error; overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides the config file)
        #[arg(long)]
        port: Option<u16>,

        /// Also run the periodic ladder refresh in the background
        #[arg(long)]
        refresh: bool,
    },

    /// Refresh regional ladders from the upstream API
    Refresh {
        /// Run one refresh pass and exit
        #[arg(long)]
        once: bool,

        /// Run continuously at the configured interval
        #[arg(long)]
        watch: bool,

        /// Override the refresh interval (e.g., "1h", "30m")
        #[arg(long)]
        interval: Option<String>,

        /// Refresh only these regions (repeatable; overrides the config file)
        #[arg(long = "region")]
        regions: Vec<String>,
    },

    /// Fill a region with synthetic ladder rows for local development
    Seed {
        /// Region to seed
        #[arg(long, default_value = "euw")]
        region: String,

        /// Number of synthetic players
        #[arg(long, default_value = "100")]
        players: usize,
    },

    /// Drop all stored rows for a region
    Reset {
        /// Region to reset
        #[arg(long)]
        region: String,
    },

    /// Rewrite a region's journal keeping only the latest row per player
    Compact {
        /// Region to compact
        #[arg(long)]
        region: String,
    },

    /// Average rank labels (e.g., "GOLD II") and print the result
    Average {
        /// Labels to average
        labels: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = PathBuf::from(&cli.config);
    let mut config = if config_path.exists() {
        AppConfig::from_file(&config_path)?
    } else {
        AppConfig::default()
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting ladder-tracker v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve {
            host,
            port,
            refresh,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let storage = config.storage_config();
            let store = LeaderboardStore::new(storage.clone());

            let client = FetchClient::new(config.fetch_config())?;
            let source: Arc<dyn LadderSource> = Arc::new(RiotLadderSource::new(client));
            let orchestrator = Arc::new(RefreshOrchestrator::new(
                config.refresh_config(),
                source,
                store.clone(),
            ));

            if refresh {
                tokio::spawn(Arc::clone(&orchestrator).run_periodic());
            }

            let generator: Arc<dyn TextGenerator> =
                create_generator(&config.analysis.generator).into();
            let cache = AnalysisCache::new(storage.clone(), config.analysis.version.clone());

            let state = AppState {
                storage: Arc::new(storage),
                store,
                orchestrator,
                cache: Arc::new(cache),
                generator,
            };

            let app = ladder_tracker::api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Refresh {
            once,
            watch,
            interval,
            regions,
        } => {
            let mut refresh_config = config.refresh_config();
            if let Some(ref raw) = interval {
                match parse_duration(raw) {
                    Some(d) => refresh_config.interval = d,
                    None => {
                        eprintln!("Invalid --interval (expected e.g. \"1h\", \"30m\"): {}", raw);
                        return Ok(());
                    }
                }
            }
            if !regions.is_empty() {
                refresh_config.regions = regions
                    .iter()
                    .map(|r| r.parse())
                    .collect::<Result<Vec<Region>, _>>()?;
            }

            let store = LeaderboardStore::new(config.storage_config());
            let client = FetchClient::new(config.fetch_config())?;
            let source: Arc<dyn LadderSource> = Arc::new(RiotLadderSource::new(client));
            let orchestrator = RefreshOrchestrator::new(refresh_config, source, store);

            if once {
                tracing::info!("Running one-time ladder refresh...");
                match orchestrator.sync_once().await {
                    Ok(result) => {
                        println!("\n=== Refresh Results ===");
                        println!("Regions done:     {}", result.regions_done);
                        println!("Players upserted: {}", result.players_upserted);
                        println!("Players skipped:  {}", result.players_skipped);
                        println!("Rate limit hits:  {}", result.rate_limited_hits);
                        println!("Duration:         {:?}", result.duration);
                        if !result.errors.is_empty() {
                            println!("\nErrors:");
                            for err in &result.errors {
                                println!("  - {}", err);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Refresh failed: {}", e);
                    }
                }
            } else if watch {
                Arc::new(orchestrator).run_periodic().await;
            } else {
                eprintln!("Specify --once or --watch");
            }
        }
        Commands::Seed { region, players } => {
            let region: Region = region.parse()?;
            let store = LeaderboardStore::new(config.storage_config());
            let written = seed_region(&store, region, players)?;
            let total = store.count(region)?;
            println!(
                "Seeded {} synthetic players into {} ({} total)",
                written,
                region.as_str(),
                total
            );
        }
        Commands::Reset { region } => {
            let region: Region = region.parse()?;
            let store = LeaderboardStore::new(config.storage_config());
            let dropped = store.reset(region)?;
            println!("Dropped {} rows from {}", dropped, region.as_str());
        }
        Commands::Compact { region } => {
            let region: Region = region.parse()?;
            let store = LeaderboardStore::new(config.storage_config());
            let live = store.compact(region)?;
            println!("Compacted {}: {} live rows kept", region.as_str(), live);
        }
        Commands::Average { labels } => {
            if labels.is_empty() {
                eprintln!("Provide at least one rank label, e.g. \"GOLD II\"");
                return Ok(());
            }
            let wrapped: Vec<Option<String>> = labels.into_iter().map(Some).collect();
            println!("{}", rank::average_rank(&wrapped));
        }
    }

    Ok(())
}
