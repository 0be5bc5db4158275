mod config;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{fmt, EnvFilter};

use relay_core::{
    dispatch, HealthMonitor, HealthOutcome, HttpLoader, ManifestResolver, PlayableItem,
    PlaybackSink, Provider, QualityTier, RelayConfig, SessionAuth, SettingsStore, StreamRequest,
    SystemClock, TokioResolver,
};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        // Leak is fine — called once, lives for the program's lifetime.
        Box::leak(VERSION.to_string().into_boxed_str())
    } else {
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Relay stream client — resolve live-sports feeds into playable URLs.
#[derive(Parser)]
#[command(name = "lazyrelay", version = version_string(), about)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a game feed into a playable stream URL.
    Play {
        /// Game date (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,

        /// Feed media id as listed by the catalog.
        #[arg(long)]
        feed: String,

        /// Provider the feed belongs to (nhl or mlb).
        #[arg(long)]
        provider: String,

        /// Raw game state string from the catalog (e.g. "In Progress").
        #[arg(long)]
        state: String,

        /// Quality tier override (master, 540p, 720p, 720p60).
        #[arg(long)]
        quality: Option<String>,
    },
    /// Prepare a pre-packaged highlight clip for playback.
    Highlight {
        /// Direct highlight playback URL.
        url: String,
    },
    /// Verify the relay's DNS aliasing (runs at most once per interval).
    CheckDns {
        /// Re-check even if the interval has not elapsed.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

/// Host-facing sink: prints the resolved item as JSON for the embedding
/// player to consume.
struct ConsoleSink;

impl PlaybackSink for ConsoleSink {
    fn deliver(&self, item: PlayableItem) {
        match serde_json::to_string_pretty(&item) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "Cannot serialize playable item"),
        }
    }
}

fn fail_dialog(message: &str) -> ! {
    eprintln!("{}", style(message).red().bold());
    std::process::exit(1);
}

fn load_config(path: Option<&PathBuf>) -> RelayConfig {
    let app_config = match path {
        Some(path) => match config::AppConfig::load(path) {
            Ok(c) => {
                tracing::info!(path = %path.display(), "Loaded config file");
                c
            }
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => config::AppConfig::default(),
    };

    match app_config.to_relay_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn state_file(path: Option<&PathBuf>) -> PathBuf {
    path.and_then(|p| config::AppConfig::load(p).ok())
        .map(|c| c.health.state_file)
        .unwrap_or_else(|| config::HealthSection::default().state_file)
}

fn build_resolver(config: &RelayConfig) -> ManifestResolver {
    let loader = Arc::new(HttpLoader::from_config(config));
    // Fresh per process: tokens live for a single playback session.
    let auth = SessionAuth::generate(&config.user_agent);
    ManifestResolver::new(config.clone(), loader, auth)
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    match cli.command {
        Commands::Play {
            date,
            feed,
            provider,
            state,
            quality,
        } => {
            let provider: Provider = match provider.parse() {
                Ok(p) => p,
                Err(e) => fail_dialog(&format!("{e}")),
            };
            let config = match quality {
                Some(key) => match key.parse::<QualityTier>() {
                    Ok(tier) => config.with_quality(tier),
                    Err(e) => fail_dialog(&format!("{e}")),
                },
                None => config,
            };

            let resolver = build_resolver(&config);
            let request = StreamRequest {
                date,
                feed_id: feed,
                provider,
                game_state: state,
            };

            match resolver.resolve(&request).await {
                Ok(item) => dispatch(item, &ConsoleSink),
                Err(e) => {
                    tracing::debug!(error = %e, "Resolution failed");
                    fail_dialog(e.user_message());
                }
            }
        }

        Commands::Highlight { url } => {
            let resolver = build_resolver(&config);
            dispatch(resolver.prepare_highlight(&url), &ConsoleSink);
        }

        Commands::CheckDns { force } => {
            let store = Arc::new(settings::FileSettings::new(state_file(cli.config.as_ref())));
            if force {
                store.set_int(relay_core::DNS_CHECKED_KEY, 0);
            }

            let loader = Arc::new(HttpLoader::from_config(&config));
            let monitor = HealthMonitor::new(
                config,
                Arc::new(SystemClock),
                store,
                Arc::new(TokioResolver),
                loader,
            );

            println!("{}", style("Checking DNS...").dim());
            let outcome = monitor.maybe_check().await;
            match &outcome {
                HealthOutcome::Skipped => {
                    println!("{}", style("Checked recently, skipping.").dim());
                }
                HealthOutcome::Passed => {
                    println!("{}", style("All relay hosts resolve correctly.").green());
                }
                HealthOutcome::ServerOffline | HealthOutcome::Misconfigured(_) => {
                    for message in outcome.user_messages() {
                        eprintln!("{}", style(message).red().bold());
                    }
                    std::process::exit(1);
                }
            }
        }
    }
}
