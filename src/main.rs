//! PARLAY FORGE: NBA player-prop parlay engine
//!
//! Entry point. Loads configuration, initialises structured logging and
//! dispatches one of the subcommands: fetch odds and projections into an
//! edges table, generate parlays from one, do both, or serve the API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use parlay_forge::api;
use parlay_forge::api::routes::ApiState;
use parlay_forge::config::AppConfig;
use parlay_forge::data::odds::OddsApiClient;
use parlay_forge::data::projections::ProjectionsClient;
use parlay_forge::data::props::{save_edges, EdgeRow, PropStore};
use parlay_forge::pipeline;
use parlay_forge::report::export::write_reports;
use parlay_forge::types::Strategy;

const EDGES_FILE: &str = "nba_player_prop_edges.csv";

#[derive(Parser, Debug)]
#[command(name = "parlay-forge")]
#[command(author, version, about = "Build and rank NBA player-prop parlays")]
struct Cli {
    /// Configuration file (defaults apply when missing)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch odds and projections and write the edges table
    Fetch {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate parlays and reports from an edges table
    Generate {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        overrides: GeneratorOverrides,
    },

    /// Fetch, then generate
    Run {
        #[command(flatten)]
        overrides: GeneratorOverrides,
    },

    /// Serve the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        /// Edges table to generate parlays from at startup
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct GeneratorOverrides {
    /// greedy or exhaustive
    #[arg(long)]
    strategy: Option<Strategy>,
    #[arg(long)]
    min_legs: Option<usize>,
    #[arg(long)]
    max_legs: Option<usize>,
    #[arg(long)]
    top_n: Option<usize>,
}

impl GeneratorOverrides {
    fn apply(&self, cfg: &mut AppConfig) -> Result<()> {
        let g = &mut cfg.generator;
        if let Some(s) = self.strategy {
            g.strategy = s;
        }
        if let Some(n) = self.min_legs {
            g.min_legs = n;
        }
        if let Some(n) = self.max_legs {
            g.max_legs = n;
        }
        if let Some(n) = self.top_n {
            g.top_n = n;
        }
        cfg.validate()?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let mut cfg = AppConfig::load_or_default(&cli.config)?;

    init_logging();

    let default_edges = Path::new(&cfg.report.output_dir).join(EDGES_FILE);

    match cli.command {
        Commands::Fetch { output } => {
            let path = output.unwrap_or(default_edges);
            fetch_to(&cfg, &path).await?;
        }
        Commands::Generate { input, overrides } => {
            overrides.apply(&mut cfg)?;
            let path = input.unwrap_or(default_edges);
            let store = PropStore::load_csv(&path)?;
            let snapshot = pipeline::generate(&cfg, store)?;
            write_reports(&cfg.report.output_dir, &snapshot)?;
        }
        Commands::Run { overrides } => {
            overrides.apply(&mut cfg)?;
            let rows = fetch_to(&cfg, &default_edges).await?;
            if rows.is_empty() {
                warn!("Nothing to build parlays from");
                return Ok(());
            }
            let snapshot = pipeline::generate_from_rows(&cfg, &rows)?;
            write_reports(&cfg.report.output_dir, &snapshot)?;
        }
        Commands::Serve { port, input } => {
            let source = Arc::new(OddsApiClient::from_config(&cfg.odds)?);
            let state = Arc::new(ApiState::new(source));
            if let Some(path) = input {
                let snapshot = pipeline::generate(&cfg, PropStore::load_csv(&path)?)?;
                state.publish(snapshot).await;
            }
            api::serve(state, port.unwrap_or(cfg.api.port)).await?;
        }
    }

    Ok(())
}

async fn fetch_to(cfg: &AppConfig, path: &Path) -> Result<Vec<EdgeRow>> {
    let odds = OddsApiClient::from_config(&cfg.odds)?;
    let projections = ProjectionsClient::new(&cfg.projections)?;
    let rows = pipeline::fetch(cfg, &odds, &projections).await?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    save_edges(path, &rows)?;

    let quota = odds.quota();
    info!(
        rows = rows.len(),
        requests_used = ?quota.used,
        requests_remaining = ?quota.remaining,
        "Fetch complete"
    );
    Ok(rows)
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parlay_forge=info"));

    let json_logging = std::env::var("PARLAY_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
