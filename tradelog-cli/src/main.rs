//! TradeLog CLI: journal analytics from the command line.
//!
//! Commands:
//! - `stats`: aggregate statistics (JSON, or Markdown with `--markdown`)
//! - `calendar`: per-day P&L, optionally for one month
//! - `trades`: trade list with derived metrics (JSON or CSV)
//! - `trade`: one trade with its metrics
//! - `breakdown`: one grouping dimension
//! - `equity`: equity curve (JSON or CSV)
//! - `import`: load trades from a CSV file into the store
//!
//! Reports go to stdout; logs go to stderr (`RUST_LOG`, default `tradelog=info`).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tradelog_analytics::export::{equity_csv, summary_markdown, to_json, trades_csv};
use tradelog_analytics::{
    AnalyticsConfig, AnalyticsService, CalendarMonth, Dimension, Granularity,
};
use tradelog_core::domain::{AssetType, PortfolioId, StrategyId, TradeId, UserId};
use tradelog_core::import::read_trades_csv;
use tradelog_core::store::{JsonlTradeStore, Outcome};
use tradelog_core::{TradeFilter, TradeStore};

const DEFAULT_STORE: &str = "trades.jsonl";

#[derive(Parser)]
#[command(name = "tradelog", about = "TradeLog CLI: trading journal analytics")]
struct Cli {
    /// JSONL trade store. Overrides `store_path` from the config file.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// TOML analytics config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Owner of the trades being analysed.
    #[arg(long, global = true, default_value = "default")]
    user: String,

    /// UTC offset for dates and weekdays (e.g. +02:00). Overrides the config file.
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Case-insensitive symbol substring.
    #[arg(long)]
    symbol: Option<String>,

    /// win or loss (by stored P&L).
    #[arg(long, value_parser = parse_outcome)]
    outcome: Option<Outcome>,

    #[arg(long)]
    portfolio: Option<String>,

    #[arg(long)]
    strategy: Option<String>,

    /// First local entry date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last local entry date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only backtest trades.
    #[arg(long, conflicts_with = "live")]
    backtest: bool,

    /// Only live trades.
    #[arg(long)]
    live: bool,

    /// forex, crypto, stock, cfd, futures or indices.
    #[arg(long)]
    asset_type: Option<AssetType>,
}

impl FilterArgs {
    fn to_filter(&self) -> TradeFilter {
        TradeFilter {
            symbol: self.symbol.clone(),
            outcome: self.outcome,
            portfolio_id: self.portfolio.clone().map(PortfolioId::new),
            strategy_id: self.strategy.clone().map(StrategyId::new),
            from: self.from,
            to: self.to,
            backtest: match (self.backtest, self.live) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            asset_type: self.asset_type,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate statistics for the filtered trades.
    Stats {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print a Markdown summary instead of JSON.
        #[arg(long, default_value_t = false)]
        markdown: bool,
    },
    /// Per-day trade count, P&L and emotions.
    Calendar {
        #[command(flatten)]
        filter: FilterArgs,

        /// Restrict to one month (YYYY-MM).
        #[arg(long)]
        month: Option<CalendarMonth>,
    },
    /// Trade list with derived metrics.
    Trades {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print CSV instead of JSON.
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// One trade with its metrics.
    Trade {
        id: String,
    },
    /// Group performance by one dimension.
    Breakdown {
        /// weekday, asset-type, strategy, symbol, emotion or setup-grade.
        dimension: Dimension,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Equity curve.
    Equity {
        #[command(flatten)]
        filter: FilterArgs,

        /// trade, day or week. Defaults to the configured granularity.
        #[arg(long)]
        granularity: Option<Granularity>,

        /// Print CSV instead of JSON.
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Import trades from a CSV file with a header row.
    Import {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };
    if let Some(offset) = &cli.utc_offset {
        config.utc_offset = offset.clone();
    }
    let options = config.to_options()?;
    let store_path = cli
        .store
        .clone()
        .or_else(|| config.store_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE));
    let user = UserId::new(cli.user.clone());

    let service = AnalyticsService::new(JsonlTradeStore::new(&store_path), options);

    match cli.command {
        Commands::Stats { filter, markdown } => {
            let stats = service.summary(&user, &filter.to_filter())?;
            if markdown {
                print!("{}", summary_markdown(&stats));
            } else {
                println!("{}", to_json(&stats)?);
            }
        }
        Commands::Calendar { filter, month } => {
            let days = service.calendar(&user, &filter.to_filter(), month)?;
            println!("{}", to_json(&days)?);
        }
        Commands::Trades { filter, csv } => {
            let views = service.trade_list(&user, &filter.to_filter())?;
            if csv {
                print!("{}", trades_csv(&views)?);
            } else {
                println!("{}", to_json(&views)?);
            }
        }
        Commands::Trade { id } => {
            let view = service.trade_metrics(&user, &TradeId::new(id))?;
            println!("{}", to_json(&view)?);
        }
        Commands::Breakdown { dimension, filter } => {
            let buckets = service.breakdown(&user, &filter.to_filter(), dimension)?;
            println!("{}", to_json(&buckets)?);
        }
        Commands::Equity {
            filter,
            granularity,
            csv,
        } => {
            let curve = service.equity_curve(&user, &filter.to_filter(), granularity)?;
            if csv {
                print!("{}", equity_csv(&curve)?);
            } else {
                println!("{}", to_json(&curve)?);
            }
        }
        Commands::Import { file } => run_import(service.store(), &user, &file)?,
    }

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tradelog=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run_import(store: &impl TradeStore, user: &UserId, file: &Path) -> Result<()> {
    let report = read_trades_csv(file, user)
        .with_context(|| format!("failed to import {}", file.display()))?;

    for (row, err) in &report.rejected {
        tracing::warn!(row, error = %err, "rejected CSV row");
    }

    let mut imported = 0usize;
    for trade in report.trades {
        store
            .insert(trade)
            .context("failed to store imported trade")?;
        imported += 1;
    }

    tracing::info!(
        file = %file.display(),
        imported,
        rejected = report.rejected.len(),
        "import finished"
    );
    if imported == 0 && !report.rejected.is_empty() {
        bail!("no rows imported: all {} rows were rejected", report.rejected.len());
    }
    println!("Imported {imported} trade(s), rejected {}", report.rejected.len());
    Ok(())
}

fn parse_outcome(s: &str) -> Result<Outcome, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "win" | "wins" => Ok(Outcome::Win),
        "loss" | "losses" => Ok(Outcome::Loss),
        other => Err(format!("unknown outcome '{other}' (expected win or loss)")),
    }
}
