//! CSV trade import.
//!
//! This is the boundary where free-form input becomes a `TradeRecord`, so
//! classification literals are parsed strictly here: a row with an unknown
//! direction is rejected instead of being stored.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    AssetType, ClassificationError, Direction, PortfolioId, SetupGrade, StrategyId, TradeId,
    TradeRecord, UserId,
};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single row was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    #[error("missing required column '{0}'")]
    Missing(&'static str),

    #[error("malformed row: {0}")]
    Malformed(String),
}

/// Outcome of an import: accepted trades plus rejected rows (1-based, header excluded).
#[derive(Debug, Default)]
pub struct ImportReport {
    pub trades: Vec<TradeRecord>,
    pub rejected: Vec<(usize, RowError)>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    id: Option<String>,
    symbol: String,
    direction: String,
    asset_type: String,
    entry_price: f64,
    #[serde(default)]
    exit_price: Option<f64>,
    #[serde(default)]
    stop_loss: Option<f64>,
    #[serde(default)]
    take_profit: Option<f64>,
    quantity: f64,
    #[serde(default)]
    fees: Option<f64>,
    entry_time: String,
    #[serde(default)]
    exit_time: Option<String>,
    #[serde(default)]
    portfolio_balance: Option<f64>,
    #[serde(default)]
    strategy_id: Option<String>,
    #[serde(default)]
    portfolio_id: Option<String>,
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default)]
    setup_grade: Option<String>,
    /// `;`-separated
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    is_backtest: Option<bool>,
    #[serde(default)]
    pnl: Option<f64>,
}

/// Import trades for `user` from a CSV file with a header row.
pub fn read_trades_csv(path: &Path, user: &UserId) -> Result<ImportReport, ImportError> {
    let file = std::fs::File::open(path)?;
    read_trades_csv_from(file, user)
}

/// Import trades from any reader. Empty cells are treated as absent.
pub fn read_trades_csv_from<R: Read>(reader: R, user: &UserId) -> Result<ImportReport, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.headers()?;
    let mut report = ImportReport::default();

    for (idx, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                report.rejected.push((idx + 1, RowError::Malformed(err.to_string())));
                continue;
            }
        };
        match convert_row(row, user) {
            Ok(trade) => report.trades.push(trade),
            Err(err) => report.rejected.push((idx + 1, err)),
        }
    }

    Ok(report)
}

fn convert_row(row: CsvRow, user: &UserId) -> Result<TradeRecord, RowError> {
    let direction: Direction = row.direction.parse()?;
    let asset_type: AssetType = row.asset_type.parse()?;
    let entry_time = parse_timestamp(&row.entry_time)?;
    let exit_time = non_empty(row.exit_time)
        .map(|s| parse_timestamp(&s))
        .transpose()?;
    let setup_grade = non_empty(row.setup_grade)
        .map(|s| s.parse::<SetupGrade>())
        .transpose()?;
    if row.symbol.is_empty() {
        return Err(RowError::Missing("symbol"));
    }

    Ok(TradeRecord {
        id: non_empty(row.id).map(TradeId::new).unwrap_or_default(),
        user_id: user.clone(),
        symbol: row.symbol,
        direction,
        asset_type,
        entry_price: row.entry_price,
        exit_price: row.exit_price,
        stop_loss: row.stop_loss,
        take_profit: row.take_profit,
        quantity: row.quantity,
        fees: row.fees.unwrap_or(0.0),
        entry_time,
        exit_time,
        portfolio_balance: row.portfolio_balance,
        strategy_id: non_empty(row.strategy_id).map(StrategyId::new),
        portfolio_id: non_empty(row.portfolio_id).map(PortfolioId::new),
        emotion: non_empty(row.emotion),
        setup_grade,
        tags: row
            .tags
            .map(|t| {
                t.split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        is_backtest: row.is_backtest.unwrap_or(false),
        notes: None,
        pnl: row.pnl,
    })
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare date (UTC midnight).
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RowError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(RowError::Timestamp(s.to_string()))
}
