//! TradeRecord: a journal entry for one position, open or closed.

use super::ids::{PortfolioId, StrategyId, TradeId, UserId};
use super::instrument::{AssetType, Direction, SetupGrade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single journaled trade as held by the store.
///
/// A trade is closed iff `exit_price` is present. `pnl` is the value persisted
/// when the trade was saved; it drives win/loss filtering and is the fallback
/// when metrics cannot be recomputed from prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    // ── Identification ──
    #[serde(default)]
    pub id: TradeId,
    pub user_id: UserId,
    pub symbol: String,
    pub direction: Direction,
    pub asset_type: AssetType,

    // ── Pricing ──
    pub entry_price: f64,
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    pub quantity: f64,
    #[serde(default)]
    pub fees: f64,

    // ── Timing ──
    #[serde(rename = "timestampEntry")]
    pub entry_time: DateTime<Utc>,
    #[serde(default, rename = "timestampExit")]
    pub exit_time: Option<DateTime<Utc>>,

    // ── Context ──
    #[serde(default)]
    pub portfolio_balance: Option<f64>,
    #[serde(default)]
    pub strategy_id: Option<StrategyId>,
    #[serde(default)]
    pub portfolio_id: Option<PortfolioId>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub setup_grade: Option<SetupGrade>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_backtest: bool,
    #[serde(default)]
    pub notes: Option<String>,

    // ── Persisted result ──
    #[serde(default)]
    pub pnl: Option<f64>,
}

impl TradeRecord {
    /// Minimal open trade; the remaining fields take their defaults.
    pub fn open(
        user_id: UserId,
        symbol: impl Into<String>,
        direction: Direction,
        asset_type: AssetType,
        entry_price: f64,
        quantity: f64,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TradeId::default(),
            user_id,
            symbol: symbol.into(),
            direction,
            asset_type,
            entry_price,
            exit_price: None,
            stop_loss: None,
            take_profit: None,
            quantity,
            fees: 0.0,
            entry_time,
            exit_time: None,
            portfolio_balance: None,
            strategy_id: None,
            portfolio_id: None,
            emotion: None,
            setup_grade: None,
            tags: Vec::new(),
            is_backtest: false,
            notes: None,
            pnl: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    /// Emotion tag with surrounding whitespace removed; empty tags count as none.
    pub fn emotion_tag(&self) -> Option<&str> {
        self.emotion
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Lowercased emotion tag, the key emotions are grouped by.
    pub fn emotion_key(&self) -> Option<String> {
        self.emotion_tag().map(str::to_lowercase)
    }
}
