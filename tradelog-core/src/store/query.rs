//! Filter → store query translation.
//!
//! `TradeFilter` is what a user supplies (dates in their local zone, a win/loss
//! toggle). `TradeQuery` is what a store evaluates: UTC bounds scoped to one
//! user. Win/loss is decided on the persisted `pnl`, never a recomputed one.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AssetType, PortfolioId, StrategyId, TradeRecord, UserId};

/// Win/loss toggle on the stored pnl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// stored pnl > 0
    Win,
    /// stored pnl < 0
    Loss,
}

/// User-supplied trade filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeFilter {
    /// Case-insensitive substring of the symbol.
    pub symbol: Option<String>,
    pub outcome: Option<Outcome>,
    pub portfolio_id: Option<PortfolioId>,
    pub strategy_id: Option<StrategyId>,
    /// Inclusive local date of entry.
    pub from: Option<NaiveDate>,
    /// Inclusive local date of entry.
    pub to: Option<NaiveDate>,
    /// `Some(true)` only backtests, `Some(false)` only live trades.
    pub backtest: Option<bool>,
    pub asset_type: Option<AssetType>,
}

impl TradeFilter {
    /// Translate into a store query for `user`.
    ///
    /// Dates are interpreted as calendar days in `offset` and become a
    /// half-open UTC range `[from 00:00, to+1 00:00)`.
    pub fn to_query(&self, user: &UserId, offset: FixedOffset) -> TradeQuery {
        let symbol_contains = self
            .symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        TradeQuery {
            user_id: user.clone(),
            symbol_contains,
            outcome: self.outcome,
            portfolio_id: self.portfolio_id.clone(),
            strategy_id: self.strategy_id.clone(),
            entry_from: self.from.map(|d| local_midnight(d, offset)),
            entry_before: self
                .to
                .map(|d| local_midnight(d, offset) + Duration::days(1)),
            is_backtest: self.backtest,
            asset_type: self.asset_type,
        }
    }
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&(date.and_time(NaiveTime::MIN) - shift))
}

/// A store-level query: every set field must match.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeQuery {
    pub user_id: UserId,
    /// Already lowercased.
    pub symbol_contains: Option<String>,
    pub outcome: Option<Outcome>,
    pub portfolio_id: Option<PortfolioId>,
    pub strategy_id: Option<StrategyId>,
    pub entry_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub entry_before: Option<DateTime<Utc>>,
    pub is_backtest: Option<bool>,
    pub asset_type: Option<AssetType>,
}

impl TradeQuery {
    /// Every trade owned by `user`.
    pub fn for_user(user: &UserId) -> Self {
        TradeFilter::default().to_query(user, Utc.fix())
    }

    pub fn matches(&self, trade: &TradeRecord) -> bool {
        if trade.user_id != self.user_id {
            return false;
        }
        if let Some(needle) = &self.symbol_contains {
            if !trade.symbol.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(outcome) = self.outcome {
            let matched = match (outcome, trade.pnl) {
                (Outcome::Win, Some(p)) => p > 0.0,
                (Outcome::Loss, Some(p)) => p < 0.0,
                (_, None) => false,
            };
            if !matched {
                return false;
            }
        }
        if self.portfolio_id.is_some() && trade.portfolio_id != self.portfolio_id {
            return false;
        }
        if self.strategy_id.is_some() && trade.strategy_id != self.strategy_id {
            return false;
        }
        if self.entry_from.is_some_and(|from| trade.entry_time < from) {
            return false;
        }
        if self.entry_before.is_some_and(|before| trade.entry_time >= before) {
            return false;
        }
        if self.is_backtest.is_some_and(|b| trade.is_backtest != b) {
            return false;
        }
        if self.asset_type.is_some_and(|a| trade.asset_type != a) {
            return false;
        }
        true
    }
}
