//! Performance breakdowns by grouping dimension.
//!
//! Buckets are created on first contribution, so every bucket has count ≥ 1
//! and `avg_pnl` is always defined. Keys are ordered (BTreeMap) so output is
//! stable across runs.

use std::collections::BTreeMap;

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::AnalyticsOptions;
use crate::resolve::ClosedTrade;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub count: usize,
    pub pnl: f64,
    pub avg_pnl: f64,
}

impl Bucket {
    fn add(&mut self, pnl: f64) {
        self.count += 1;
        self.pnl += pnl;
        self.avg_pnl = self.pnl / self.count as f64;
    }
}

pub type BucketMap = BTreeMap<String, Bucket>;

/// Grouping dimension for a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    /// Weekday name of the entry time in the configured offset.
    Weekday,
    AssetType,
    /// Strategy display name; `Unassigned` when the trade has none.
    Strategy,
    Symbol,
    /// Trades without an emotion tag are left out.
    Emotion,
    /// Trades without a setup grade are left out.
    SetupGrade,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Weekday,
        Dimension::AssetType,
        Dimension::Strategy,
        Dimension::Symbol,
        Dimension::Emotion,
        Dimension::SetupGrade,
    ];

    /// Bucket key for one trade, or `None` if the trade has no value here.
    pub fn key(self, closed: &ClosedTrade<'_>, opts: &AnalyticsOptions) -> Option<String> {
        let trade = closed.trade;
        match self {
            Dimension::Weekday => {
                let local = trade.entry_time.with_timezone(&opts.utc_offset);
                Some(weekday_name(local.weekday()).to_string())
            }
            Dimension::AssetType => Some(trade.asset_type.to_string()),
            Dimension::Strategy => Some(opts.strategy_label(trade.strategy_id.as_ref())),
            Dimension::Symbol => Some(trade.symbol.trim().to_uppercase()),
            Dimension::Emotion => trade.emotion_key(),
            Dimension::SetupGrade => trade.setup_grade.map(|g| g.letter().to_string()),
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "weekday" | "dayofweek" => Ok(Dimension::Weekday),
            "assettype" | "asset" => Ok(Dimension::AssetType),
            "strategy" => Ok(Dimension::Strategy),
            "symbol" => Ok(Dimension::Symbol),
            "emotion" => Ok(Dimension::Emotion),
            "setupgrade" | "grade" => Ok(Dimension::SetupGrade),
            other => Err(format!("unknown breakdown dimension '{other}'")),
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Group closed trades along one dimension.
pub fn breakdown(trades: &[ClosedTrade<'_>], dimension: Dimension, opts: &AnalyticsOptions) -> BucketMap {
    let mut buckets = BucketMap::new();
    for closed in trades {
        if let Some(key) = dimension.key(closed, opts) {
            buckets.entry(key).or_default().add(closed.net_pnl());
        }
    }
    buckets
}

/// Every breakdown the summary reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdowns {
    pub by_weekday: BucketMap,
    pub by_asset_type: BucketMap,
    pub by_strategy: BucketMap,
    pub by_symbol: BucketMap,
    pub by_emotion: BucketMap,
    pub by_setup_grade: BucketMap,
}

impl Breakdowns {
    pub fn compute(trades: &[ClosedTrade<'_>], opts: &AnalyticsOptions) -> Self {
        Self {
            by_weekday: breakdown(trades, Dimension::Weekday, opts),
            by_asset_type: breakdown(trades, Dimension::AssetType, opts),
            by_strategy: breakdown(trades, Dimension::Strategy, opts),
            by_symbol: breakdown(trades, Dimension::Symbol, opts),
            by_emotion: breakdown(trades, Dimension::Emotion, opts),
            by_setup_grade: breakdown(trades, Dimension::SetupGrade, opts),
        }
    }

    pub fn get(&self, dimension: Dimension) -> &BucketMap {
        match dimension {
            Dimension::Weekday => &self.by_weekday,
            Dimension::AssetType => &self.by_asset_type,
            Dimension::Strategy => &self.by_strategy,
            Dimension::Symbol => &self.by_symbol,
            Dimension::Emotion => &self.by_emotion,
            Dimension::SetupGrade => &self.by_setup_grade,
        }
    }
}
