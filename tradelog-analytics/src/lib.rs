//! TradeLog analytics: aggregate statistics and reports over journaled trades.
//!
//! This crate builds on `tradelog-core` to provide:
//! - Per-record metric resolution with stored-pnl fallback
//! - Aggregate statistics (win rate, profit factor, expectancy, drawdown, streaks)
//! - Equity curve per trade, day or ISO week
//! - Breakdowns by weekday, asset type, strategy, symbol, emotion and setup grade
//! - Calendar view and open-trade exposure
//! - `AnalyticsService` over any `TradeStore`
//! - TOML configuration and JSON/CSV/Markdown export

pub mod breakdown;
pub mod calendar;
pub mod config;
pub mod equity;
pub mod export;
pub mod resolve;
pub mod service;
pub mod stats;
pub mod streaks;

#[cfg(test)]
mod test_support;

pub use breakdown::{breakdown, Breakdowns, Bucket, BucketMap, Dimension};
pub use calendar::{calendar_days, CalendarDay, CalendarMonth};
pub use config::{AnalyticsConfig, AnalyticsOptions, ConfigError};
pub use equity::{equity_curve, max_drawdown, EquityPoint, Granularity};
pub use resolve::{resolve, resolve_all, ClosedTrade, MetricSource, ResolvedTrade};
pub use service::{AnalyticsError, AnalyticsService, TradeView};
pub use stats::{compute_aggregate_statistics, AggregateStatistics, ExposureSummary, ProfitFactor};
pub use streaks::{compute_streaks, StreakSummary, StreakType};
