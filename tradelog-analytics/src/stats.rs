//! Aggregate statistics over a set of trades.
//!
//! Every figure is derived from per-trade metrics resolved on the spot. Only
//! closed trades count toward performance; open trades show up in
//! [`ExposureSummary`] and nowhere else. An empty set yields zeros throughout,
//! never NaN.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tradelog_core::domain::TradeRecord;

use crate::breakdown::Breakdowns;
use crate::config::AnalyticsOptions;
use crate::equity::{equity_curve, max_drawdown, EquityPoint};
use crate::resolve::{closed_chronological, resolve_all, ClosedTrade, MetricSource, ResolvedTrade};
use crate::streaks::{compute_streaks, StreakSummary};

// ─── Profit factor ──────────────────────────────────────────────────

/// Gross profit over absolute gross loss.
///
/// `Unbounded` when there are no losses but some profit. Serialized as a plain
/// number, or the string `"Infinity"` for the unbounded case, so it survives
/// JSON.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitFactor {
    Ratio(f64),
    Unbounded,
}

impl ProfitFactor {
    const INFINITY_LABEL: &'static str = "Infinity";

    /// `gross_loss` may be given with either sign; only its magnitude is used.
    pub fn from_sums(gross_profit: f64, gross_loss: f64) -> Self {
        let loss = gross_loss.abs();
        if loss > 0.0 {
            ProfitFactor::Ratio(gross_profit / loss)
        } else if gross_profit > 0.0 {
            ProfitFactor::Unbounded
        } else {
            ProfitFactor::Ratio(0.0)
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            ProfitFactor::Ratio(r) => r,
            ProfitFactor::Unbounded => f64::INFINITY,
        }
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, ProfitFactor::Unbounded)
    }
}

impl Default for ProfitFactor {
    fn default() -> Self {
        ProfitFactor::Ratio(0.0)
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Ratio(r) => write!(f, "{r:.2}"),
            ProfitFactor::Unbounded => f.write_str(Self::INFINITY_LABEL),
        }
    }
}

impl Serialize for ProfitFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProfitFactor::Ratio(r) => serializer.serialize_f64(*r),
            ProfitFactor::Unbounded => serializer.serialize_str(Self::INFINITY_LABEL),
        }
    }
}

impl<'de> Deserialize<'de> for ProfitFactor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Label(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(r) if r.is_infinite() => Ok(ProfitFactor::Unbounded),
            Repr::Number(r) => Ok(ProfitFactor::Ratio(r)),
            Repr::Label(s) if s.eq_ignore_ascii_case(Self::INFINITY_LABEL) => {
                Ok(ProfitFactor::Unbounded)
            }
            Repr::Label(s) => Err(serde::de::Error::custom(format!(
                "invalid profit factor '{s}'"
            ))),
        }
    }
}

// ─── Exposure ───────────────────────────────────────────────────────

/// What is still at risk in open positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureSummary {
    pub open_trades: usize,
    /// Sum of stop-based risk across open trades (0 for trades without a stop).
    pub open_risk_amount: f64,
    /// Sum of `entry_price * quantity`.
    pub open_notional: f64,
    /// Open trade count per upper-cased symbol.
    pub by_symbol: BTreeMap<String, usize>,
}

impl ExposureSummary {
    pub fn from_resolved(resolved: &[ResolvedTrade<'_>]) -> Self {
        let mut exposure = Self::default();
        for r in resolved.iter().filter(|r| !r.trade.is_closed()) {
            exposure.open_trades += 1;
            exposure.open_risk_amount += r.metrics.map(|m| m.risk_amount).unwrap_or(0.0);
            let notional = r.trade.entry_price * r.trade.quantity;
            if notional.is_finite() {
                exposure.open_notional += notional;
            }
            *exposure
                .by_symbol
                .entry(r.trade.symbol.trim().to_uppercase())
                .or_default() += 1;
        }
        exposure
    }
}

// ─── Aggregate statistics ───────────────────────────────────────────

/// Summary statistics for one user's (filtered) trades.
///
/// Losses (`gross_loss`, `average_loss`, `largest_loss`) are reported as
/// negative P&L.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatistics {
    pub total_pnl: f64,
    /// Closed trades with usable metrics.
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    /// `wins / (wins + losses) * 100`; breakevens are left out.
    pub win_rate: f64,
    pub profit_factor: ProfitFactor,
    pub expectancy: f64,
    /// Mean of defined R-multiples only.
    pub average_r: f64,
    pub max_drawdown: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub total_fees: f64,
    #[serde(flatten)]
    pub streaks: StreakSummary,
    pub equity_curve: Vec<EquityPoint>,
    #[serde(flatten)]
    pub breakdowns: Breakdowns,
    pub exposure: ExposureSummary,
    /// Records whose metrics came from the stored pnl.
    pub degraded_records: usize,
    /// Records with no usable metrics at all.
    pub skipped_records: usize,
}

impl AggregateStatistics {
    pub fn compute(trades: &[TradeRecord], opts: &AnalyticsOptions) -> Self {
        let resolved = resolve_all(trades);
        Self::from_resolved(&resolved, opts)
    }

    pub fn from_resolved(resolved: &[ResolvedTrade<'_>], opts: &AnalyticsOptions) -> Self {
        let closed = closed_chronological(resolved);
        let pnls: Vec<f64> = closed.iter().map(ClosedTrade::net_pnl).collect();

        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();
        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum();
        let total_pnl: f64 = pnls.iter().sum();
        let decided = wins.len() + losses.len();

        let r_multiples: Vec<f64> = closed.iter().filter_map(|c| c.metrics.r_multiple).collect();

        Self {
            total_pnl,
            total_trades: closed.len(),
            wins: wins.len(),
            losses: losses.len(),
            breakevens: closed.len() - decided,
            win_rate: ratio(wins.len() as f64, decided) * 100.0,
            profit_factor: ProfitFactor::from_sums(gross_profit, gross_loss),
            expectancy: ratio(total_pnl, closed.len()),
            average_r: mean(&r_multiples),
            max_drawdown: max_drawdown(pnls.iter().copied()),
            average_win: mean(&wins),
            average_loss: mean(&losses),
            largest_win: wins.iter().copied().fold(0.0, f64::max),
            largest_loss: losses.iter().copied().fold(0.0, f64::min),
            gross_profit,
            gross_loss,
            total_fees: closed
                .iter()
                .map(|c| c.trade.fees)
                .filter(|f| f.is_finite())
                .sum(),
            streaks: compute_streaks(pnls.iter().copied()),
            equity_curve: equity_curve(&closed, opts.granularity, opts.utc_offset),
            breakdowns: Breakdowns::compute(&closed, opts),
            exposure: ExposureSummary::from_resolved(resolved),
            degraded_records: count_source(resolved, MetricSource::Stored),
            skipped_records: count_source(resolved, MetricSource::Unavailable),
        }
    }
}

/// Convenience wrapper around [`AggregateStatistics::compute`].
pub fn compute_aggregate_statistics(
    trades: &[TradeRecord],
    opts: &AnalyticsOptions,
) -> AggregateStatistics {
    AggregateStatistics::compute(trades, opts)
}

fn ratio(numerator: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        numerator / count as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    ratio(values.iter().sum(), values.len())
}

fn count_source(resolved: &[ResolvedTrade<'_>], source: MetricSource) -> usize {
    resolved.iter().filter(|r| r.source == source).count()
}
