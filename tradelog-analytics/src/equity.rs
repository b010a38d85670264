//! Equity curve and drawdown over realized P&L.
//!
//! The curve starts from zero cumulative P&L, not from an account balance, so
//! a first losing trade is already a drawdown.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::resolve::ClosedTrade;

/// Equity curve resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One point per closed trade, labelled by trade id.
    #[default]
    Trade,
    /// One point per local calendar day (`YYYY-MM-DD`).
    Day,
    /// One point per ISO week (`YYYY-Www`).
    Week,
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trade" => Ok(Granularity::Trade),
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            other => Err(format!("unknown granularity '{other}' (expected trade, day or week)")),
        }
    }
}

/// Single point on the equity curve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub label: String,
    /// Entry time of the last trade folded into this point.
    pub timestamp: DateTime<Utc>,
    /// P&L added by this point.
    pub pnl: f64,
    pub cumulative_pnl: f64,
}

/// Build the equity curve from closed trades already in chronological order.
pub fn equity_curve(
    trades: &[ClosedTrade<'_>],
    granularity: Granularity,
    offset: FixedOffset,
) -> Vec<EquityPoint> {
    let mut points: Vec<EquityPoint> = Vec::new();
    let mut cumulative = 0.0;

    for closed in trades {
        let pnl = closed.net_pnl();
        cumulative += pnl;
        let label = bucket_label(closed, granularity, offset);

        match points.last_mut() {
            Some(last) if granularity != Granularity::Trade && last.label == label => {
                last.pnl += pnl;
                last.cumulative_pnl = cumulative;
                last.timestamp = closed.trade.entry_time;
            }
            _ => points.push(EquityPoint {
                label,
                timestamp: closed.trade.entry_time,
                pnl,
                cumulative_pnl: cumulative,
            }),
        }
    }

    points
}

fn bucket_label(closed: &ClosedTrade<'_>, granularity: Granularity, offset: FixedOffset) -> String {
    let local = closed.trade.entry_time.with_timezone(&offset).date_naive();
    match granularity {
        Granularity::Trade => closed.trade.id.to_string(),
        Granularity::Day => local.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let iso = local.iso_week();
            format!("{}-W{:02}", iso.year(), iso.week())
        }
    }
}

/// Largest peak-to-trough decline of the running cumulative P&L.
///
/// Cumulative P&L and its running peak both start at 0. Returned as a
/// non-negative amount.
pub fn max_drawdown<I>(pnls: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for pnl in pnls {
        cumulative += pnl;
        if cumulative > peak {
            peak = cumulative;
        }
        let dd = peak - cumulative;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}
