//! Per-record metric resolution with stored-value fallback.
//!
//! Recomputing metrics from prices can fail for a malformed record. That must
//! never take down a trade list, calendar or summary: the one record degrades
//! to its persisted `pnl`, and if it has none it is left out of performance
//! statistics.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tradelog_core::domain::TradeRecord;
use tradelog_core::{compute_trade_metrics, RiskParams, TradeMetrics};

/// Where a record's metrics came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    /// Recomputed from prices.
    Computed,
    /// Recomputation failed; persisted pnl used instead.
    Stored,
    /// Recomputation failed and nothing was persisted.
    Unavailable,
}

/// A trade paired with its resolved metrics.
#[derive(Debug, Clone)]
pub struct ResolvedTrade<'a> {
    pub trade: &'a TradeRecord,
    pub metrics: Option<TradeMetrics>,
    pub source: MetricSource,
}

impl<'a> ResolvedTrade<'a> {
    /// Closed and with usable metrics: counts toward performance statistics.
    pub fn as_closed(&self) -> Option<ClosedTrade<'a>> {
        match self.metrics {
            Some(metrics) if self.trade.is_closed() => Some(ClosedTrade {
                trade: self.trade,
                metrics,
            }),
            _ => None,
        }
    }
}

/// A closed trade with metrics guaranteed present.
#[derive(Debug, Clone, Copy)]
pub struct ClosedTrade<'a> {
    pub trade: &'a TradeRecord,
    pub metrics: TradeMetrics,
}

impl ClosedTrade<'_> {
    pub fn net_pnl(&self) -> f64 {
        self.metrics.net_pnl
    }
}

/// Resolve one trade's metrics, falling back to its stored pnl on bad input.
pub fn resolve(trade: &TradeRecord) -> ResolvedTrade<'_> {
    match compute_trade_metrics(trade, &RiskParams::from_trade(trade)) {
        Ok(metrics) => ResolvedTrade {
            trade,
            metrics: Some(metrics),
            source: MetricSource::Computed,
        },
        Err(err) => match trade.pnl.filter(|p| p.is_finite()) {
            Some(pnl) => {
                tracing::warn!(
                    trade_id = %trade.id,
                    error = %err,
                    stored_pnl = pnl,
                    "metric recomputation failed, using stored pnl"
                );
                let mut metrics = TradeMetrics::from_stored_pnl(pnl, trade.fees);
                metrics.is_closed = trade.is_closed();
                ResolvedTrade {
                    trade,
                    metrics: Some(metrics),
                    source: MetricSource::Stored,
                }
            }
            None => {
                tracing::warn!(
                    trade_id = %trade.id,
                    error = %err,
                    "metric recomputation failed and no stored pnl, excluding record"
                );
                ResolvedTrade {
                    trade,
                    metrics: None,
                    source: MetricSource::Unavailable,
                }
            }
        },
    }
}

/// Resolve every trade in parallel, keeping input order.
pub fn resolve_all(trades: &[TradeRecord]) -> Vec<ResolvedTrade<'_>> {
    trades.par_iter().map(resolve).collect()
}

/// Closed trades in chronological order: entry time ascending, ties by id.
pub fn closed_chronological<'a>(resolved: &[ResolvedTrade<'a>]) -> Vec<ClosedTrade<'a>> {
    let mut closed: Vec<ClosedTrade<'a>> = resolved.iter().filter_map(|r| r.as_closed()).collect();
    closed.sort_by(|a, b| {
        a.trade
            .entry_time
            .cmp(&b.trade.entry_time)
            .then_with(|| a.trade.id.cmp(&b.trade.id))
    });
    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_trade, ts};
    use tradelog_core::domain::Direction;

    #[test]
    fn valid_trade_is_computed() {
        let t = closed_trade("a", ts(4, 10), 25.0);
        let r = resolve(&t);
        assert_eq!(r.source, MetricSource::Computed);
        assert_eq!(r.metrics.unwrap().net_pnl, 25.0);
    }

    #[test]
    fn invalid_trade_falls_back_to_stored_pnl() {
        let mut t = closed_trade("a", ts(4, 10), 25.0);
        t.direction = Direction::Unrecognized;
        t.pnl = Some(-12.5);
        let r = resolve(&t);
        assert_eq!(r.source, MetricSource::Stored);
        assert_eq!(r.metrics.unwrap().net_pnl, -12.5);
        assert!(r.as_closed().is_some());
    }

    #[test]
    fn invalid_trade_without_stored_pnl_is_unavailable() {
        let mut t = closed_trade("a", ts(4, 10), 25.0);
        t.quantity = -1.0;
        t.pnl = None;
        let r = resolve(&t);
        assert_eq!(r.source, MetricSource::Unavailable);
        assert!(r.metrics.is_none());
        assert!(r.as_closed().is_none());
    }

    #[test]
    fn chronological_order_breaks_ties_by_id() {
        let trades = vec![
            closed_trade("c", ts(5, 9), 1.0),
            closed_trade("b", ts(4, 9), 2.0),
            closed_trade("a", ts(5, 9), 3.0),
        ];
        let resolved = resolve_all(&trades);
        let ids: Vec<_> = closed_chronological(&resolved)
            .iter()
            .map(|c| c.trade.id.0.clone())
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn resolve_all_preserves_input_order() {
        let trades: Vec<_> = (0..200)
            .map(|i| closed_trade(&format!("t{i:03}"), ts(4, 9), i as f64))
            .collect();
        let resolved = resolve_all(&trades);
        for (i, r) in resolved.iter().enumerate() {
            assert_eq!(r.trade.id.0, format!("t{i:03}"));
        }
    }
}
