//! Request-scoped analytics over an injected trade store.
//!
//! One method per request. Nothing is cached between calls: every call queries
//! the store and recomputes derived figures from scratch. A store failure
//! fails the request; a malformed record only degrades that record.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradelog_core::domain::{TradeId, TradeRecord, UserId};
use tradelog_core::{StoreError, TradeFilter, TradeMetrics, TradeStore};

use crate::breakdown::{breakdown, BucketMap, Dimension};
use crate::calendar::{calendar_days, CalendarDay, CalendarMonth};
use crate::config::AnalyticsOptions;
use crate::equity::{equity_curve, EquityPoint, Granularity};
use crate::resolve::{closed_chronological, resolve, resolve_all, MetricSource, ResolvedTrade};
use crate::stats::AggregateStatistics;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("trade {0} not found")]
    TradeNotFound(TradeId),
}

/// A stored trade together with its freshly resolved metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeView {
    #[serde(flatten)]
    pub trade: TradeRecord,
    pub metrics: Option<TradeMetrics>,
    pub metric_source: MetricSource,
}

impl From<&ResolvedTrade<'_>> for TradeView {
    fn from(r: &ResolvedTrade<'_>) -> Self {
        Self {
            trade: r.trade.clone(),
            metrics: r.metrics,
            metric_source: r.source,
        }
    }
}

pub struct AnalyticsService<S> {
    store: S,
    options: AnalyticsOptions,
}

impl<S: TradeStore> AnalyticsService<S> {
    pub fn new(store: S, options: AnalyticsOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &AnalyticsOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self, user: &UserId, filter: &TradeFilter) -> Result<Vec<TradeRecord>, AnalyticsError> {
        let query = filter.to_query(user, self.options.utc_offset);
        Ok(self.store.find(&query)?)
    }

    /// Aggregate statistics over the user's filtered trades.
    pub fn summary(
        &self,
        user: &UserId,
        filter: &TradeFilter,
    ) -> Result<AggregateStatistics, AnalyticsError> {
        let trades = self.load(user, filter)?;
        let stats = AggregateStatistics::compute(&trades, &self.options);
        tracing::debug!(
            user = %user,
            records = trades.len(),
            closed = stats.total_trades,
            degraded = stats.degraded_records,
            skipped = stats.skipped_records,
            "summary computed"
        );
        Ok(stats)
    }

    /// Calendar entries, optionally restricted to one month.
    pub fn calendar(
        &self,
        user: &UserId,
        filter: &TradeFilter,
        month: Option<CalendarMonth>,
    ) -> Result<Vec<CalendarDay>, AnalyticsError> {
        let mut filter = filter.clone();
        if let Some(m) = month {
            // Narrow the store query; calendar_days still enforces the month.
            filter.from.get_or_insert(m.first_day());
            filter.to.get_or_insert(m.last_day());
        }
        let trades = self.load(user, &filter)?;
        let resolved = resolve_all(&trades);
        let days = calendar_days(&resolved, self.options.utc_offset, month);
        tracing::debug!(user = %user, records = trades.len(), days = days.len(), "calendar computed");
        Ok(days)
    }

    /// Every matching trade with its metrics, in store order.
    pub fn trade_list(
        &self,
        user: &UserId,
        filter: &TradeFilter,
    ) -> Result<Vec<TradeView>, AnalyticsError> {
        let trades = self.load(user, filter)?;
        let views: Vec<TradeView> = resolve_all(&trades).iter().map(TradeView::from).collect();
        tracing::debug!(user = %user, records = views.len(), "trade list computed");
        Ok(views)
    }

    /// One trade with its metrics.
    pub fn trade_metrics(&self, user: &UserId, id: &TradeId) -> Result<TradeView, AnalyticsError> {
        let trade = self
            .store
            .get(user, id)?
            .ok_or_else(|| AnalyticsError::TradeNotFound(id.clone()))?;
        Ok(TradeView::from(&resolve(&trade)))
    }

    /// Equity curve at `granularity`, or the configured default.
    pub fn equity_curve(
        &self,
        user: &UserId,
        filter: &TradeFilter,
        granularity: Option<Granularity>,
    ) -> Result<Vec<EquityPoint>, AnalyticsError> {
        let trades = self.load(user, filter)?;
        let resolved = resolve_all(&trades);
        let closed = closed_chronological(&resolved);
        Ok(equity_curve(
            &closed,
            granularity.unwrap_or(self.options.granularity),
            self.options.utc_offset,
        ))
    }

    /// A single breakdown dimension.
    pub fn breakdown(
        &self,
        user: &UserId,
        filter: &TradeFilter,
        dimension: Dimension,
    ) -> Result<BucketMap, AnalyticsError> {
        let trades = self.load(user, filter)?;
        let resolved = resolve_all(&trades);
        let closed = closed_chronological(&resolved);
        Ok(breakdown(&closed, dimension, &self.options))
    }
}
