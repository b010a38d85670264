//! BDD scenarios for the analytics service.
//!
//! These tests drive `AnalyticsService` end to end over an in-memory store:
//! - Per-trade metrics for a known forex trade
//! - Profit factor, streaks and empty-journal behaviour
//! - Degraded records and store failures
//! - Filters, time zones and breakdown consistency

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use tradelog_analytics::{
    AnalyticsError, AnalyticsOptions, AnalyticsService, Dimension, Granularity, MetricSource,
    ProfitFactor, StreakType,
};
use tradelog_core::domain::{AssetType, Direction, TradeId, TradeRecord, UserId};
use tradelog_core::store::{InMemoryTradeStore, Outcome};
use tradelog_core::{StoreError, TradeFilter, TradeQuery, TradeStore};

// ── Fixtures ─────────────────────────────────────────────────────────

fn user() -> UserId {
    UserId::new("trader-1")
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

/// Closed long stock trade with net P&L `pnl` (entry 100, qty 1).
fn trade(id: &str, entry: DateTime<Utc>, pnl: f64) -> TradeRecord {
    let mut t = TradeRecord::open(
        user(),
        "MSFT",
        Direction::Long,
        AssetType::Stock,
        100.0,
        1.0,
        entry,
    );
    t.id = TradeId::new(id);
    t.exit_price = Some(100.0 + pnl);
    t.exit_time = Some(entry + Duration::minutes(30));
    t.pnl = Some(pnl);
    t
}

fn eurusd() -> TradeRecord {
    let mut t = TradeRecord::open(
        user(),
        "EURUSD",
        Direction::Long,
        AssetType::Forex,
        1.0850,
        10_000.0,
        at(4, 8),
    );
    t.id = TradeId::new("fx-1");
    t.exit_price = Some(1.0950);
    t.exit_time = Some(at(4, 16));
    t.stop_loss = Some(1.0800);
    t.take_profit = Some(1.1000);
    t.portfolio_balance = Some(10_000.0);
    t.fees = 5.0;
    t.pnl = Some(95.0);
    t
}

fn service(trades: Vec<TradeRecord>) -> AnalyticsService<InMemoryTradeStore> {
    let store = InMemoryTradeStore::with_trades(trades).expect("fixture store");
    AnalyticsService::new(store, AnalyticsOptions::default())
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// A store whose backend is down.
struct DownStore;

impl TradeStore for DownStore {
    fn find(&self, _: &TradeQuery) -> Result<Vec<TradeRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn get(&self, _: &UserId, _: &TradeId) -> Result<Option<TradeRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn insert(&self, _: TradeRecord) -> Result<TradeId, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn update(&self, _: TradeRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn delete(&self, _: &UserId, _: &TradeId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn bdd_scenario_forex_trade_metrics() {
    // GIVEN a long EURUSD trade from 1.0850 to 1.0950 with a 1.0800 stop
    let svc = service(vec![eurusd()]);

    // WHEN its metrics are requested
    let view = svc
        .trade_metrics(&user(), &TradeId::new("fx-1"))
        .expect("trade exists");

    // THEN gross 100, net 95, risk 50 and R = 2
    let m = view.metrics.expect("computed metrics");
    assert_eq!(view.metric_source, MetricSource::Computed);
    assert!(approx(m.gross_pnl, 100.0));
    assert!(approx(m.net_pnl, 95.0));
    assert!(approx(m.risk_amount, 50.0));
    assert!(approx(m.r_multiple.unwrap(), 2.0));
    // AND the account risk is 0.5% of a 10k balance
    assert!(approx(m.account_risk_percent.unwrap(), 0.5));
    assert_eq!(m.holding_minutes, Some(480));
}

#[test]
fn bdd_scenario_profit_factor_and_unbounded() {
    // GIVEN winners totalling 300 and losers totalling 150
    let svc = service(vec![
        trade("a", at(4, 9), 200.0),
        trade("b", at(4, 10), -150.0),
        trade("c", at(4, 11), 100.0),
    ]);

    // WHEN the summary is computed
    let stats = svc.summary(&user(), &TradeFilter::default()).unwrap();

    // THEN the profit factor is 2.0
    assert_eq!(stats.profit_factor, ProfitFactor::Ratio(2.0));

    // AND when only the winners are considered it is unbounded
    let winners = TradeFilter {
        outcome: Some(Outcome::Win),
        ..Default::default()
    };
    let stats = svc.summary(&user(), &winners).unwrap();
    assert_eq!(stats.profit_factor, ProfitFactor::Unbounded);
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["profitFactor"], "Infinity");
}

#[test]
fn bdd_scenario_empty_journal() {
    // GIVEN a user with no trades
    let svc = service(vec![]);

    // WHEN every report is requested
    let stats = svc.summary(&user(), &TradeFilter::default()).unwrap();
    let calendar = svc.calendar(&user(), &TradeFilter::default(), None).unwrap();
    let list = svc.trade_list(&user(), &TradeFilter::default()).unwrap();

    // THEN every number is zero and nothing is NaN
    assert_eq!(stats.total_trades, 0);
    assert_eq!(stats.total_pnl, 0.0);
    assert_eq!(stats.win_rate, 0.0);
    assert_eq!(stats.expectancy, 0.0);
    assert_eq!(stats.average_r, 0.0);
    assert_eq!(stats.max_drawdown, 0.0);
    assert_eq!(stats.profit_factor.as_f64(), 0.0);
    assert!(stats.equity_curve.is_empty());
    assert!(calendar.is_empty());
    assert!(list.is_empty());
    // AND the JSON contains no null numbers
    let json = serde_json::to_string(&stats).unwrap();
    assert!(!json.contains("NaN"));
    assert!(!json.contains("null"));
}

#[test]
fn bdd_scenario_streak_sequence() {
    // GIVEN trades +10, +5, 0, -3, -3, +1 on consecutive days
    let pnls = [10.0, 5.0, 0.0, -3.0, -3.0, 1.0];
    let trades = pnls
        .iter()
        .enumerate()
        .map(|(i, p)| trade(&format!("s{i}"), at(4 + i as u32, 9), *p))
        .collect();
    let svc = service(trades);

    // WHEN the summary is computed
    let stats = svc.summary(&user(), &TradeFilter::default()).unwrap();

    // THEN best win 2, worst loss 2, current streak 1 win
    assert_eq!(stats.streaks.best_win_streak, 2);
    assert_eq!(stats.streaks.worst_loss_streak, 2);
    assert_eq!(stats.streaks.current_streak, 1);
    assert_eq!(stats.streaks.current_streak_type, StreakType::Win);
    // AND the breakeven is neither a win nor a loss
    assert_eq!(stats.breakevens, 1);
    assert!(approx(stats.win_rate, 60.0));
}

#[test]
fn bdd_scenario_unrecognized_direction_degrades() {
    // GIVEN a record whose direction was saved as something unknown
    let json = r#"{
        "id": "odd-1",
        "userId": "trader-1",
        "symbol": "BTCUSD",
        "direction": "sideways",
        "assetType": "crypto",
        "entryPrice": 60000,
        "exitPrice": 61000,
        "quantity": 0.1,
        "timestampEntry": "2024-03-05T10:00:00Z",
        "pnl": 100
    }"#;
    let odd: TradeRecord = serde_json::from_str(json).unwrap();
    assert_eq!(odd.direction, Direction::Unrecognized);
    let svc = service(vec![trade("a", at(4, 9), 10.0), odd]);

    // WHEN the trade list and summary are computed
    let list = svc.trade_list(&user(), &TradeFilter::default()).unwrap();
    let stats = svc.summary(&user(), &TradeFilter::default()).unwrap();

    // THEN the record falls back to its stored pnl instead of failing the request
    assert_eq!(list[1].metric_source, MetricSource::Stored);
    assert_eq!(stats.degraded_records, 1);
    assert_eq!(stats.total_trades, 2);
    assert!(approx(stats.total_pnl, 110.0));
}

#[test]
fn bdd_scenario_record_without_fallback_is_excluded() {
    // GIVEN a malformed record with no stored pnl
    let mut broken = trade("bad", at(5, 9), 0.0);
    broken.quantity = 0.0;
    broken.pnl = None;
    let svc = service(vec![trade("a", at(4, 9), 10.0), broken]);

    // WHEN the summary and calendar are computed
    let stats = svc.summary(&user(), &TradeFilter::default()).unwrap();
    let calendar = svc.calendar(&user(), &TradeFilter::default(), None).unwrap();

    // THEN the record is skipped but still listed
    assert_eq!(stats.skipped_records, 1);
    assert_eq!(stats.total_trades, 1);
    assert_eq!(calendar.len(), 1);
    let list = svc.trade_list(&user(), &TradeFilter::default()).unwrap();
    assert_eq!(list[1].metric_source, MetricSource::Unavailable);
    assert!(list[1].metrics.is_none());
}

#[test]
fn bdd_scenario_store_unavailable_fails_the_request() {
    // GIVEN a store that cannot be reached
    let svc = AnalyticsService::new(DownStore, AnalyticsOptions::default());

    // WHEN any report is requested
    let summary = svc.summary(&user(), &TradeFilter::default());
    let single = svc.trade_metrics(&user(), &TradeId::new("x"));

    // THEN the store failure surfaces to the caller
    assert!(matches!(
        summary,
        Err(AnalyticsError::Store(StoreError::Unavailable(_)))
    ));
    assert!(matches!(
        single,
        Err(AnalyticsError::Store(StoreError::Unavailable(_)))
    ));
}

#[test]
fn bdd_scenario_weekday_buckets_sum_to_total() {
    // GIVEN two weeks of trades, one of them open
    let mut trades: Vec<TradeRecord> = (4..18)
        .map(|d| trade(&format!("d{d}"), at(d, 14), (d % 5) as f64 - 2.0))
        .collect();
    let mut open = trade("open", at(18, 9), 0.0);
    open.exit_price = None;
    open.pnl = None;
    trades.push(open);
    let svc = service(trades);

    // WHEN the summary is computed
    let stats = svc.summary(&user(), &TradeFilter::default()).unwrap();

    // THEN weekday bucket counts sum to the number of closed trades
    let counted: usize = stats.breakdowns.by_weekday.values().map(|b| b.count).sum();
    assert_eq!(counted, stats.total_trades);
    assert_eq!(stats.total_trades, 14);
    // AND the open trade only shows up as exposure
    assert_eq!(stats.exposure.open_trades, 1);
}

#[test]
fn bdd_scenario_configured_offset_moves_dates() {
    // GIVEN a trade entered late Sunday UTC
    let trades = vec![trade("late", at(10, 23), 5.0)];
    let store = InMemoryTradeStore::with_trades(trades).unwrap();

    // AND a trader two hours east of UTC
    let options = AnalyticsOptions {
        utc_offset: FixedOffset::east_opt(2 * 3600).unwrap(),
        ..Default::default()
    };
    let svc = AnalyticsService::new(store, options);

    // WHEN the weekday breakdown and calendar are computed
    let weekdays = svc
        .breakdown(&user(), &TradeFilter::default(), Dimension::Weekday)
        .unwrap();
    let calendar = svc.calendar(&user(), &TradeFilter::default(), None).unwrap();

    // THEN the trade lands on Monday the 11th
    assert!(weekdays.contains_key("Monday"));
    assert_eq!(calendar[0].date, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());

    // AND a local date filter for the 11th finds it
    let filter = TradeFilter {
        from: NaiveDate::from_ymd_opt(2024, 3, 11),
        to: NaiveDate::from_ymd_opt(2024, 3, 11),
        ..Default::default()
    };
    assert_eq!(svc.trade_list(&user(), &filter).unwrap().len(), 1);
}

#[test]
fn bdd_scenario_daily_equity_curve_and_drawdown() {
    // GIVEN three trading days
    let svc = service(vec![
        trade("a", at(4, 9), 100.0),
        trade("b", at(4, 15), -30.0),
        trade("c", at(5, 9), -50.0),
        trade("d", at(6, 9), 40.0),
    ]);

    // WHEN a daily equity curve is requested
    let curve = svc
        .equity_curve(&user(), &TradeFilter::default(), Some(Granularity::Day))
        .unwrap();

    // THEN each day is a point with the running total
    let labels: Vec<&str> = curve.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["2024-03-04", "2024-03-05", "2024-03-06"]);
    let cumulative: Vec<f64> = curve.iter().map(|p| p.cumulative_pnl).collect();
    assert_eq!(cumulative, vec![70.0, 20.0, 60.0]);

    // AND the drawdown is measured per trade from the 100 peak
    let stats = svc.summary(&user(), &TradeFilter::default()).unwrap();
    assert!(approx(stats.max_drawdown, 80.0));
}
