//! Fixture builders shared by the unit tests.

use chrono::{DateTime, TimeZone, Utc};
use tradelog_core::domain::{AssetType, Direction, TradeId, TradeRecord, UserId};

/// 2024-03-`day` at `hour`:00 UTC. March 4th 2024 is a Monday.
pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

/// A closed long stock trade whose net P&L is exactly `net_pnl`.
pub fn closed_trade(id: &str, entry_time: DateTime<Utc>, net_pnl: f64) -> TradeRecord {
    let mut t = TradeRecord::open(
        UserId::new("u-1"),
        "AAPL",
        Direction::Long,
        AssetType::Stock,
        1000.0,
        1.0,
        entry_time,
    );
    t.id = TradeId::new(id);
    t.exit_price = Some(1000.0 + net_pnl);
    t.exit_time = Some(entry_time + chrono::Duration::hours(1));
    t.pnl = Some(net_pnl);
    t
}

pub fn open_trade(id: &str, entry_time: DateTime<Utc>) -> TradeRecord {
    let mut t = closed_trade(id, entry_time, 0.0);
    t.exit_price = None;
    t.exit_time = None;
    t.pnl = None;
    t
}
