//! TradeLog Core: domain types, per-trade metrics, trade store.
//!
//! This crate contains the pieces every report builds on:
//! - Domain types (trade records, ids, direction, asset type, setup grade)
//! - The per-trade metrics function (P&L, risk, R-multiple)
//! - The `TradeStore` port with in-memory and JSONL implementations
//! - Filter → query translation
//! - CSV import

pub mod domain;
pub mod import;
pub mod metrics;
pub mod store;

pub use metrics::{compute_trade_metrics, InvalidTradeInput, RiskParams, TradeMetrics};
pub use store::{StoreError, TradeFilter, TradeQuery, TradeStore};
