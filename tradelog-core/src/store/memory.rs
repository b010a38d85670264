//! In-memory trade store.

use std::sync::RwLock;

use super::{assign_id, StoreError, TradeQuery, TradeStore};
use crate::domain::{TradeId, TradeRecord, UserId};

#[derive(Debug, Default)]
struct Inner {
    trades: Vec<TradeRecord>,
    next_sequence: u64,
}

/// Vec-backed store behind an `RwLock`. Keeps insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    inner: RwLock<Inner>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-loaded with `trades`, keeping their order.
    pub fn with_trades(trades: impl IntoIterator<Item = TradeRecord>) -> Result<Self, StoreError> {
        let store = Self::new();
        for trade in trades {
            store.insert(trade)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.trades.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".into())
}

impl TradeStore for InMemoryTradeStore {
    fn find(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, StoreError> {
        let guard = self.inner.read().map_err(poisoned)?;
        Ok(guard
            .trades
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    fn get(&self, user: &UserId, id: &TradeId) -> Result<Option<TradeRecord>, StoreError> {
        let guard = self.inner.read().map_err(poisoned)?;
        Ok(guard
            .trades
            .iter()
            .find(|t| &t.user_id == user && &t.id == id)
            .cloned())
    }

    fn insert(&self, mut trade: TradeRecord) -> Result<TradeId, StoreError> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        let start = guard.next_sequence;
        let trades = &guard.trades;
        let next = assign_id(&mut trade, start, |id| trades.iter().any(|t| &t.id == id));
        guard.next_sequence = next.max(start + 1);
        if guard.trades.iter().any(|t| t.id == trade.id) {
            return Err(StoreError::Duplicate(trade.id));
        }
        let id = trade.id.clone();
        guard.trades.push(trade);
        Ok(id)
    }

    fn update(&self, trade: TradeRecord) -> Result<(), StoreError> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        let slot = guard
            .trades
            .iter_mut()
            .find(|t| t.user_id == trade.user_id && t.id == trade.id)
            .ok_or_else(|| StoreError::NotFound(trade.id.clone()))?;
        *slot = trade;
        Ok(())
    }

    fn delete(&self, user: &UserId, id: &TradeId) -> Result<(), StoreError> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        let before = guard.trades.len();
        guard.trades.retain(|t| !(&t.user_id == user && &t.id == id));
        if guard.trades.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssetType, Direction};
    use chrono::{TimeZone, Utc};

    fn trade(user: &str, symbol: &str) -> TradeRecord {
        TradeRecord::open(
            UserId::new(user),
            symbol,
            Direction::Long,
            AssetType::Stock,
            100.0,
            10.0,
            Utc.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).unwrap(),
        )
    }

    #[test]
    fn insert_assigns_distinct_ids_and_keeps_order() {
        let store = InMemoryTradeStore::new();
        let a = store.insert(trade("u-1", "AAPL")).unwrap();
        let b = store.insert(trade("u-1", "MSFT")).unwrap();
        assert_ne!(a, b);

        let found = store.find(&TradeQuery::for_user(&UserId::new("u-1"))).unwrap();
        let symbols: Vec<_> = found.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn duplicate_explicit_id_is_rejected() {
        let store = InMemoryTradeStore::new();
        let mut t = trade("u-1", "AAPL");
        t.id = TradeId::new("fixed");
        store.insert(t.clone()).unwrap();
        assert!(matches!(store.insert(t), Err(StoreError::Duplicate(_))));
    }

    #[test]
    fn update_and_delete_are_scoped_to_owner() {
        let store = InMemoryTradeStore::new();
        let id = store.insert(trade("u-1", "AAPL")).unwrap();
        let other = UserId::new("u-2");

        assert!(store.get(&other, &id).unwrap().is_none());
        assert!(matches!(store.delete(&other, &id), Err(StoreError::NotFound(_))));

        let mut t = store.get(&UserId::new("u-1"), &id).unwrap().unwrap();
        t.exit_price = Some(110.0);
        t.pnl = Some(100.0);
        store.update(t).unwrap();
        let reloaded = store.get(&UserId::new("u-1"), &id).unwrap().unwrap();
        assert_eq!(reloaded.pnl, Some(100.0));

        store.delete(&UserId::new("u-1"), &id).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn update_missing_trade_is_not_found() {
        let store = InMemoryTradeStore::new();
        let mut t = trade("u-1", "AAPL");
        t.id = TradeId::new("nope");
        assert!(matches!(store.update(t), Err(StoreError::NotFound(_))));
    }
}
