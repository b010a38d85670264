//! Trade store trait and structured error types.
//!
//! The `TradeStore` trait abstracts over where journal entries live (an
//! in-memory map, a JSONL file, a document database) so the analytics layer can
//! be handed any of them and tests can run against fixtures.

pub mod jsonl;
pub mod memory;
pub mod query;

pub use jsonl::JsonlTradeStore;
pub use memory::InMemoryTradeStore;
pub use query::{Outcome, TradeFilter, TradeQuery};

use crate::domain::{TradeId, TradeRecord, UserId};
use thiserror::Error;

/// Structured error types for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("trade store unavailable: {0}")]
    Unavailable(String),

    #[error("trade not found: {0}")]
    NotFound(TradeId),

    #[error("trade already exists: {0}")]
    Duplicate(TradeId),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the store itself failed, as opposed to a bad request against it.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Io(_) | StoreError::Serialization(_)
        )
    }
}

/// Persistence port for journal entries.
///
/// Implementations must return `find` results in insertion order; calendar
/// emotion ordering depends on it.
pub trait TradeStore: Send + Sync {
    /// All trades matching `query`, in insertion order.
    fn find(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, StoreError>;

    /// One trade owned by `user`.
    fn get(&self, user: &UserId, id: &TradeId) -> Result<Option<TradeRecord>, StoreError>;

    /// Insert a trade. An empty id is replaced by a derived one.
    fn insert(&self, trade: TradeRecord) -> Result<TradeId, StoreError>;

    /// Replace an existing trade with the same user and id.
    fn update(&self, trade: TradeRecord) -> Result<(), StoreError>;

    fn delete(&self, user: &UserId, id: &TradeId) -> Result<(), StoreError>;
}

impl<S: TradeStore + ?Sized> TradeStore for std::sync::Arc<S> {
    fn find(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, StoreError> {
        (**self).find(query)
    }

    fn get(&self, user: &UserId, id: &TradeId) -> Result<Option<TradeRecord>, StoreError> {
        (**self).get(user, id)
    }

    fn insert(&self, trade: TradeRecord) -> Result<TradeId, StoreError> {
        (**self).insert(trade)
    }

    fn update(&self, trade: TradeRecord) -> Result<(), StoreError> {
        (**self).update(trade)
    }

    fn delete(&self, user: &UserId, id: &TradeId) -> Result<(), StoreError> {
        (**self).delete(user, id)
    }
}

/// Give `trade` a derived id if it has none, starting at `sequence` and
/// stepping past ids for which `taken` holds. Returns the next free sequence.
pub(crate) fn assign_id(
    trade: &mut TradeRecord,
    mut sequence: u64,
    taken: impl Fn(&TradeId) -> bool,
) -> u64 {
    if !trade.id.is_empty() {
        return sequence;
    }
    let entry_time = trade.entry_time.to_rfc3339();
    loop {
        let id = TradeId::derive(&trade.user_id, &entry_time, sequence);
        sequence += 1;
        if !taken(&id) {
            trade.id = id;
            return sequence;
        }
    }
}
