//! Domain types for the trade journal

pub mod ids;
pub mod instrument;
pub mod trade;

pub use ids::{PortfolioId, StrategyId, TradeId, UserId};
pub use instrument::{AssetType, ClassificationError, Direction, SetupGrade};
pub use trade::TradeRecord;
