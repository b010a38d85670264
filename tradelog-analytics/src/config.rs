//! Analytics configuration (TOML) and the runtime options derived from it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradelog_core::domain::StrategyId;

use crate::equity::Granularity;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid utc_offset '{0}' (expected Z, UTC or ±HH:MM)")]
    InvalidOffset(String),
}

/// On-disk analytics configuration.
///
/// ```toml
/// utc_offset = "+02:00"
/// equity_granularity = "day"
/// store_path = "trades.jsonl"
///
/// [strategies]
/// s-1 = "London Breakout"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Zone used for weekday, calendar and date-filter bucketing.
    pub utc_offset: String,
    pub equity_granularity: Granularity,
    pub store_path: Option<PathBuf>,
    /// Strategy id → display name.
    pub strategies: HashMap<String, String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            utc_offset: "+00:00".into(),
            equity_granularity: Granularity::Trade,
            store_path: None,
            strategies: HashMap::new(),
        }
    }
}

impl AnalyticsConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        // Reject a bad offset at load time rather than on first request.
        parse_utc_offset(&config.utc_offset)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_options(&self) -> Result<AnalyticsOptions, ConfigError> {
        Ok(AnalyticsOptions {
            utc_offset: parse_utc_offset(&self.utc_offset)?,
            granularity: self.equity_granularity,
            strategy_names: self
                .strategies
                .iter()
                .map(|(id, name)| (StrategyId::new(id.clone()), name.clone()))
                .collect(),
        })
    }
}

/// Options every aggregation call takes.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsOptions {
    pub utc_offset: FixedOffset,
    pub granularity: Granularity,
    pub strategy_names: HashMap<StrategyId, String>,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            granularity: Granularity::Trade,
            strategy_names: HashMap::new(),
        }
    }
}

impl AnalyticsOptions {
    /// Display name for a strategy: configured name, else the raw id.
    pub fn strategy_label(&self, id: Option<&StrategyId>) -> String {
        match id {
            None => UNASSIGNED_STRATEGY.to_string(),
            Some(id) => self
                .strategy_names
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.to_string()),
        }
    }
}

/// Breakdown key for trades without a strategy.
pub const UNASSIGNED_STRATEGY: &str = "Unassigned";

/// Parse `Z`, `UTC` or `±HH:MM` / `±HHMM`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidOffset(s.to_string());
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
