//! Per-trade metrics: a pure function from one trade to its derived figures.
//!
//! Sign convention: for a long trade reward per unit is `exit - entry`, for a
//! short trade `entry - exit`. Risk per unit is `|entry - stop|` regardless of
//! direction. Nothing here touches the store.

use crate::domain::TradeRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed single-trade input.
///
/// Callers decide how to recover; the analytics layer degrades the one record
/// to its stored pnl instead of failing the whole request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidTradeInput {
    #[error("unrecognized trade direction (expected long or short)")]
    UnrecognizedDirection,

    #[error("{field} is not a finite number: {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

/// Per-trade parameters that feed the risk side of the computation.
///
/// A zero stop or target is treated as "not set": journal forms persist an
/// empty field as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskParams {
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub portfolio_balance: Option<f64>,
    pub fees: f64,
}

impl RiskParams {
    pub fn from_trade(trade: &TradeRecord) -> Self {
        Self {
            stop_loss: trade.stop_loss,
            take_profit: trade.take_profit,
            portfolio_balance: trade.portfolio_balance,
            fees: trade.fees,
        }
    }
}

/// Derived metrics for a single trade. Never persisted; recomputed on read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMetrics {
    pub gross_pnl: f64,
    pub net_pnl: f64,
    /// `|entry - stop| * quantity`, 0 without a stop.
    pub risk_amount: f64,
    /// Realized reward as a multiple of risk per unit. `None` when risk is 0.
    pub r_multiple: Option<f64>,
    /// `risk_amount / balance * 100`. `None` when balance is absent or ≤ 0.
    pub account_risk_percent: Option<f64>,
    /// Planned `|target - entry| / |entry - stop|`.
    pub planned_reward_risk: Option<f64>,
    /// `net_pnl / balance * 100`.
    pub return_percent: Option<f64>,
    pub holding_minutes: Option<i64>,
    pub is_closed: bool,
}

impl TradeMetrics {
    /// Metrics built from a stored pnl when prices cannot be trusted.
    ///
    /// Only the P&L fields are populated; everything risk-based is unknown.
    pub fn from_stored_pnl(pnl: f64, fees: f64) -> Self {
        let fees = if fees.is_finite() { fees } else { 0.0 };
        Self {
            gross_pnl: pnl + fees,
            net_pnl: pnl,
            risk_amount: 0.0,
            r_multiple: None,
            account_risk_percent: None,
            planned_reward_risk: None,
            return_percent: None,
            holding_minutes: None,
            is_closed: true,
        }
    }

    pub fn is_win(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.net_pnl < 0.0
    }
}

/// Compute derived metrics for one trade.
///
/// An open trade (no exit price) yields zero realized P&L and no R-multiple;
/// its risk figures are still computed.
pub fn compute_trade_metrics(
    trade: &TradeRecord,
    params: &RiskParams,
) -> Result<TradeMetrics, InvalidTradeInput> {
    let sign = trade
        .direction
        .sign()
        .ok_or(InvalidTradeInput::UnrecognizedDirection)?;
    let entry = positive("entryPrice", trade.entry_price)?;
    let quantity = positive("quantity", trade.quantity)?;
    let exit = trade.exit_price.map(|p| positive("exitPrice", p)).transpose()?;
    let stop = optional_level("stopLoss", params.stop_loss)?;
    let target = optional_level("takeProfit", params.take_profit)?;
    let fees = params.fees;
    if !fees.is_finite() {
        return Err(InvalidTradeInput::NonFinite { field: "fees", value: fees });
    }
    if fees < 0.0 {
        return Err(InvalidTradeInput::Negative { field: "fees", value: fees });
    }

    let risk_per_unit = stop.map(|s| (entry - s).abs()).unwrap_or(0.0);
    let risk_amount = risk_per_unit * quantity;
    let balance = params
        .portfolio_balance
        .filter(|b| b.is_finite() && *b > 0.0);
    let account_risk_percent = balance.map(|b| risk_amount / b * 100.0);
    let planned_reward_risk = match target {
        Some(t) if risk_per_unit > 0.0 => Some((t - entry).abs() / risk_per_unit),
        _ => None,
    };

    let Some(exit) = exit else {
        return Ok(TradeMetrics {
            gross_pnl: 0.0,
            net_pnl: 0.0,
            risk_amount,
            r_multiple: None,
            account_risk_percent,
            planned_reward_risk,
            return_percent: None,
            holding_minutes: None,
            is_closed: false,
        });
    };

    let reward_per_unit = (exit - entry) * sign;
    let gross_pnl = reward_per_unit * quantity;
    let net_pnl = gross_pnl - fees;
    let r_multiple = (risk_per_unit > 0.0).then(|| reward_per_unit / risk_per_unit);
    let holding_minutes = trade
        .exit_time
        .map(|x| (x - trade.entry_time).num_minutes())
        .filter(|m| *m >= 0);

    Ok(TradeMetrics {
        gross_pnl,
        net_pnl,
        risk_amount,
        r_multiple,
        account_risk_percent,
        planned_reward_risk,
        return_percent: balance.map(|b| net_pnl / b * 100.0),
        holding_minutes,
        is_closed: true,
    })
}

fn positive(field: &'static str, value: f64) -> Result<f64, InvalidTradeInput> {
    if !value.is_finite() {
        return Err(InvalidTradeInput::NonFinite { field, value });
    }
    if value <= 0.0 {
        return Err(InvalidTradeInput::NonPositive { field, value });
    }
    Ok(value)
}

fn optional_level(field: &'static str, value: Option<f64>) -> Result<Option<f64>, InvalidTradeInput> {
    match value {
        None => Ok(None),
        Some(v) if v == 0.0 => Ok(None),
        Some(v) => positive(field, v).map(Some),
    }
}
