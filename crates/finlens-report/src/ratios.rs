//! Ratio engine
//!
//! Pure arithmetic over [`RawFinancials`]: no I/O, no shared state, and the
//! input is never modified. Every ratio whose denominator is zero or negative
//! is reported as 0, so a [`RatioRecord`] only ever holds finite numbers.

use crate::error::Result;
use crate::financials::{RawFinancials, UNKNOWN_COMPANY};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Standard ratios for one company
///
/// Percentages and ratios are rounded to two decimals; the totals are passed
/// through unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioRecord {
    pub company: String,
    pub source_file: String,

    // Profitability
    pub net_profit_margin_percent: f64,
    pub return_on_equity_percent: f64,
    pub return_on_assets_percent: f64,

    // Liquidity
    pub current_ratio: f64,

    // Leverage
    pub debt_to_equity_ratio: f64,

    // Efficiency
    pub asset_turnover_ratio: f64,

    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
    pub total_revenue: f64,
    pub net_profit: f64,
}

impl Default for RatioRecord {
    fn default() -> Self {
        Self {
            company: UNKNOWN_COMPANY.to_string(),
            source_file: String::new(),
            net_profit_margin_percent: 0.0,
            return_on_equity_percent: 0.0,
            return_on_assets_percent: 0.0,
            current_ratio: 0.0,
            debt_to_equity_ratio: 0.0,
            asset_turnover_ratio: 0.0,
            total_assets: 0.0,
            total_liabilities: 0.0,
            total_equity: 0.0,
            total_revenue: 0.0,
            net_profit: 0.0,
        }
    }
}

/// Approximate total assets
///
/// Uses `net_worth + liabilities` when net worth is positive and
/// `equity + liabilities` otherwise. This is a heuristic: reports that state
/// net worth as something other than assets minus liabilities will skew it.
pub fn total_assets(raw: &RawFinancials) -> f64 {
    if raw.net_worth > 0.0 {
        raw.net_worth + raw.liabilities
    } else {
        raw.equity + raw.liabilities
    }
}

/// Compute every ratio for one company
pub fn compute(raw: &RawFinancials) -> RatioRecord {
    let assets = total_assets(raw);
    let liabilities = raw.liabilities;
    let equity = raw.equity;
    let revenue = raw.profit_and_loss.total_revenue;
    let net_profit = raw.profit_and_loss.net_profit_or_loss;

    RatioRecord {
        company: raw.company.clone(),
        source_file: raw.source_file.clone(),
        net_profit_margin_percent: round2(guarded_ratio(net_profit, revenue) * 100.0),
        return_on_equity_percent: round2(guarded_ratio(net_profit, equity) * 100.0),
        return_on_assets_percent: round2(guarded_ratio(net_profit, assets) * 100.0),
        current_ratio: round2(guarded_ratio(assets, liabilities)),
        debt_to_equity_ratio: round2(guarded_ratio(liabilities, equity)),
        asset_turnover_ratio: round2(guarded_ratio(revenue, assets)),
        total_assets: finite_or_zero(assets),
        total_liabilities: liabilities,
        total_equity: equity,
        total_revenue: revenue,
        net_profit,
    }
}

/// Decode a loosely typed mapping and compute its ratios
pub fn compute_value(value: &serde_json::Value) -> Result<RatioRecord> {
    let raw = RawFinancials::from_value(value)?;
    Ok(compute(&raw))
}

/// Round to two decimals, halves away from zero
///
/// Works on the shortest decimal form of the float, so `1.005` becomes `1.01`
/// even though its binary value sits slightly below the midpoint.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    // Already integral at this magnitude
    if value.abs() >= 1e15 {
        return value;
    }

    let rounded = Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| (value * 100.0).round() / 100.0);

    // Normalize -0.0
    if rounded.abs() < f64::EPSILON { 0.0 } else { rounded }
}

/// `numerator / denominator`, or 0 when the denominator is not positive
fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        finite_or_zero(numerator / denominator)
    } else {
        0.0
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
