// 5.0: the fifteen economic knobs of a market, in their canonical order.
// governance edits them one slot at a time; every slot is bounded and the
// cross-parameter leverage guard keeps a fresh max-leverage position from
// being instantly liquidatable.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered index into the parameter set. The discriminant is the wire/storage
/// slot, so the order here is part of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskParamKind {
    K = 0,
    Lambda = 1,
    Delta = 2,
    CapPayoff = 3,
    CapNotional = 4,
    CapLeverage = 5,
    CircuitBreakerWindow = 6,
    CircuitBreakerMintTarget = 7,
    MaintenanceMarginFraction = 8,
    MaintenanceMarginBurnRate = 9,
    LiquidationFeeRate = 10,
    TradingFeeRate = 11,
    MinCollateral = 12,
    PriceDriftUpperLimit = 13,
    AverageBlockTime = 14,
}

pub const PARAM_COUNT: usize = 15;

impl RiskParamKind {
    pub const ALL: [RiskParamKind; PARAM_COUNT] = [
        Self::K,
        Self::Lambda,
        Self::Delta,
        Self::CapPayoff,
        Self::CapNotional,
        Self::CapLeverage,
        Self::CircuitBreakerWindow,
        Self::CircuitBreakerMintTarget,
        Self::MaintenanceMarginFraction,
        Self::MaintenanceMarginBurnRate,
        Self::LiquidationFeeRate,
        Self::TradingFeeRate,
        Self::MinCollateral,
        Self::PriceDriftUpperLimit,
        Self::AverageBlockTime,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Global [min, max] bounds, enforced by governance before any edit
    /// reaches a market.
    pub fn bounds(&self) -> (Decimal, Decimal) {
        match self {
            // funding decay rate per second
            Self::K => (Decimal::ZERO, dec!(0.01)),
            // market impact slope on cap-normalized volume
            Self::Lambda => (Decimal::ZERO, dec!(5)),
            // static half-spread
            Self::Delta => (Decimal::ZERO, dec!(0.02)),
            Self::CapPayoff => (Decimal::ONE, dec!(10)),
            Self::CapNotional => (Decimal::ZERO, dec!(8_000_000)),
            Self::CapLeverage => (Decimal::ONE, dec!(20)),
            // one day to one year, in seconds
            Self::CircuitBreakerWindow => (dec!(86_400), dec!(31_536_000)),
            Self::CircuitBreakerMintTarget => (Decimal::ZERO, dec!(8_000_000)),
            Self::MaintenanceMarginFraction => (dec!(0.001), dec!(0.2)),
            Self::MaintenanceMarginBurnRate => (Decimal::ZERO, Decimal::ONE),
            Self::LiquidationFeeRate => (dec!(0.001), dec!(0.1)),
            Self::TradingFeeRate => (Decimal::ZERO, dec!(0.003)),
            Self::MinCollateral => (Decimal::ZERO, Decimal::ONE),
            Self::PriceDriftUpperLimit => (Decimal::ZERO, dec!(0.001)),
            Self::AverageBlockTime => (Decimal::ONE, dec!(3600)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("param {kind:?} value {value} outside [{min}, {max}]")]
    OutOfBounds {
        kind: RiskParamKind,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("param edit would make a max-leverage position instantly liquidatable")]
    MaxLeverageUnsafe,

    #[error("no param at index {0}")]
    UnknownIndex(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
    pub k: Decimal,
    pub lambda: Decimal,
    pub delta: Decimal,
    pub cap_payoff: Decimal,
    pub cap_notional: Decimal,
    pub cap_leverage: Decimal,
    pub circuit_breaker_window: Decimal,
    pub circuit_breaker_mint_target: Decimal,
    pub maintenance_margin_fraction: Decimal,
    pub maintenance_margin_burn_rate: Decimal,
    pub liquidation_fee_rate: Decimal,
    pub trading_fee_rate: Decimal,
    pub min_collateral: Decimal,
    pub price_drift_upper_limit: Decimal,
    pub average_block_time: Decimal,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            k: dec!(0.0000012),
            lambda: dec!(0.6),
            delta: dec!(0.0025),
            cap_payoff: dec!(5),
            cap_notional: dec!(800_000),
            cap_leverage: dec!(5),
            circuit_breaker_window: dec!(2_592_000), // 30 days
            circuit_breaker_mint_target: dec!(66_670),
            maintenance_margin_fraction: dec!(0.01),
            maintenance_margin_burn_rate: dec!(0.5),
            liquidation_fee_rate: dec!(0.05),
            trading_fee_rate: dec!(0.00075),
            min_collateral: dec!(0.0001),
            price_drift_upper_limit: dec!(0.00001),
            average_block_time: dec!(12),
        }
    }
}

impl RiskParams {
    pub fn get(&self, kind: RiskParamKind) -> Decimal {
        match kind {
            RiskParamKind::K => self.k,
            RiskParamKind::Lambda => self.lambda,
            RiskParamKind::Delta => self.delta,
            RiskParamKind::CapPayoff => self.cap_payoff,
            RiskParamKind::CapNotional => self.cap_notional,
            RiskParamKind::CapLeverage => self.cap_leverage,
            RiskParamKind::CircuitBreakerWindow => self.circuit_breaker_window,
            RiskParamKind::CircuitBreakerMintTarget => self.circuit_breaker_mint_target,
            RiskParamKind::MaintenanceMarginFraction => self.maintenance_margin_fraction,
            RiskParamKind::MaintenanceMarginBurnRate => self.maintenance_margin_burn_rate,
            RiskParamKind::LiquidationFeeRate => self.liquidation_fee_rate,
            RiskParamKind::TradingFeeRate => self.trading_fee_rate,
            RiskParamKind::MinCollateral => self.min_collateral,
            RiskParamKind::PriceDriftUpperLimit => self.price_drift_upper_limit,
            RiskParamKind::AverageBlockTime => self.average_block_time,
        }
    }

    /// Raw slot write. Callers go through `checked_set` unless they have
    /// already run the bounds + guard checks themselves.
    pub fn set(&mut self, kind: RiskParamKind, value: Decimal) {
        match kind {
            RiskParamKind::K => self.k = value,
            RiskParamKind::Lambda => self.lambda = value,
            RiskParamKind::Delta => self.delta = value,
            RiskParamKind::CapPayoff => self.cap_payoff = value,
            RiskParamKind::CapNotional => self.cap_notional = value,
            RiskParamKind::CapLeverage => self.cap_leverage = value,
            RiskParamKind::CircuitBreakerWindow => self.circuit_breaker_window = value,
            RiskParamKind::CircuitBreakerMintTarget => self.circuit_breaker_mint_target = value,
            RiskParamKind::MaintenanceMarginFraction => self.maintenance_margin_fraction = value,
            RiskParamKind::MaintenanceMarginBurnRate => self.maintenance_margin_burn_rate = value,
            RiskParamKind::LiquidationFeeRate => self.liquidation_fee_rate = value,
            RiskParamKind::TradingFeeRate => self.trading_fee_rate = value,
            RiskParamKind::MinCollateral => self.min_collateral = value,
            RiskParamKind::PriceDriftUpperLimit => self.price_drift_upper_limit = value,
            RiskParamKind::AverageBlockTime => self.average_block_time = value,
        }
    }

    /// Bounds check, apply, then re-verify the leverage guard when the slot
    /// participates in it. Rolls back on guard failure.
    pub fn checked_set(&mut self, kind: RiskParamKind, value: Decimal) -> Result<(), ParamError> {
        let (min, max) = kind.bounds();
        if value < min || value > max {
            return Err(ParamError::OutOfBounds {
                kind,
                value,
                min,
                max,
            });
        }

        let previous = self.get(kind);
        self.set(kind, value);

        let guarded = matches!(
            kind,
            RiskParamKind::Delta
                | RiskParamKind::CapLeverage
                | RiskParamKind::MaintenanceMarginFraction
        );
        if guarded && !self.max_leverage_is_safe() {
            self.set(kind, previous);
            return Err(ParamError::MaxLeverageUnsafe);
        }
        Ok(())
    }

    /// A position opened at cap_leverage must survive its own entry: the
    /// spread eats 2*delta of notional and the margin requirement plus the
    /// liquidation fee must still be covered by 1/leverage of collateral.
    pub fn max_leverage_is_safe(&self) -> bool {
        let one = Decimal::ONE;
        let denom =
            dec!(2) * self.delta + self.maintenance_margin_fraction / (one - self.liquidation_fee_rate);
        if denom <= Decimal::ZERO {
            return true;
        }
        self.cap_leverage <= one / denom
    }

    /// Ordered 15-slot view, index-aligned with `RiskParamKind`.
    pub fn as_array(&self) -> [Decimal; PARAM_COUNT] {
        let mut out = [Decimal::ZERO; PARAM_COUNT];
        for kind in RiskParamKind::ALL {
            out[kind.index()] = self.get(kind);
        }
        out
    }

    /// Validate every slot of a freshly proposed parameter set.
    pub fn validate(&self) -> Result<(), ParamError> {
        for kind in RiskParamKind::ALL {
            let value = self.get(kind);
            let (min, max) = kind.bounds();
            if value < min || value > max {
                return Err(ParamError::OutOfBounds {
                    kind,
                    value,
                    min,
                    max,
                });
            }
        }
        if !self.max_leverage_is_safe() {
            return Err(ParamError::MaxLeverageUnsafe);
        }
        Ok(())
    }
}
