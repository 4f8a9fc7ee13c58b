// 9.0.2: result types and the error taxonomy for engine operations.
// every failure is a distinct variant so callers can branch programmatically,
// and every one is raised before any state mutates.

use crate::feed::FeedError;
use crate::fixed_point::MathError;
use crate::params::ParamError;
use crate::position::PositionError;
use crate::tick::TickError;
use crate::token::TokenError;
use crate::types::{AccountId, PositionId};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub position_id: PositionId,
    pub price: Decimal,
    pub oi: Decimal,
    pub debt: Decimal,
    pub collateral: Decimal,
    pub trading_fee: Decimal,
}

#[derive(Debug, Clone)]
pub struct UnwindResult {
    pub price: Decimal,
    pub value: Decimal,
    pub cost: Decimal,
    pub trading_fee: Decimal,
    /// Net supply effect: value - cost - trading fee. Negative on a loss.
    pub mint: Decimal,
    /// Whether the position was fully closed by this unwind.
    pub closed: bool,
}

#[derive(Debug, Clone)]
pub struct LiquidateResult {
    pub price: Decimal,
    pub value: Decimal,
    pub cost: Decimal,
    pub liquidation_fee: Decimal,
    pub margin_burned: Decimal,
    pub margin_to_fee_recipient: Decimal,
    /// Net supply effect: value - cost - burned margin. Never positive.
    pub mint: Decimal,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    // market-state guards
    #[error("market is shut down")]
    Shutdown,

    #[error("open interest {oi} above cap {cap}")]
    OiAboveCap { oi: Decimal, cap: Decimal },

    // input validation
    #[error("leverage {leverage} outside [1, {max}]")]
    LeverageOutOfBounds { leverage: Decimal, max: Decimal },

    #[error("collateral {collateral} below minimum {minimum}")]
    CollateralBelowMinimum { collateral: Decimal, minimum: Decimal },

    #[error("fraction {0} outside (0, 1]")]
    InvalidFraction(Decimal),

    // slippage
    #[error("execution price {price} breaches limit {limit}")]
    SlippageExceeded { price: Decimal, limit: Decimal },

    #[error("market impact exponent above domain ceiling")]
    SlippageOverflow,

    // authorization / existence
    #[error("no position {1:?} for owner {0:?}")]
    PositionNotFound(AccountId, PositionId),

    #[error("position {0:?} already liquidated")]
    PositionLiquidated(PositionId),

    #[error("position {0:?} not liquidatable")]
    NotLiquidatable(PositionId),

    // propagated hard failures
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("position error: {0}")]
    Position(#[from] PositionError),

    #[error("tick error: {0}")]
    Tick(#[from] TickError),

    #[error("math error: {0}")]
    Math(#[from] MathError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("param error: {0}")]
    Param(#[from] ParamError),
}
