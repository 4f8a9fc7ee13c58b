// 8.0: every state change produces an event. used for audit trails, state
// reconstruction, and notifying external systems. the EventPayload enum lists
// all event types.

use crate::params::RiskParamKind;
use crate::types::{AccountId, PositionId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // position lifecycle
    Build(BuildEvent),
    Unwind(UnwindEvent),
    Liquidate(LiquidateEvent),

    // market upkeep
    FundingSettled(FundingSettledEvent),
    RiskParamSet(RiskParamSetEvent),
    Shutdown(ShutdownEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildEvent {
    pub owner: AccountId,
    pub position_id: PositionId,
    pub is_long: bool,
    pub collateral: Decimal,
    pub notional: Decimal,
    pub oi: Decimal,
    pub price: Decimal,
    pub trading_fee: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnwindEvent {
    pub owner: AccountId,
    pub position_id: PositionId,
    pub fraction: Decimal,
    pub price: Decimal,
    /// Net supply effect of the close: value - cost - trading fee.
    pub mint: Decimal,
    pub trading_fee: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidateEvent {
    pub owner: AccountId,
    pub position_id: PositionId,
    pub liquidator: AccountId,
    pub price: Decimal,
    /// Always non-positive: margin is burned, never minted, on liquidation.
    pub mint: Decimal,
    pub liquidation_fee: Decimal,
    pub margin_burned: Decimal,
    pub margin_to_fee_recipient: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingSettledEvent {
    pub oi_long_before: Decimal,
    pub oi_short_before: Decimal,
    pub oi_long_after: Decimal,
    pub oi_short_after: Decimal,
    pub elapsed: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskParamSetEvent {
    pub kind: RiskParamKind,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownEvent {
    pub triggered_by: AccountId,
}
