// 6.0: per-account position records and their valuation formulas.
// stored fields are frozen at build; partial closes only shrink
// fraction_remaining, so every getter scales by fraction_remaining/10^4
// and then by the fraction of the remainder being touched.
// 6.1 valuation, 6.2 liquidation test, 6.3 fees.

use crate::fixed_point::sub_floor;
use crate::tick::{self, TickError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scale of the entry-to-mid ratio.
pub const RESOLUTION: Decimal = dec!(100_000_000_000_000);

/// fraction_remaining is kept in basis points of the original position.
pub const FRACTION_REMAINING_ONE: u16 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("entry price {entry} more than twice mid price {mid}")]
    DegenerateEntryPrice { entry: Decimal, mid: Decimal },

    #[error(transparent)]
    Tick(#[from] TickError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Notional at build (collateral * leverage), full fraction.
    pub notional: Decimal,
    /// Borrowed share of that notional (notional - collateral).
    pub debt: Decimal,
    /// Mid price at build, tick-quantized.
    pub mid_tick: i32,
    /// Execution price at build, tick-quantized.
    pub entry_tick: i32,
    pub is_long: bool,
    pub liquidated: bool,
    /// Pool-share claim on the side's aggregate OI. Constant after build;
    /// zeroed on liquidation.
    pub oi_shares: Decimal,
    /// Basis points of the original position still open.
    pub fraction_remaining: u16,
}

/// Ratio guard at build: an entry more than twice the mid would quantize to
/// zero open interest downstream, so it is rejected outright.
pub fn entry_to_mid_ratio(entry: Decimal, mid: Decimal) -> Result<Decimal, PositionError> {
    if entry > dec!(2) * mid {
        return Err(PositionError::DegenerateEntryPrice { entry, mid });
    }
    Ok(entry * RESOLUTION / mid)
}

impl Position {
    pub fn new(
        notional: Decimal,
        debt: Decimal,
        mid_tick: i32,
        entry_tick: i32,
        is_long: bool,
        oi_shares: Decimal,
    ) -> Self {
        Self {
            notional,
            debt,
            mid_tick,
            entry_tick,
            is_long,
            liquidated: false,
            oi_shares,
            fraction_remaining: FRACTION_REMAINING_ONE,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.liquidated && self.fraction_remaining > 0 && !self.oi_shares.is_zero()
    }

    fn fraction_remaining_dec(&self) -> Decimal {
        Decimal::from(self.fraction_remaining) / Decimal::from(FRACTION_REMAINING_ONE)
    }

    /// fraction_remaining after unwinding `fraction` of what is left,
    /// floored to whole basis points.
    pub fn fraction_remaining_after(&self, fraction: Decimal) -> u16 {
        let next = Decimal::from(self.fraction_remaining) * (Decimal::ONE - fraction);
        // floor() of a value in [0, 10000] always fits u16
        next.floor().to_u16().unwrap_or(0)
    }

    pub fn entry_price(&self) -> Result<Decimal, TickError> {
        tick::tick_to_price(self.entry_tick)
    }

    pub fn mid_price(&self) -> Result<Decimal, TickError> {
        tick::tick_to_price(self.mid_tick)
    }

    // 6.1: partial-close scalars. everything below takes `fraction` as the
    // share of the remaining position being touched, in (0, 1].

    pub fn notional_initial(&self, fraction: Decimal) -> Decimal {
        self.notional * self.fraction_remaining_dec() * fraction
    }

    pub fn debt_initial(&self, fraction: Decimal) -> Decimal {
        self.debt * self.fraction_remaining_dec() * fraction
    }

    /// Collateral the trader put behind this slice.
    pub fn cost(&self, fraction: Decimal) -> Decimal {
        sub_floor(self.notional_initial(fraction), self.debt_initial(fraction))
    }

    pub fn oi_shares_current(&self, fraction: Decimal) -> Decimal {
        self.oi_shares * self.fraction_remaining_dec() * fraction
    }

    /// OI at build for this slice, reconstructed from the quantized mid.
    pub fn oi_initial(&self, fraction: Decimal) -> Result<Decimal, TickError> {
        Ok(self.notional_initial(fraction) / self.mid_price()?)
    }

    /// Pro-rata claim on the side's aggregate OI right now. Funding moves OI
    /// between sides without moving shares, which is exactly why this goes
    /// through the share pool instead of reusing oi_initial.
    pub fn oi_current(
        &self,
        fraction: Decimal,
        oi_side_total: Decimal,
        oi_side_shares: Decimal,
    ) -> Decimal {
        if oi_side_shares.is_zero() {
            return Decimal::ZERO;
        }
        oi_side_total * self.oi_shares_current(fraction) / oi_side_shares
    }

    /// Current notional including price pnl, with the payoff clamped to
    /// [-1, cap_payoff] and the whole thing floored at outstanding debt.
    /// The sub_floor calls realize the -1 clamp; the price cap realizes the
    /// upside clamp for longs (shorts cannot pay off more than 1x).
    pub fn notional_with_pnl(
        &self,
        fraction: Decimal,
        oi_side_total: Decimal,
        oi_side_shares: Decimal,
        price: Decimal,
        cap_payoff: Decimal,
    ) -> Result<Decimal, TickError> {
        let notional_initial = self.notional_initial(fraction);
        let oi_initial = self.oi_initial(fraction)?;
        let oi_current = self.oi_current(fraction, oi_side_total, oi_side_shares);
        let entry = self.entry_price()?;

        let raw = if self.is_long {
            let capped = price.min(entry * (Decimal::ONE + cap_payoff));
            sub_floor(notional_initial + oi_current * capped, oi_initial * entry)
        } else {
            sub_floor(notional_initial + oi_initial * entry, oi_current * price)
        };
        Ok(raw.max(self.debt_initial(fraction)))
    }

    /// What the slice is worth to the trader: notional-with-pnl less debt.
    /// Never negative.
    pub fn value(
        &self,
        fraction: Decimal,
        oi_side_total: Decimal,
        oi_side_shares: Decimal,
        price: Decimal,
        cap_payoff: Decimal,
    ) -> Result<Decimal, TickError> {
        let nwp = self.notional_with_pnl(fraction, oi_side_total, oi_side_shares, price, cap_payoff)?;
        Ok(sub_floor(nwp, self.debt_initial(fraction)))
    }

    // 6.3: fee is charged on the capped notional, not paper pnl, so a
    // position past the payoff cap does not keep inflating its fee.
    pub fn trading_fee(
        &self,
        fraction: Decimal,
        oi_side_total: Decimal,
        oi_side_shares: Decimal,
        price: Decimal,
        cap_payoff: Decimal,
        trading_fee_rate: Decimal,
    ) -> Result<Decimal, TickError> {
        let nwp = self.notional_with_pnl(fraction, oi_side_total, oi_side_shares, price, cap_payoff)?;
        Ok(nwp * trading_fee_rate)
    }

    // 6.2: margin test. a position is liquidatable when its value, net of the
    // liquidator's cut, no longer covers the maintenance requirement on the
    // original entry notional.
    #[allow(clippy::too_many_arguments)]
    pub fn liquidatable(
        &self,
        oi_side_total: Decimal,
        oi_side_shares: Decimal,
        price: Decimal,
        cap_payoff: Decimal,
        maintenance_margin_fraction: Decimal,
        liquidation_fee_rate: Decimal,
    ) -> Result<bool, TickError> {
        if self.liquidated || self.oi_shares.is_zero() || self.fraction_remaining == 0 {
            return Ok(false);
        }
        let value = self.value(Decimal::ONE, oi_side_total, oi_side_shares, price, cap_payoff)?;
        let maintenance = maintenance_margin_fraction * self.notional_initial(Decimal::ONE);
        Ok(value * (Decimal::ONE - liquidation_fee_rate) < maintenance)
    }
}
